use crate::contract::model::{Course, Lesson, Payment, PaymentMethod};
use crate::infra::storage::entity::{courses, lessons, payments};

impl From<courses::Model> for Course {
    fn from(m: courses::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            preview: m.preview,
            owner_id: m.owner_id,
            price: m.price,
        }
    }
}

impl From<lessons::Model> for Lesson {
    fn from(m: lessons::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            preview: m.preview,
            url: m.url,
            course_id: m.course_id,
            owner_id: m.owner_id,
        }
    }
}

impl From<payments::DbPaymentMethod> for PaymentMethod {
    fn from(m: payments::DbPaymentMethod) -> Self {
        match m {
            payments::DbPaymentMethod::Cash => PaymentMethod::Cash,
            payments::DbPaymentMethod::Transfer => PaymentMethod::Transfer,
        }
    }
}

impl From<PaymentMethod> for payments::DbPaymentMethod {
    fn from(m: PaymentMethod) -> Self {
        match m {
            PaymentMethod::Cash => payments::DbPaymentMethod::Cash,
            PaymentMethod::Transfer => payments::DbPaymentMethod::Transfer,
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(m: payments::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            date: m.date,
            course_id: m.course_id,
            lesson_id: m.lesson_id,
            amount: m.amount,
            payment_method: m.payment_method.into(),
        }
    }
}
