use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub owner_id: Option<i64>,
    pub price: Option<i64>,
}

/// Course as shown to one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseView {
    pub course: Course,
    pub lesson_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub owner_id: Option<i64>,
    pub price: Option<i64>,
}

/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub owner_id: Option<i64>,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub url: String,
    pub course_id: i64,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLesson {
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub url: String,
    pub course_id: i64,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub url: Option<String>,
    pub course_id: Option<i64>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Append-only record of money paid for a course or a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub course_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub amount: Option<i64>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i64,
    pub date: NaiveDate,
    pub course_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub amount: Option<i64>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateOrder {
    #[default]
    Unordered,
    Ascending,
    Descending,
}

/// Exact-match payment filters; `None` matches everything.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub course_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub order: DateOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Rows removed by a catalog purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub payments: u64,
    pub lessons: u64,
    pub courses: u64,
}
