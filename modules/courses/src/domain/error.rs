use thiserror::Error;

pub const MSG_NOT_OWNER: &str = "Вы не владелец.";
pub const MSG_PERMISSION_DENIED: &str = "У вас недостаточно прав для выполнения данного действия.";
pub const MSG_SUBSCRIBED: &str = "Вы подписались на курс.";
pub const MSG_ALREADY_SUBSCRIBED: &str = "Вы уже подписаны";
pub const MSG_UNSUBSCRIBED: &str = "Вы отписались от курса.";
pub const MSG_NOT_SUBSCRIBED: &str = "Вы не подписаны на курс.";

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Course not found: {id}")]
    CourseNotFound { id: i64 },

    #[error("Lesson not found: {id}")]
    LessonNotFound { id: i64 },

    #[error("{message}")]
    Forbidden { message: &'static str },

    #[error("{}", MSG_ALREADY_SUBSCRIBED)]
    AlreadySubscribed { course_id: i64 },

    #[error("{}", MSG_NOT_SUBSCRIBED)]
    NotSubscribed { course_id: i64 },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn course_not_found(id: i64) -> Self {
        Self::CourseNotFound { id }
    }

    pub fn lesson_not_found(id: i64) -> Self {
        Self::LessonNotFound { id }
    }

    pub fn not_owner() -> Self {
        Self::Forbidden {
            message: MSG_NOT_OWNER,
        }
    }

    pub fn permission_denied() -> Self {
        Self::Forbidden {
            message: MSG_PERMISSION_DENIED,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
