use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contract::model::{
    CoursePatch, CourseView, DateOrder, Lesson, LessonPatch, NewCourse, NewLesson, Payment,
    PaymentMethod,
};

/// Course with per-caller computed fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    pub owner_id: Option<i64>,
    pub price: Option<i64>,
    /// Number of lessons in the course
    pub lesson_count: u64,
    /// Whether the caller is subscribed
    pub is_subscribed: bool,
}

/// Full course payload for create and `PUT`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CourseReq {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub price: Option<i64>,
}

/// Partial course update
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CoursePatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Empty string clears the preview
    pub preview: Option<String>,
    pub owner_id: Option<i64>,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LessonDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub preview: Option<String>,
    /// Video URL
    pub url: String,
    pub course_id: i64,
    pub owner_id: Option<i64>,
}

/// Full lesson payload for create and `PUT`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LessonReq {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub preview: Option<String>,
    pub url: String,
    pub course_id: i64,
    #[serde(default)]
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LessonPatchReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub preview: Option<String>,
    pub url: Option<String>,
    pub course_id: Option<i64>,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentDto {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub course_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub amount: Option<i64>,
    pub payment_method: PaymentMethod,
}

/// Query of `GET /payments`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentsQuery {
    /// Exact course id
    pub course: Option<i64>,
    /// Exact lesson id
    pub lesson: Option<i64>,
    /// `cash` or `transfer`
    pub payment_method: Option<String>,
    /// `date` or `-date`
    pub ordering: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Parse `ordering`; only the payment date is orderable.
pub fn parse_ordering(raw: Option<&str>) -> Result<DateOrder, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DateOrder::Unordered),
        Some("date") => Ok(DateOrder::Ascending),
        Some("-date") => Ok(DateOrder::Descending),
        Some(other) => Err(format!("unsupported ordering '{other}'")),
    }
}

impl From<CourseView> for CourseDto {
    fn from(v: CourseView) -> Self {
        let c = v.course;
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            preview: c.preview,
            owner_id: c.owner_id,
            price: c.price,
            lesson_count: v.lesson_count,
            is_subscribed: v.is_subscribed,
        }
    }
}

impl From<CourseReq> for NewCourse {
    fn from(req: CourseReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            preview: req.preview.filter(|p| !p.is_empty()),
            owner_id: req.owner_id,
            price: req.price,
        }
    }
}

/// `PUT` replaces the content fields; ownership only moves when `owner_id` is sent.
impl From<CourseReq> for CoursePatch {
    fn from(req: CourseReq) -> Self {
        Self {
            title: Some(req.title),
            description: Some(req.description),
            preview: Some(req.preview.unwrap_or_default()),
            owner_id: req.owner_id,
            price: Some(req.price.unwrap_or(0)),
        }
    }
}

impl From<CoursePatchReq> for CoursePatch {
    fn from(req: CoursePatchReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            preview: req.preview,
            owner_id: req.owner_id,
            price: req.price,
        }
    }
}

impl From<Lesson> for LessonDto {
    fn from(l: Lesson) -> Self {
        Self {
            id: l.id,
            title: l.title,
            description: l.description,
            preview: l.preview,
            url: l.url,
            course_id: l.course_id,
            owner_id: l.owner_id,
        }
    }
}

impl From<LessonReq> for NewLesson {
    fn from(req: LessonReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            preview: req.preview.filter(|p| !p.is_empty()),
            url: req.url,
            course_id: req.course_id,
            owner_id: req.owner_id,
        }
    }
}

/// Same rule as courses: an omitted `owner_id` keeps the owner.
impl From<LessonReq> for LessonPatch {
    fn from(req: LessonReq) -> Self {
        Self {
            title: Some(req.title),
            description: Some(req.description),
            preview: Some(req.preview.unwrap_or_default()),
            url: Some(req.url),
            course_id: Some(req.course_id),
            owner_id: req.owner_id,
        }
    }
}

impl From<LessonPatchReq> for LessonPatch {
    fn from(req: LessonPatchReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            preview: req.preview,
            url: req.url,
            course_id: req.course_id,
            owner_id: req.owner_id,
        }
    }
}

impl From<Payment> for PaymentDto {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            date: p.date,
            course_id: p.course_id,
            lesson_id: p.lesson_id,
            amount: p.amount,
            payment_method: p.payment_method,
        }
    }
}
