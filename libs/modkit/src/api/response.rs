use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// `{"detail": "..."}` message body used by action endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Offset-paginated list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl<T> PageDto<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageDto<U> {
        PageDto {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// `?limit=&offset=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Maximum number of items to return
    pub limit: Option<u64>,
    /// Number of items to skip
    pub offset: Option<u64>,
}

/// Effective window after applying module defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

impl PageQuery {
    /// `limit` falls back to `default` and is clamped to `1..=max`.
    pub fn window(&self, default: u64, max: u64) -> PageWindow {
        let limit = self.limit.unwrap_or(default).clamp(1, max.max(1));
        PageWindow {
            limit,
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// 201 Created + JSON
pub fn created_json<T: Serialize>(value: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(value))
}

/// 204 No Content
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
