//! JSON request body extractor that rejects with a Problem response.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use super::problem::{Problem, ProblemResponse};

pub const CODE_INVALID_BODY: &str = "INVALID_BODY";

/// Drop-in replacement for `axum::Json` on request bodies.
///
/// Malformed or incomplete bodies become `400 application/problem+json`
/// instead of axum's plain-text 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_owned();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(invalid_body(&rejection).with_instance(path)),
        }
    }
}

fn invalid_body(rejection: &JsonRejection) -> ProblemResponse {
    // Content-type and size rejections keep their own status.
    let status = match rejection.status() {
        StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
        other => other,
    };
    let title = status.canonical_reason().unwrap_or("Bad Request");
    Problem::coded(status, CODE_INVALID_BODY, title, rejection.body_text()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Payload {
        title: String,
    }

    async fn echo(JsonBody(p): JsonBody<Payload>) -> String {
        p.title
    }

    fn app() -> Router {
        Router::new().route("/items", post(echo))
    }

    async fn post_raw(body: &str, content_type: Option<&str>) -> axum::response::Response {
        let mut req = Request::builder().method("POST").uri("/items");
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        app()
            .oneshot(req.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap()
    }

    async fn problem_of(resp: axum::response::Response) -> serde_json::Value {
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            crate::api::problem::APPLICATION_PROBLEM_JSON
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn valid_body_reaches_the_handler() {
        let resp = post_raw(r#"{"title":"Rust"}"#, Some("application/json")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_field_is_a_bad_request_problem() {
        let resp = post_raw(r#"{"description":"d"}"#, Some("application/json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = problem_of(resp).await;
        assert_eq!(body["code"], CODE_INVALID_BODY);
        assert_eq!(body["instance"], "/items");
        assert!(body["detail"].as_str().unwrap().contains("title"));
    }

    #[tokio::test]
    async fn broken_json_is_a_bad_request_problem() {
        let resp = post_raw("{not json", Some("application/json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        problem_of(resp).await;
    }

    #[tokio::test]
    async fn missing_content_type_keeps_its_status() {
        let resp = post_raw(r#"{"title":"Rust"}"#, None).await;
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = problem_of(resp).await;
        assert_eq!(body["status"], 415);
    }
}
