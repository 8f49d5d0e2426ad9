use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use api_ingress::request_id::{
    create_trace_layer, header as request_id_header, push_req_id_to_extensions, NanoRequestId,
    XRequestId,
};

fn test_app() -> Router {
    let x_request_id = request_id_header();
    Router::new()
        .route("/echo", get(echo_handler))
        .layer(from_fn(push_req_id_to_extensions))
        .layer(create_trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, NanoRequestId))
}

async fn echo_handler(Extension(XRequestId(rid)): Extension<XRequestId>) -> Json<serde_json::Value> {
    Json(json!({ "request_id": rid }))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let resp = test_app()
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let header = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert_eq!(header.len(), 21, "nanoid default length");

    // The handler saw the same id that went back to the client.
    let body = body_json(resp).await;
    assert_eq!(body["request_id"], header.as_str());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let resp = test_app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
    assert_eq!(body_json(resp).await["request_id"], "abc-123");
}
