use axum::body::{to_bytes, Body};
use http::Request;
use serde_json::Value;

/// Helper function to extract JSON from an Axum response
///
/// This is useful in tests to easily parse and assert on JSON responses.
pub async fn response_to_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Builds a JSON POST request for driving the router in tests.
pub fn json_post(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}
