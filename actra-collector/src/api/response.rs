//! Response builders for the diagram API.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Content type of Graphviz dot responses.
pub const GRAPHVIZ_CONTENT_TYPE: &str = "text/vnd.graphviz";

/// Build a JSON response with status code.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|e| {
        serde_json::json!({
            "error": {
                "code": "SERIALIZATION_ERROR",
                "message": format!("serialization error: {}", e),
                "status": 500
            }
        })
        .to_string()
    });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .expect("response builder should not fail")
}

/// Build a 200 OK JSON response.
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// Build a 200 OK Graphviz dot response.
pub fn dot(dot: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", GRAPHVIZ_CONTENT_TYPE)
        .body(Full::new(Bytes::from(dot)))
        .expect("response builder should not fail")
}

/// Build a 404 Not Found response.
pub fn not_found() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": {
            "code": "NOT_FOUND",
            "message": "not found",
            "status": 404
        }
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

/// Build a 405 Method Not Allowed response.
pub fn method_not_allowed(allowed: &[&str]) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": {
            "code": "METHOD_NOT_ALLOWED",
            "message": format!("method not allowed, allowed: {}", allowed.join(", ")),
            "status": 405
        }
    });

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .header("Allow", allowed.join(", "))
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("response builder should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response() {
        let body = serde_json::json!({"status": "ok"});
        let response = ok(&body);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn dot_response() {
        let response = dot("digraph arch {}\n".to_string());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            GRAPHVIZ_CONTENT_TYPE
        );
    }

    #[test]
    fn not_found_response() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn method_not_allowed_response() {
        let response = method_not_allowed(&["GET"]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("Allow").unwrap(), "GET");
    }
}
