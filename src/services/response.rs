//! HTTP response building helpers
//!
//! Every error leaves the API as `{ "error": "<message>" }` with a non-2xx
//! status chosen from the error variant.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;

use crate::error::RegistryError;

pub type HttpResponse = Response<Full<Bytes>>;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

pub fn ok<T: Serialize>(body: &T) -> HttpResponse {
    json_response(StatusCode::OK, body)
}

pub fn created<T: Serialize>(body: &T) -> HttpResponse {
    json_response(StatusCode::CREATED, body)
}

pub fn no_content() -> HttpResponse {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// `{ "error": message }` with the given status
pub fn error_body(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

pub fn not_found(message: &str) -> HttpResponse {
    error_body(StatusCode::NOT_FOUND, message)
}

pub fn bad_request(message: &str) -> HttpResponse {
    error_body(StatusCode::BAD_REQUEST, message)
}

pub fn method_not_allowed() -> HttpResponse {
    error_body(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn unauthorized(message: &str) -> HttpResponse {
    error_body(StatusCode::UNAUTHORIZED, message)
}

/// Map a RegistryError to its HTTP status and message
pub fn error_response(error: RegistryError) -> HttpResponse {
    let status = match &error {
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::InvalidInput(_) | RegistryError::Json(_) => StatusCode::BAD_REQUEST,
        RegistryError::Conflict(_) | RegistryError::InvalidTransition { .. } => StatusCode::CONFLICT,
        RegistryError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        RegistryError::Forbidden(_) => StatusCode::FORBIDDEN,
        RegistryError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::Database(_)
        | RegistryError::Io(_)
        | RegistryError::Config(_)
        | RegistryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match error {
        RegistryError::NotFound(msg)
        | RegistryError::InvalidInput(msg)
        | RegistryError::Conflict(msg)
        | RegistryError::Unauthorized(msg)
        | RegistryError::Forbidden(msg) => msg,
        other => other.to_string(),
    };

    error_body(status, &message)
}

/// Build a binary response with the given content type
pub fn binary_response(content_type: &str, body: Vec<u8>) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

/// File download with a `Content-Disposition: attachment` header
pub fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

pub fn html(body: String) -> HttpResponse {
    binary_response("text/html; charset=utf-8", body.into_bytes())
}

/// Wrap a service result into an HTTP response
pub fn from_result<T: Serialize>(result: Result<T, RegistryError>) -> HttpResponse {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap an optional service result; `None` becomes 404
pub fn from_option<T: Serialize>(
    result: Result<Option<T>, RegistryError>,
    not_found_msg: &str,
) -> HttpResponse {
    match result {
        Ok(Some(value)) => ok(&value),
        Ok(None) => not_found(not_found_msg),
        Err(e) => error_response(e),
    }
}

/// Wrap a create result into 201 Created
pub fn from_create_result<T: Serialize>(result: Result<T, RegistryError>) -> HttpResponse {
    match result {
        Ok(value) => created(&value),
        Err(e) => error_response(e),
    }
}

/// 204 if deleted, 404 if there was nothing to delete
pub fn from_delete_bool_result(
    result: Result<bool, RegistryError>,
    not_found_msg: &str,
) -> HttpResponse {
    match result {
        Ok(true) => no_content(),
        Ok(false) => not_found(not_found_msg),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let resp = ok(&serde_json::json!({ "test": true }));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_statuses() {
        let cases = [
            (RegistryError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (RegistryError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (RegistryError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                RegistryError::InvalidTransition {
                    entity: "certificate",
                    from: "PENDING".into(),
                    to: "RELEASED".into(),
                },
                StatusCode::CONFLICT,
            ),
            (RegistryError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (RegistryError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (RegistryError::Pool("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (RegistryError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error_response(error).status(), status);
        }
    }

    #[test]
    fn test_delete_bool() {
        assert_eq!(from_delete_bool_result(Ok(true), "gone").status(), StatusCode::NO_CONTENT);
        assert_eq!(from_delete_bool_result(Ok(false), "gone").status(), StatusCode::NOT_FOUND);
    }
}
