use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use messagely_auth::{IssuanceError, Rejection, StoreError};

pub fn rejection_to_response(rejection: Rejection) -> axum::response::Response {
    let status =
        StatusCode::from_u16(rejection.status()).unwrap_or(StatusCode::UNAUTHORIZED);
    json_error(status, "unauthorized", rejection.reason())
}

pub fn issuance_error_to_response(err: IssuanceError) -> axum::response::Response {
    match err {
        IssuanceError::MissingInputs => {
            json_error(StatusCode::BAD_REQUEST, "missing_inputs", err.to_string())
        }
        IssuanceError::InvalidUsername(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_username", err.to_string())
        }
        IssuanceError::DuplicateIdentifier => {
            json_error(StatusCode::BAD_REQUEST, "duplicate_username", err.to_string())
        }
        IssuanceError::InvalidCredentials => {
            json_error(StatusCode::BAD_REQUEST, "invalid_credentials", err.to_string())
        }
        IssuanceError::Password(_) | IssuanceError::Token(_) | IssuanceError::Store(_) => {
            tracing::error!(error = %err, "credential issuance failed");
            internal_error()
        }
    }
}

/// `not_found` is the caller-facing text for a missing record.
pub fn store_error_to_response(err: StoreError, not_found: &str) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", not_found),
        StoreError::Duplicate => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        StoreError::Backend(_) => {
            tracing::error!(error = %err, "store request failed");
            internal_error()
        }
    }
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn internal_error() -> axum::response::Response {
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "internal server error",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
