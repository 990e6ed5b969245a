use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use messagely_auth::IssuedToken;

use crate::app::{dto, errors, services::AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.issuer.register(body.into()).await {
        Ok(issued) => logged_in(StatusCode::CREATED, issued),
        Err(err) => errors::issuance_error_to_response(err),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    match services.issuer.login(&body.username, &body.password).await {
        Ok(issued) => logged_in(StatusCode::OK, issued),
        Err(err) => errors::issuance_error_to_response(err),
    }
}

fn logged_in(status: StatusCode, issued: IssuedToken) -> axum::response::Response {
    (
        status,
        Json(json!({ "message": "Logged in", "token": issued.token })),
    )
        .into_response()
}
