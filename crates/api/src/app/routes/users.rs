use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use messagely_auth::{Guard, MessageAccessor};
use messagely_core::Username;

use crate::app::{errors, services::AppServices};
use crate::authz::guarded;

const NO_SUCH_USER: &str = "No user with that username exists";

pub fn router(messages: Arc<dyn MessageAccessor>) -> Router {
    let directory = guarded(
        Router::new().route("/", get(list_users)),
        [Guard::RequireAuthenticated],
        messages.clone(),
    );

    let own = guarded(
        Router::new()
            .route("/:username", get(get_user))
            .route("/:username/to", get(messages_to))
            .route("/:username/from", get(messages_from)),
        [Guard::RequireAuthenticated, Guard::RequireSelf],
        messages,
    );

    directory.merge(own)
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.users.all().await {
        Ok(users) => (StatusCode::OK, Json(json!({ "users": users }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_USER),
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> axum::response::Response {
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match services.users.get(&username).await {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_USER),
    }
}

/// Messages received by `username`.
pub async fn messages_to(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> axum::response::Response {
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match services.users.messages_to(&username).await {
        Ok(messages) => (StatusCode::OK, Json(json!({ "messages": messages }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_USER),
    }
}

/// Messages sent by `username`.
pub async fn messages_from(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> axum::response::Response {
    let username = match parse_username(&username) {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    match services.users.messages_from(&username).await {
        Ok(messages) => (StatusCode::OK, Json(json!({ "messages": messages }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_USER),
    }
}

fn parse_username(raw: &str) -> Result<Username, axum::response::Response> {
    Username::parse(raw)
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", NO_SUCH_USER))
}
