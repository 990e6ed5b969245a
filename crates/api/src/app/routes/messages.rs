use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use messagely_auth::{Guard, MessageAccessor, RequestIdentity};
use messagely_core::{MessageId, Username};
use messagely_infra::NewMessage;

use crate::app::{dto, errors, services::AppServices};
use crate::authz::guarded;

const NO_SUCH_MESSAGE: &str = "No such message";
const NO_SUCH_RECIPIENT: &str = "No user with that username exists";

pub fn router(messages: Arc<dyn MessageAccessor>) -> Router {
    let post_new = guarded(
        Router::new().route("/", post(create_message)),
        [Guard::RequireAuthenticated],
        messages.clone(),
    );

    let read = guarded(
        Router::new().route("/:id", get(get_message)),
        [Guard::RequireAuthenticated, Guard::RequireParticipant],
        messages.clone(),
    );

    let mark = guarded(
        Router::new().route("/:id/read", post(mark_read)),
        [Guard::RequireAuthenticated, Guard::RequireRecipient],
        messages,
    );

    post_new.merge(read).merge(mark)
}

pub async fn get_message(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.board.detail(id).await {
        Ok(message) => (StatusCode::OK, Json(json!({ "message": message }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_MESSAGE),
    }
}

/// Post a message from the caller to `to_username`.
pub async fn create_message(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    body: Result<Json<dto::CreateMessageRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    if body.to_username.trim().is_empty() || body.body.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "missing_inputs",
            "Missing required inputs",
        );
    }

    let Ok(to_username) = Username::parse(body.to_username) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", NO_SUCH_RECIPIENT);
    };

    let new = NewMessage {
        from_username: identity.username().clone(),
        to_username,
        body: body.body,
    };

    match services.board.create(new).await {
        Ok(message) => {
            tracing::info!(message_id = %message.id, "message posted");
            (StatusCode::CREATED, Json(json!({ "message": message }))).into_response()
        }
        Err(err) => errors::store_error_to_response(err, NO_SUCH_RECIPIENT),
    }
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.board.mark_read(id).await {
        Ok(receipt) => (StatusCode::OK, Json(json!({ "message": receipt }))).into_response(),
        Err(err) => errors::store_error_to_response(err, NO_SUCH_MESSAGE),
    }
}

fn parse_id(raw: &str) -> Result<MessageId, axum::response::Response> {
    raw.parse::<MessageId>()
        .map_err(|_| errors::json_error(StatusCode::NOT_FOUND, "not_found", NO_SUCH_MESSAGE))
}
