use std::sync::Arc;

use axum::Router;

use messagely_auth::MessageAccessor;

pub mod auth;
pub mod messages;
pub mod system;
pub mod users;

/// Router for every API endpoint except `/health`.
pub fn router(messages: Arc<dyn MessageAccessor>) -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router(messages.clone()))
        .nest("/messages", messages::router(messages))
}
