//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and shared handles
//! - `routes/`: HTTP routes + handlers, each router carrying its guard chains
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::{config::AppConfig, middleware};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(router(services))
}

/// Router over already-built services.
pub fn router(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        codec: Arc::new(services.codec().clone()),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(services.messages.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    middleware::identity_middleware,
                ))
                .layer(Extension(services)),
        )
}
