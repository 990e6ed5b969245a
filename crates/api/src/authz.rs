//! Per-route authorization: runs a [`GuardChain`] after routing and before
//! the handler.
//!
//! Each router built with [`guarded`] carries its own chain, so a route's
//! policy is visible where the route is declared.

use std::{collections::HashMap, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Path, Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::Instrument;

use messagely_auth::{Guard, GuardChain, GuardContext, MessageAccessor, RequestIdentity, RouteParams};

use crate::app::errors;

#[derive(Clone)]
pub struct GuardState {
    pub chain: Arc<GuardChain>,
    pub messages: Arc<dyn MessageAccessor>,
}

/// Attach `guards` to every route in `router`.
pub fn guarded(
    router: Router,
    guards: impl IntoIterator<Item = Guard>,
    messages: Arc<dyn MessageAccessor>,
) -> Router {
    let state = GuardState {
        chain: Arc::new(GuardChain::new(guards)),
        messages,
    };
    router.route_layer(middleware::from_fn_with_state(state, guard_middleware))
}

pub async fn guard_middleware(
    State(state): State<GuardState>,
    matched: Option<MatchedPath>,
    path: Option<Path<HashMap<String, String>>>,
    req: Request,
    next: Next,
) -> Response {
    let params = route_params(path.map(|Path(p)| p).unwrap_or_default());
    let route = matched
        .as_ref()
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let identity = req.extensions().get::<RequestIdentity>();
    let ctx = GuardContext::new(identity, &params);

    let outcome = state
        .chain
        .run(&ctx, state.messages.as_ref())
        .instrument(tracing::info_span!("guard_chain", route = %route))
        .await;

    match outcome {
        Ok(()) => next.run(req).await,
        Err(rejection) => errors::rejection_to_response(rejection),
    }
}

fn route_params(mut raw: HashMap<String, String>) -> RouteParams {
    RouteParams {
        username: raw.remove("username"),
        id: raw.remove("id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_params_are_kept() {
        let raw = HashMap::from([
            ("username".to_string(), "bob".to_string()),
            ("other".to_string(), "x".to_string()),
        ]);
        let params = route_params(raw);
        assert_eq!(params, RouteParams::default().with_username("bob"));
    }

    #[test]
    fn missing_params_stay_empty() {
        assert_eq!(route_params(HashMap::new()), RouteParams::default());
    }
}
