//! Identity middleware: runs on every request and attaches a
//! [`RequestIdentity`] when, and only when, the presented token verifies.
//!
//! Authentication failure never rejects here; guards on individual routes
//! decide whether an anonymous request may proceed.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use messagely_auth::{RequestIdentity, TokenCodec, resolve_identity};

use crate::app::errors;

/// Largest JSON body the middleware will buffer while looking for `_token`.
pub const MAX_TOKEN_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenField {
    #[serde(rename = "_token")]
    token: Option<String>,
}

pub async fn identity_middleware(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    let (token, mut req) = match extract_token(req).await {
        Ok(found) => found,
        Err(response) => return response,
    };

    // Never trust an identity that did not come from this middleware.
    req.extensions_mut().remove::<RequestIdentity>();
    if let Some(identity) = resolve_identity(&state.codec, token.as_deref()) {
        tracing::debug!(username = %identity.username(), "request authenticated");
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

/// Find the caller's token: bearer header, then JSON body `_token`, then the
/// `_token` query parameter. The body is restored for the handler.
async fn extract_token(req: Request) -> Result<(Option<String>, Request), Response> {
    if let Some(token) = extract_bearer(req.headers()) {
        return Ok((Some(token.to_string()), req));
    }

    let (token, req) = extract_body_token(req).await?;
    if token.is_some() {
        return Ok((token, req));
    }

    let token = Query::<TokenField>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(field)| field.token);
    Ok((token, req))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

async fn extract_body_token(req: Request) -> Result<(Option<String>, Request), Response> {
    if !is_small_json(req.headers()) {
        return Ok((None, req));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_TOKEN_BODY_BYTES)
        .await
        .map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_body",
                "failed to read request body",
            )
        })?;

    let token = serde_json::from_slice::<TokenField>(&bytes)
        .ok()
        .and_then(|field| field.token);

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}

/// JSON with a declared length under the buffering limit. Anything else is
/// passed through untouched.
fn is_small_json(headers: &HeaderMap) -> bool {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let small = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len <= MAX_TOKEN_BODY_BYTES);

    is_json && small
}
