//! Access policy guards.
//!
//! A guard is a predicate over the request identity, the route parameters
//! and, for message routes, the fetched message. Guards never error: every
//! failure (missing identity, bad id, fetch failure, mismatch) becomes the
//! same [`Rejection::Unauthorized`], so callers cannot tell "does not exist"
//! from "not yours".
//!
//! - No panics
//! - No business logic beyond the relationship checks

use thiserror::Error;

use messagely_core::{Message, MessageId, Username};

use crate::{MessageAccessor, RequestIdentity};

/// Raw route parameters a guard may consult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    /// Target username (`/users/:username`).
    pub username: Option<String>,
    /// Message id (`/messages/:id`).
    pub id: Option<String>,
}

impl RouteParams {
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Everything a guard sees about the current request.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub identity: Option<&'a RequestIdentity>,
    pub params: &'a RouteParams,
}

impl<'a> GuardContext<'a> {
    pub fn new(identity: Option<&'a RequestIdentity>, params: &'a RouteParams) -> Self {
        Self { identity, params }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("Unauthorized")]
    Unauthorized,
}

impl Rejection {
    pub fn status(&self) -> u16 {
        match self {
            Rejection::Unauthorized => 401,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Unauthorized => "Unauthorized",
        }
    }
}

/// Outcome of one guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Reject(Rejection),
}

impl Decision {
    fn allow_if(ok: bool) -> Self {
        if ok {
            Decision::Continue
        } else {
            Decision::Reject(Rejection::Unauthorized)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    /// An identity is attached.
    RequireAuthenticated,
    /// The identity is the route's `username`.
    RequireSelf,
    /// The identity sent or received the route's message.
    RequireParticipant,
    /// The identity received the route's message.
    RequireRecipient,
}

impl Guard {
    pub fn name(&self) -> &'static str {
        match self {
            Guard::RequireAuthenticated => "require_authenticated",
            Guard::RequireSelf => "require_self",
            Guard::RequireParticipant => "require_participant",
            Guard::RequireRecipient => "require_recipient",
        }
    }

    pub async fn evaluate(
        &self,
        ctx: &GuardContext<'_>,
        messages: &dyn MessageAccessor,
    ) -> Decision {
        match self {
            Guard::RequireAuthenticated => Decision::allow_if(ctx.identity.is_some()),
            Guard::RequireSelf => {
                let ok = match (ctx.identity, ctx.params.username.as_deref()) {
                    (Some(identity), Some(target)) => identity.is(target),
                    _ => false,
                };
                Decision::allow_if(ok)
            }
            Guard::RequireParticipant => {
                check_message(ctx, messages, Message::is_participant).await
            }
            Guard::RequireRecipient => check_message(ctx, messages, Message::is_recipient).await,
        }
    }
}

async fn check_message(
    ctx: &GuardContext<'_>,
    messages: &dyn MessageAccessor,
    relation: fn(&Message, &Username) -> bool,
) -> Decision {
    let Some(identity) = ctx.identity else {
        return Decision::Reject(Rejection::Unauthorized);
    };
    let Some(id) = ctx
        .params
        .id
        .as_deref()
        .and_then(|raw| raw.parse::<MessageId>().ok())
    else {
        return Decision::Reject(Rejection::Unauthorized);
    };

    match messages.fetch_by_id(id).await {
        Ok(message) => Decision::allow_if(relation(&message, identity.username())),
        Err(err) => {
            tracing::debug!(message_id = %id, error = %err, "message fetch failed during guard");
            Decision::Reject(Rejection::Unauthorized)
        }
    }
}

/// An ordered list of guards, evaluated left to right.
///
/// The first rejection stops the chain; later guards are never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain {
    guards: Vec<Guard>,
}

impl GuardChain {
    pub fn new(guards: impl IntoIterator<Item = Guard>) -> Self {
        Self {
            guards: guards.into_iter().collect(),
        }
    }

    pub fn then(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub async fn run(
        &self,
        ctx: &GuardContext<'_>,
        messages: &dyn MessageAccessor,
    ) -> Result<(), Rejection> {
        for guard in &self.guards {
            if let Decision::Reject(rejection) = guard.evaluate(ctx, messages).await {
                tracing::warn!(guard = guard.name(), "request rejected by guard");
                return Err(rejection);
            }
        }
        Ok(())
    }
}
