//! Caller identity for REST handlers.
//!
//! `authenticate_request` resolves `Authorization: Token <key>` (or
//! `Bearer <key>`) through a [`TokenAuthenticator`] and stores the
//! [`Principal`] in request extensions. Handlers take [`Authenticated`] to
//! require a caller.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use utoipa::ToSchema;

use crate::api::problem::{internal_error, unauthorized, ProblemResponse};

pub const MSG_NOT_AUTHENTICATED: &str = "Учетные данные не были предоставлены.";
pub const MSG_INVALID_TOKEN: &str = "Недопустимый токен.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Moderator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Moderator => "moderator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "moderator" => Ok(Role::Moderator),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
}

impl Principal {
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// False when the object has no owner.
    pub fn owns(&self, owner_id: Option<i64>) -> bool {
        owner_id == Some(self.user_id)
    }
}

/// Resolves an opaque token into a caller. `Ok(None)` means the token is unknown or disabled.
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> anyhow::Result<Option<Principal>>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum Credentials<'a> {
    Missing,
    Token(&'a str),
    Malformed,
}

/// Parse the `Authorization` header; both `Token` and `Bearer` schemes are accepted.
pub fn credentials(headers: &HeaderMap) -> Credentials<'_> {
    let Some(raw) = headers.get(AUTHORIZATION) else {
        return Credentials::Missing;
    };
    let Ok(value) = raw.to_str() else {
        return Credentials::Malformed;
    };
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None)
            if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") =>
        {
            Credentials::Token(token)
        }
        _ => Credentials::Malformed,
    }
}

/// Middleware for `axum::middleware::from_fn_with_state`.
///
/// Requests without credentials pass through anonymously; bad credentials get 401.
pub async fn authenticate_request(
    State(auth): State<Arc<dyn TokenAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match credentials(req.headers()) {
        Credentials::Missing => None,
        Credentials::Malformed => return unauthorized(MSG_INVALID_TOKEN).into_response(),
        Credentials::Token(token) => match auth.authenticate(token).await {
            Ok(Some(p)) => Some(p),
            Ok(None) => return unauthorized(MSG_INVALID_TOKEN).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "token lookup failed");
                return internal_error("An internal error occurred").into_response();
            }
        },
    };

    if let Some(p) = principal {
        tracing::debug!(user_id = p.user_id, "authenticated request");
        req.extensions_mut().insert(p);
    }
    next.run(req).await
}

/// Extractor that requires an authenticated caller (401 otherwise).
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| unauthorized(MSG_NOT_AUTHENTICATED).with_instance(parts.uri.path()))
    }
}
