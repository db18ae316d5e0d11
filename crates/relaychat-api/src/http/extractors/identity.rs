//! Identity resolution for chat routes.
//!
//! Resolution order:
//! - trusted user header set by the upstream auth layer, only when
//!   `server.user_header` is configured → `Identity::User`
//! - session cookie (`relaychat_session`) → `Identity::Session`
//! - otherwise a fresh UUID v4 session token, returned via `Set-Cookie`
//!
//! `resolve_identity` runs as middleware and stores the result in the
//! request extensions; handlers read it back with [`CurrentIdentity`].

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use relaychat_types::config::ServerConfig;
use relaychat_types::identity::Identity;

use crate::http::error::AppError;
use crate::state::AppState;

const MAX_TOKEN_LEN: usize = 64;

/// The identity resolved for this request.
pub struct CurrentIdentity(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| AppError::Internal("identity middleware not installed".to_string()))
    }
}

/// Middleware: resolve the caller and issue a session cookie when needed.
pub async fn resolve_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (identity, issued) = match identify(request.headers(), &state.server) {
        Some(identity) => (identity, None),
        None => {
            let token = Uuid::new_v4().to_string();
            tracing::debug!("Issuing new session token");
            (Identity::session(token.clone()), Some(token))
        }
    };

    request.extensions_mut().insert(identity);
    let mut response = next.run(request).await;

    if let Some(token) = issued {
        let cookie = session_cookie(&state.server.session_cookie, &token);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Invalid session cookie header"),
        }
    }

    response
}

/// Identity carried by the request, if any.
pub fn identify(headers: &HeaderMap, server: &ServerConfig) -> Option<Identity> {
    let user = server
        .user_header
        .as_deref()
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(user) = user {
        return Some(Identity::user(user));
    }

    cookie_value(headers, &server.session_cookie)
        .filter(|token| is_valid_token(token))
        .map(Identity::session)
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn session_cookie(name: &str, token: &str) -> String {
    format!("{name}={token}; HttpOnly; SameSite=Lax; Path=/")
}
