/// Authenticated-principal extraction for Axum handlers
///
/// The API layer validates the Bearer token in a middleware and inserts an
/// `AuthUser` into the request extensions. Handlers receive the principal as
/// an ordinary extractor argument; there is no ambient or global request
/// state to consult:
///
/// ```no_run
/// use taskhive_shared::auth::middleware::AuthUser;
///
/// async fn handler(auth: AuthUser) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```
use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use uuid::Uuid;

use super::jwt::Claims;

/// The authenticated principal of a request
///
/// Constructed exclusively by the JWT middleware from validated claims.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// ID of the authenticated user
    pub user_id: Uuid,
}

impl AuthUser {
    /// Builds the principal from validated token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Present on every route behind the auth layer; absence means the
        // route was wired without it.
        parts.extensions.get::<AuthUser>().copied().ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing authentication context",
        ))
    }
}
