//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring a logged-in user, or an administrator,
//! in route handlers. JSON endpoints are rejected with a JSON error body;
//! pages redirect to the login form with a `next` parameter.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{Method, StatusCode, header::ACCEPT, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::{Expiry, Session};

use crate::error::ErrorBody;
use crate::middleware::flash::push_flash;
use crate::middleware::session::remember_me_expiry;
use crate::models::{CurrentUser, Flash, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in administrator.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when an extractor rejects the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, returning to `next` afterwards.
    RedirectToLogin { next: String },
    /// Not logged in, JSON endpoint.
    Unauthorized,
    /// Logged in without administrator rights, JSON endpoint or form post.
    Forbidden,
    /// Logged in without administrator rights, page request.
    RedirectHome,
    /// Session layer missing from the stack.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "Please log in to continue"),
            Self::Forbidden => json_error(StatusCode::FORBIDDEN, "Unauthorized"),
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::SessionUnavailable => {
                tracing::error!("Session layer missing; auth extractor cannot run");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            success: false,
            message: message.to_owned(),
        }),
    )
        .into_response()
}

/// Login URL that returns to `next` after a successful login.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("/login?next={}", urlencoding::encode(next))
}

/// Whether the request is answered with JSON rather than a page.
///
/// True for the cart API, the admin product API (`/admin/product/{id}`) and
/// any request that explicitly accepts `application/json`.
#[must_use]
pub fn wants_json(parts: &Parts) -> bool {
    let path = parts.uri.path();

    let is_cart_api = ["/cart/add/", "/cart/update/", "/cart/remove/"]
        .iter()
        .any(|prefix| path.starts_with(prefix));

    let is_product_api = path
        .strip_prefix("/admin/product/")
        .is_some_and(|rest| !rest.is_empty() && rest != "add" && rest != "edit");

    let accepts_json = parts
        .headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    is_cart_api || is_product_api || accepts_json
}

async fn session_user(parts: &Parts) -> Result<Option<CurrentUser>, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::SessionUnavailable)?;

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten())
}

fn unauthenticated(parts: &Parts) -> AuthRejection {
    if wants_json(parts) {
        AuthRejection::Unauthorized
    } else {
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| "/".to_owned(), ToString::to_string);
        AuthRejection::RedirectToLogin { next }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await?
            .map(Self)
            .ok_or_else(|| unauthenticated(parts))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await?
            .ok_or_else(|| unauthenticated(parts))?;

        if crate::services::auth::require_admin(&user).is_ok() {
            return Ok(Self(user));
        }

        tracing::info!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");

        if parts.method == Method::GET && !wants_json(parts) {
            if let Some(session) = parts.extensions.get::<Session>() {
                push_flash(session, Flash::danger("Access denied")).await;
            }
            Err(AuthRejection::RedirectHome)
        } else {
            Err(AuthRejection::Forbidden)
        }
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await.ok().flatten()))
    }
}

/// Bind the session to a user after a successful login.
///
/// The session ID is rotated first. With `remember` the session survives a
/// browser restart for 30 days of inactivity; otherwise it ends with the
/// browser session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    remember: bool,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.set_expiry(Some(if remember {
        remember_me_expiry()
    } else {
        Expiry::OnSessionEnd
    }));
    session.insert(session_keys::CURRENT_USER, user).await
}

/// End the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
