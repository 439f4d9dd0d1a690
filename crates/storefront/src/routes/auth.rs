//! Authentication route handlers.
//!
//! Password login against local accounts, and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::PageContext;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Checkbox; present when ticked.
    pub remember: Option<String>,
    /// Where to go after logging in.
    pub next: Option<String>,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<String>,
    pub username: String,
    pub next: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept only same-site relative paths as post-login targets.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.map(str::trim).filter(|n| {
        n.starts_with('/') && !n.starts_with("//") && !n.contains('\\')
    })
}

// =============================================================================
// Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).map(str::to_owned);

    if user.is_some() {
        return Redirect::to(next.as_deref().unwrap_or("/")).into_response();
    }

    LoginTemplate {
        page: PageContext::load(&state, &session, None).await,
        error: None,
        username: String::new(),
        next,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).map(str::to_owned);

    match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            let current = CurrentUser::from(&user);
            let remember = form.remember.is_some();

            if let Err(e) = set_current_user(&session, &current, remember).await {
                tracing::error!("Failed to set session: {}", e);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Session error").into_response();
            }
            set_sentry_user(&current.id, &current.username);

            Redirect::to(next.as_deref().unwrap_or("/")).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login rejected");
            let page = PageContext::load(&state, &session, None).await;
            (
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    page,
                    error: Some("Invalid username or password".to_owned()),
                    username: form.username,
                    next,
                },
            )
                .into_response()
        }
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Login failed");
            let page = PageContext::load(&state, &session, None).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                LoginTemplate {
                    page,
                    error: Some("Login is unavailable right now, please try again".to_owned()),
                    username: form.username,
                    next,
                },
            )
                .into_response()
        }
    }
}

/// Handle logout.
///
/// Requires a logged-in session; anonymous visitors are sent to the login page.
pub async fn logout(RequireAuth(user): RequireAuth, session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to flush session: {}", e);
    }
    clear_sentry_user();
    tracing::info!(user_id = %user.id, "User logged out");

    Redirect::to("/").into_response()
}
