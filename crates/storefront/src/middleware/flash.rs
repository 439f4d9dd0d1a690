//! One-shot notices carried in the session across a redirect.

use tower_sessions::Session;

use crate::models::{Flash, session_keys};

/// Queue a notice for the next rendered page.
///
/// Session failures are logged; a lost notice never fails the request.
pub async fn push_flash(session: &Session, flash: Flash) {
    let mut pending = session
        .get::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    pending.push(flash);

    if let Err(e) = session.insert(session_keys::FLASH, pending).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return every pending notice.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
