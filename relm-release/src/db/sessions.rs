//! Album session persistence

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::Session;
use relm_common::json_store;
use std::path::Path;

/// Load the current session; `NoSession` when none has been created yet
pub fn load_session(path: &Path) -> ReleaseResult<Session> {
    if !path.exists() {
        return Err(ReleaseError::NoSession);
    }
    let session: Session = json_store::load(path)?;
    tracing::debug!(album = %session.album_code, path = %path.display(), "Session loaded");
    Ok(session)
}

/// Write the session back wholesale
pub fn save_session(path: &Path, session: &Session) -> ReleaseResult<()> {
    json_store::save(session, path)?;
    tracing::debug!(album = %session.album_code, "Session saved");
    Ok(())
}
