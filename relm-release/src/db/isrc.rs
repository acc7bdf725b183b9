//! ISRC directory persistence

use crate::error::ReleaseResult;
use crate::models::IsrcDirectory;
use relm_common::json_store;
use std::path::Path;

pub fn load_isrc_directory(path: &Path) -> ReleaseResult<IsrcDirectory> {
    let directory: IsrcDirectory = json_store::load_or_default(path)?;
    tracing::debug!(codes = directory.len(), "ISRC directory loaded");
    Ok(directory)
}

pub fn save_isrc_directory(path: &Path, directory: &IsrcDirectory) -> ReleaseResult<()> {
    json_store::save(directory, path)?;
    Ok(())
}
