//! Composer and publisher directory persistence

use crate::error::ReleaseResult;
use crate::models::ComposerDirectory;
use relm_common::json_store;
use std::path::Path;

pub fn load_directory(path: &Path) -> ReleaseResult<ComposerDirectory> {
    let directory: ComposerDirectory = json_store::load_or_default(path)?;
    tracing::debug!(
        composers = directory.composers.len(),
        publishers = directory.publishers.len(),
        "Composer directory loaded"
    );
    Ok(directory)
}

pub fn save_directory(path: &Path, directory: &ComposerDirectory) -> ReleaseResult<()> {
    json_store::save(directory, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::models::ComposerEntry;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let directory = load_directory(&dir.path().join("composer_database.json")).unwrap();
        assert!(directory.composers.is_empty());
        assert!(directory.publishers.is_empty());
    }

    #[test]
    fn test_corrupt_directory_is_not_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("composer_database.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_directory(&path),
            Err(ReleaseError::Common(relm_common::Error::Json { .. }))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_saved_directory_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("_DATABASES").join("composer_database.json");
        let mut directory = ComposerDirectory::default();
        directory.composers.insert(
            "Anna Berg".to_string(),
            ComposerEntry {
                first_name: "Anna".to_string(),
                last_name: "Berg".to_string(),
                ..Default::default()
            },
        );
        save_directory(&path, &directory).unwrap();
        assert_eq!(load_directory(&path).unwrap(), directory);
    }
}
