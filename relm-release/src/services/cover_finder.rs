//! Cover art step
//!
//! The designer delivers several renditions of the cover into
//! `<covers>/<CODE> <Name>/`; the one under 8 MB (named "... 8mb ...",
//! "8 MB", "8_MB") is the one that goes into the AIFF album folder.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static COVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)8[\s_]?mb").expect("valid cover regex"));

pub fn is_cover_file(file_name: &str) -> bool {
    COVER_RE.is_match(file_name)
}

/// First cover candidate (by file name) in the album's covers folder
pub fn find_cover(covers_root: &Path, album_title: &str) -> ReleaseResult<PathBuf> {
    let album_dir = covers_root.join(album_title);
    if !album_dir.is_dir() {
        return Err(ReleaseError::NotFound(format!(
            "covers folder {}",
            album_dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(&album_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    files
        .into_iter()
        .find(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(is_cover_file)
                .unwrap_or(false)
        })
        .ok_or_else(|| {
            ReleaseError::NotFound(format!(
                "a cover named like '... 8mb ...' in {}",
                album_dir.display()
            ))
        })
}

/// Copy the cover into the AIFF album folder as `<CODE> <Name><ext>`
pub fn add_cover(session: &mut Session, covers_root: &Path) -> ReleaseResult<PathBuf> {
    let title = session.album_title();
    let source = find_cover(covers_root, &title)?;
    let file_name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", title, ext),
        None => title.clone(),
    };
    let target = session.album_path_aiff.join(file_name);
    std::fs::copy(&source, &target)?;

    tracing::info!(
        album = %session.album_code,
        source = %source.display(),
        target = %target.display(),
        "Cover copied"
    );
    session.cover_file = Some(target.clone());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cover_name_variants() {
        assert!(is_cover_file("IMG042 Rise 8mb.jpg"));
        assert!(is_cover_file("cover_8_MB.png"));
        assert!(is_cover_file("cover 8 Mb.jpg"));
        assert!(!is_cover_file("cover 3000px.jpg"));
        assert!(!is_cover_file("cover 8  mb.jpg"));
    }

    #[test]
    fn test_add_cover_copies_first_match() {
        let dir = TempDir::new().unwrap();
        let covers = dir.path().join("covers");
        let album_covers = covers.join("IMG042 Rise");
        std::fs::create_dir_all(&album_covers).unwrap();
        std::fs::write(album_covers.join("full.png"), b"big").unwrap();
        std::fs::write(album_covers.join("b 8mb.jpg"), b"second").unwrap();
        std::fs::write(album_covers.join("a 8 MB.jpg"), b"first").unwrap();
        let aiff = dir.path().join("aiff");
        std::fs::create_dir_all(&aiff).unwrap();

        let mut session = Session {
            album_code: "IMG042".to_string(),
            album_name: "Rise".to_string(),
            album_path_aiff: aiff.clone(),
            ..Default::default()
        };
        let target = add_cover(&mut session, &covers).unwrap();

        assert_eq!(target, aiff.join("IMG042 Rise.jpg"));
        assert_eq!(std::fs::read(&target).unwrap(), b"first");
        assert_eq!(session.cover_file, Some(target));
    }

    #[test]
    fn test_missing_cover_is_not_found() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("IMG042 Rise")).unwrap();
        assert!(matches!(
            find_cover(dir.path(), "IMG042 Rise"),
            Err(ReleaseError::NotFound(_))
        ));
    }
}
