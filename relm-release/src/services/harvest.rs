//! Harvest delivery folder
//!
//! Harvest takes WAV 24-bit / 48 kHz masters, the cover and the album
//! metadata both as xlsx and as tab-delimited text. The folder is assembled
//! from the AIFF album folder once the MP3 library has been filled.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::Session;
use crate::services::encoder::{AudioEncoder, EncodeTarget};
use crate::services::spreadsheet;
use std::path::{Path, PathBuf};

/// What went into the Harvest folder
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HarvestReport {
    pub folder: PathBuf,
    pub converted: Vec<String>,
    pub copied: Vec<String>,
    pub metadata_copied: bool,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Check that every track has its AIFF and MP3 in the library folders
pub fn verify_tracks(session: &Session) -> ReleaseResult<()> {
    for (folder, label) in [
        (&session.album_path_aiff, "AIFF"),
        (&session.album_path_mp3, "MP3"),
    ] {
        if !folder.is_dir() {
            return Err(ReleaseError::NotFound(format!(
                "{} album folder {}",
                label,
                folder.display()
            )));
        }
    }

    let mut missing = Vec::new();
    for track in &session.tracks {
        let base = session.track_base_name(track);
        let has_aiff = ["aiff", "aif"]
            .iter()
            .any(|ext| session.album_path_aiff.join(format!("{}.{}", base, ext)).is_file());
        if !has_aiff {
            missing.push(format!("{}.aiff", base));
        }
        if !session.album_path_mp3.join(format!("{}.mp3", base)).is_file() {
            missing.push(format!("{}.mp3", base));
        }
    }

    if missing.is_empty() {
        tracing::info!(album = %session.album_code, "All AIFF and MP3 tracks present");
        Ok(())
    } else {
        Err(ReleaseError::NotFound(format!(
            "library files missing:\n  {}",
            missing.join("\n  ")
        )))
    }
}

/// Build `<harvest>/<CODE> <Name>`
pub fn prepare_harvest(
    session: &Session,
    harvest_root: &Path,
    metadata_xlsx: &Path,
    encoder: &dyn AudioEncoder,
    overwrite: bool,
) -> ReleaseResult<HarvestReport> {
    verify_tracks(session)?;

    let folder = harvest_root.join(session.album_title());
    if folder.exists() {
        if !overwrite {
            return Err(ReleaseError::Conflict(format!(
                "Harvest folder already exists: {} (use --overwrite to replace it)",
                folder.display()
            )));
        }
        std::fs::remove_dir_all(&folder)?;
    }
    std::fs::create_dir_all(&folder)?;

    let mut report = HarvestReport {
        folder: folder.clone(),
        ..Default::default()
    };

    let cover = session
        .cover_file
        .as_deref()
        .filter(|c| c.is_file())
        .and_then(|c| Some((c, c.file_name()?.to_str()?)));
    if let Some((cover, name)) = cover {
        std::fs::copy(cover, folder.join(name))?;
        report.copied.push(name.to_string());
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&session.album_path_aiff)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if cover.is_some_and(|(_, cover_name)| cover_name == name) {
            continue;
        }
        if has_extension(&path, &["aif", "aiff"]) {
            let wav = folder.join(Path::new(name).with_extension(EncodeTarget::WavPcm24At48k.extension()));
            encoder.convert(&path, &wav, EncodeTarget::WavPcm24At48k)?;
            tracing::debug!(file = %name, "Converted to WAV");
            report.converted.push(name.to_string());
        } else {
            std::fs::copy(&path, folder.join(name))?;
            report.copied.push(name.to_string());
        }
    }

    if metadata_xlsx.is_file() {
        let Some(xlsx_name) = metadata_xlsx.file_name() else {
            return Err(ReleaseError::BadRequest(format!(
                "invalid metadata path {}",
                metadata_xlsx.display()
            )));
        };
        let dst_xlsx = folder.join(xlsx_name);
        std::fs::copy(metadata_xlsx, &dst_xlsx)?;

        let sheet = spreadsheet::read_first_sheet(&dst_xlsx)?;
        let rows: Vec<Vec<String>> = sheet.data_rows().cloned().collect();
        spreadsheet::write_tsv(&dst_xlsx.with_extension("txt"), sheet.header(), &rows)?;
        report.metadata_copied = true;
    } else {
        tracing::warn!(path = %metadata_xlsx.display(), "Album metadata not found, skipping");
    }

    tracing::info!(
        album = %session.album_code,
        folder = %folder.display(),
        converted = report.converted.len(),
        copied = report.copied.len(),
        "Harvest folder prepared"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;
    use crate::services::encoder::EncoderError;
    use tempfile::TempDir;

    fn session(dir: &Path) -> Session {
        let aiff = dir.join("aiff").join("IMG042 Rise");
        let mp3 = dir.join("mp3").join("IMG042 Rise");
        std::fs::create_dir_all(&aiff).unwrap();
        std::fs::create_dir_all(&mp3).unwrap();
        Session {
            album_code: "IMG042".to_string(),
            album_name: "Rise".to_string(),
            album_path_aiff: aiff,
            album_path_mp3: mp3,
            tracks: vec![Track {
                track_number: "01".to_string(),
                track_name: "Iron Will".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_verify_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let session = session(dir.path());
        let err = verify_tracks(&session).unwrap_err().to_string();
        assert!(err.contains("IMG042 - Rise - 01 Iron Will.aiff"));
        assert!(err.contains("IMG042 - Rise - 01 Iron Will.mp3"));

        std::fs::write(session.album_path_aiff.join("IMG042 - Rise - 01 Iron Will.aif"), b"a").unwrap();
        std::fs::write(session.album_path_mp3.join("IMG042 - Rise - 01 Iron Will.mp3"), b"m").unwrap();
        assert!(verify_tracks(&session).is_ok());
    }

    struct CopyEncoder;

    impl AudioEncoder for CopyEncoder {
        fn convert(&self, src: &Path, dst: &Path, _target: EncodeTarget) -> Result<(), EncoderError> {
            std::fs::copy(src, dst).map_err(|e| EncoderError::ExecutionError(e.to_string()))?;
            Ok(())
        }
    }

    #[test]
    fn test_cover_in_album_folder_is_copied_once() {
        let dir = TempDir::new().unwrap();
        let mut session = session(dir.path());
        let aiff = session.album_path_aiff.clone();
        std::fs::write(aiff.join("IMG042 - Rise - 01 Iron Will.aiff"), b"a").unwrap();
        std::fs::write(aiff.join("IMG042 Rise.jpg"), b"cover").unwrap();
        std::fs::write(aiff.join("booklet.pdf"), b"pdf").unwrap();
        std::fs::write(
            session.album_path_mp3.join("IMG042 - Rise - 01 Iron Will.mp3"),
            b"m",
        )
        .unwrap();
        session.cover_file = Some(aiff.join("IMG042 Rise.jpg"));

        let harvest = dir.path().join("harvest");
        let report = prepare_harvest(
            &session,
            &harvest,
            &dir.path().join("missing.xlsx"),
            &CopyEncoder,
            false,
        )
        .unwrap();

        assert_eq!(report.copied, ["IMG042 Rise.jpg", "booklet.pdf"]);
        assert_eq!(report.converted, ["IMG042 - Rise - 01 Iron Will.aiff"]);
        assert!(report.folder.join("IMG042 Rise.jpg").is_file());
        assert!(!report.metadata_copied);
    }

    #[test]
    fn test_has_extension_ignores_case() {
        assert!(has_extension(Path::new("a.AIF"), &["aif", "aiff"]));
        assert!(!has_extension(Path::new("a.wav"), &["aif", "aiff"]));
        assert!(!has_extension(Path::new("noext"), &["aif"]));
    }
}
