//! Album structure step
//!
//! Scans `<pending>/<album>/_MASTERED` for mastered tracks, reads composers and
//! BPM from the per-track working folders, and lays out the album folders in
//! the AIFF and MP3 libraries.
//!
//! Mastered file names carry everything the later steps need:
//! `IMG042 - Album Name - 01 Track Name.aif`. Working folders next to
//! `_MASTERED` are named `Composer A and Composer B - Track Name 120`.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{Session, Track, WizardStep};
use lofty::prelude::*;
use lofty::probe::Probe;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use relm_common::human_time::round_hundredths;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Folder of final masters inside an album folder
pub const MASTERED_FOLDER: &str = "_MASTERED";

/// Library sub-folders group albums in fives: `_IMG PART 1`, `_IMG PART 2`, ...
pub const PART_FOLDER_PREFIX: &str = "_IMG PART ";
pub const ALBUMS_PER_PART: usize = 5;

pub const UNKNOWN_COMPOSER: &str = "Unknown";
pub const UNKNOWN_BPM: &str = "000";

static MASTERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2,5}\d{3}) - (.+?) - (\d{2}) (.+)\.(?i:aiff?)$")
        .expect("valid mastered file regex")
});
static TRACK_FOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+?) - (.+) (\d+)$").expect("valid track folder regex"));
static PART_FOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_IMG PART (\d+)$").expect("valid part folder regex"));

/// Album scanning errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No {MASTERED_FOLDER} folder in {0}")]
    NoMasteredFolder(PathBuf),

    #[error("No mastered tracks named like 'IMG000 - Album - 01 Track.aif' in {0}")]
    NoMasteredTracks(PathBuf),

    /// Cannot read a directory
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

/// Result of scanning one pending album
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedAlbum {
    pub album_code: String,
    pub album_name: String,
    pub album_dir: PathBuf,
    pub tracks: Vec<Track>,
}

/// Sorted names of the sub-directories of a folder
pub fn list_subdirectories(dir: &Path) -> Result<Vec<String>, ScanError> {
    if !dir.exists() {
        return Err(ScanError::PathNotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir)
        .map_err(|e| ScanError::FileAccessError(dir.to_path_buf(), e.to_string()))?;

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

/// Albums waiting in the pending folder
pub fn list_albums(pending: &Path) -> Result<Vec<String>, ScanError> {
    list_subdirectories(pending)
}

/// Parse a mastered file name into (code, album name, track number, track name)
pub fn parse_mastered_name(file_name: &str) -> Option<(String, String, String, String)> {
    let caps = MASTERED_RE.captures(file_name)?;
    Some((
        caps[1].to_string(),
        caps[2].to_string(),
        caps[3].to_string(),
        caps[4].to_string(),
    ))
}

/// Composers and BPM from a working folder name
pub fn parse_track_folder(folder_name: &str) -> Option<(Vec<String>, String)> {
    let caps = TRACK_FOLDER_RE.captures(folder_name)?;
    let composers = caps[1]
        .split(" and ")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    Some((composers, caps[3].to_string()))
}

/// Track duration in seconds, rounded to hundredths
pub fn read_duration(path: &Path) -> Option<f64> {
    let tagged_file = match Probe::open(path).and_then(|p| p.read()) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read track duration");
            return None;
        }
    };
    Some(round_hundredths(tagged_file.properties().duration().as_secs_f64()))
}

/// Scan `<album_dir>/_MASTERED` and the track working folders
pub fn scan_album(album_dir: &Path) -> Result<ScannedAlbum, ScanError> {
    let mastered_dir = album_dir.join(MASTERED_FOLDER);
    if !mastered_dir.is_dir() {
        return Err(ScanError::NoMasteredFolder(album_dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(&mastered_dir)
        .map_err(|e| ScanError::FileAccessError(mastered_dir.clone(), e.to_string()))?;
    let mut mastered: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| MASTERED_RE.is_match(name))
        .collect();
    mastered.sort();

    let Some((album_code, album_name, _, _)) =
        mastered.first().and_then(|f| parse_mastered_name(f))
    else {
        return Err(ScanError::NoMasteredTracks(mastered_dir));
    };

    let folders = list_subdirectories(album_dir)?;

    let tracks: Vec<Track> = mastered
        .par_iter()
        .filter_map(|file| {
            let (_, _, track_number, track_name) = parse_mastered_name(file)?;
            let (composers, track_bpm) = folders
                .iter()
                .filter(|f| f.contains(track_name.as_str()))
                .find_map(|f| parse_track_folder(f))
                .unwrap_or_else(|| {
                    tracing::warn!(track = %track_name, "No working folder with composers and BPM");
                    (vec![UNKNOWN_COMPOSER.to_string()], UNKNOWN_BPM.to_string())
                });
            Some(Track {
                track_number,
                track_name,
                composers,
                track_bpm,
                duration: read_duration(&mastered_dir.join(file)),
                mastered_file: file.clone(),
                ..Default::default()
            })
        })
        .collect();

    tracing::info!(
        album = %album_code,
        tracks = tracks.len(),
        "Mastered tracks scanned"
    );

    Ok(ScannedAlbum {
        album_code,
        album_name,
        album_dir: album_dir.to_path_buf(),
        tracks,
    })
}

/// Highest `_IMG PART N` with room for another album, or a new one
pub fn find_or_create_part_folder(library: &Path) -> ReleaseResult<PathBuf> {
    let highest = list_subdirectories(library)?
        .iter()
        .filter_map(|name| PART_FOLDER_RE.captures(name))
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max();

    let part_number = match highest {
        None => 1,
        Some(n) => {
            let part = library.join(format!("{}{}", PART_FOLDER_PREFIX, n));
            if list_subdirectories(&part)?.len() < ALBUMS_PER_PART {
                return Ok(part);
            }
            n + 1
        }
    };

    let part = library.join(format!("{}{}", PART_FOLDER_PREFIX, part_number));
    std::fs::create_dir_all(&part)?;
    tracing::info!(path = %part.display(), "Created library part folder");
    Ok(part)
}

/// Create the album folders in both libraries and build the new session
///
/// Existing album folders are a conflict unless `overwrite` is set, in which
/// case both are removed and recreated empty.
pub fn create_album_structure(
    scanned: ScannedAlbum,
    all_aiff: &Path,
    all_mp3: &Path,
    overwrite: bool,
) -> ReleaseResult<Session> {
    let album_title = format!("{} {}", scanned.album_code, scanned.album_name);
    let aiff_part = find_or_create_part_folder(all_aiff)?;
    let mp3_part = find_or_create_part_folder(all_mp3)?;
    let album_aiff = aiff_part.join(&album_title);
    let album_mp3 = mp3_part.join(&album_title);

    for dir in [&album_aiff, &album_mp3] {
        if dir.exists() {
            if !overwrite {
                return Err(ReleaseError::Conflict(format!(
                    "album folder already exists: {} (use --overwrite to replace it)",
                    dir.display()
                )));
            }
            std::fs::remove_dir_all(dir)?;
            tracing::warn!(path = %dir.display(), "Removed existing album folder");
        }
    }

    let stems_path = album_aiff.join("Stems");
    std::fs::create_dir_all(&stems_path)?;
    std::fs::create_dir_all(&album_mp3)?;

    let mut session = Session {
        album_code: scanned.album_code,
        album_name: scanned.album_name,
        album_path_pending: scanned.album_dir,
        album_path_aiff: album_aiff,
        album_path_mp3: album_mp3,
        stems_path,
        tracks: scanned.tracks,
        ..Default::default()
    };

    let stem_folders: Vec<PathBuf> = session
        .tracks
        .iter()
        .map(|t| session.stems_path.join(session.track_base_name(t)))
        .collect();
    for (track, folder) in session.tracks.iter_mut().zip(stem_folders) {
        std::fs::create_dir_all(&folder)?;
        track.stems_folder = Some(folder);
    }

    session.mark_completed(WizardStep::Structure);
    tracing::info!(
        album = %session.album_code,
        aiff = %session.album_path_aiff.display(),
        mp3 = %session.album_path_mp3.display(),
        "Album structure created"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_mastered_name() {
        let parsed = parse_mastered_name("IMG042 - Rise Of Titans - 03 Iron Will.aif").unwrap();
        assert_eq!(parsed.0, "IMG042");
        assert_eq!(parsed.1, "Rise Of Titans");
        assert_eq!(parsed.2, "03");
        assert_eq!(parsed.3, "Iron Will");

        assert!(parse_mastered_name("IMT007 - Tools - 01 Hit.AIFF").is_some());
        assert!(parse_mastered_name("IMG042 - Rise - 3 Iron Will.aif").is_none());
        assert!(parse_mastered_name("IMG042 - Rise - 03 Iron Will.wav").is_none());
        assert!(parse_mastered_name("img042 - Rise - 03 Iron Will.aif").is_none());
    }

    #[test]
    fn test_parse_track_folder() {
        let (composers, bpm) =
            parse_track_folder("Anna Berg and John Smith - Iron Will 128").unwrap();
        assert_eq!(composers, vec!["Anna Berg", "John Smith"]);
        assert_eq!(bpm, "128");
        assert!(parse_track_folder("Iron Will").is_none());
    }

    #[test]
    fn test_part_folder_created_when_library_empty() {
        let dir = TempDir::new().unwrap();
        let part = find_or_create_part_folder(dir.path()).unwrap();
        assert_eq!(part, dir.path().join("_IMG PART 1"));
        assert!(part.is_dir());
    }

    #[test]
    fn test_part_folder_reused_until_full() {
        let dir = TempDir::new().unwrap();
        let part2 = dir.path().join("_IMG PART 2");
        std::fs::create_dir_all(dir.path().join("_IMG PART 1")).unwrap();
        for i in 0..4 {
            std::fs::create_dir_all(part2.join(format!("IMG00{} A", i))).unwrap();
        }
        assert_eq!(find_or_create_part_folder(dir.path()).unwrap(), part2);

        std::fs::create_dir_all(part2.join("IMG009 Fifth")).unwrap();
        let part3 = find_or_create_part_folder(dir.path()).unwrap();
        assert_eq!(part3, dir.path().join("_IMG PART 3"));
        assert!(part3.is_dir());
    }

    #[test]
    fn test_highest_part_wins_numerically() {
        let dir = TempDir::new().unwrap();
        for n in [2, 10, 9] {
            std::fs::create_dir_all(dir.path().join(format!("_IMG PART {}", n))).unwrap();
        }
        assert_eq!(
            find_or_create_part_folder(dir.path()).unwrap(),
            dir.path().join("_IMG PART 10")
        );
    }

    #[test]
    fn test_missing_mastered_folder() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_album(dir.path()),
            Err(ScanError::NoMasteredFolder(_))
        ));
    }

    #[test]
    fn test_mastered_folder_without_tracks() {
        let dir = TempDir::new().unwrap();
        let mastered = dir.path().join(MASTERED_FOLDER);
        std::fs::create_dir_all(&mastered).unwrap();
        std::fs::write(mastered.join("notes.txt"), "x").unwrap();
        assert!(matches!(
            scan_album(dir.path()),
            Err(ScanError::NoMasteredTracks(_))
        ));
    }
}
