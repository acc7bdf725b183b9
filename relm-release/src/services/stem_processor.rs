//! Stem discovery, conversion and review
//!
//! For every track the stems live somewhere under the track's working folder
//! in the pending album (often in a `Stems` sub-folder, sometimes with an
//! `archive` folder of rejected takes). Each stem is converted to 24-bit /
//! 48 kHz AIFF and named `IMG042 - Album - 01 Track STEM NAME.aiff` inside the
//! track's stems folder in the AIFF library.

use crate::error::{ReleaseError, ReleaseResult};
use crate::services::encoder::{AudioEncoder, EncodeTarget};
use crate::models::{Session, Track};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const STEM_EXTENSIONS: [&str; 3] = ["wav", "aif", "aiff"];

/// Lower-cased fragments marking full mixes and masters rather than stems
const IGNORE_KEYWORDS: [&str; 6] = ["mix", "full mix", "unmastered", "mastered", "master", "bpm"];

/// Fallback name when cleaning leaves nothing
pub const DEFAULT_STEM_NAME: &str = "STEM";

const OUTPUT_EXTENSION: &str = "aiff";

static STEM_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bstem\b|\b\d{2,3}\b").expect("valid stem word regex"));
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_,\-.]").expect("valid separator regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(i) if i > 0 => (&file_name[..i], &file_name[i + 1..]),
        _ => (file_name, ""),
    }
}

/// Whether a file in a track's working folder is a stem of that track
pub fn is_stem(file_name: &str, track_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    let (base, ext) = split_extension(&lower);
    if !STEM_EXTENSIONS.contains(&ext) {
        return false;
    }
    if lower.contains("pdf") || IGNORE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return false;
    }
    base.trim() != track_name.to_lowercase().trim()
}

/// Upper-case stem label derived from a source file name
///
/// The track name, the word "stem" and stray 2-3 digit numbers (BPM, take
/// numbers) are removed; separators become spaces and `&` becomes `AND`.
pub fn clean_stem_name(file_name: &str, track_name: &str) -> String {
    let (base, _) = split_extension(file_name);
    let without_track = if track_name.trim().is_empty() {
        base.to_string()
    } else {
        match Regex::new(&format!("(?i){}", regex::escape(track_name))) {
            Ok(re) => re.replace_all(base, "").into_owned(),
            Err(_) => base.to_string(),
        }
    };
    let cleaned = STEM_WORD_RE.replace_all(&without_track, "");
    let cleaned = SEPARATOR_RE.replace_all(&cleaned, " ").replace('&', "AND");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim().to_uppercase();
    if cleaned.is_empty() {
        DEFAULT_STEM_NAME.to_string()
    } else {
        cleaned
    }
}

/// `name`, or `name 2`, `name 3`, ... if already taken
pub fn unique_stem_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|n| format!("{} {}", name, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn is_archive(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.depth() > 0
        && entry.file_name().to_str().map(|n| n == "archive").unwrap_or(false)
}

/// Working folder of a track inside the pending album folder
pub fn find_track_folder(album_dir: &Path, track_name: &str) -> ReleaseResult<Option<PathBuf>> {
    let needle = track_name.to_lowercase();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(album_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    entries.sort();
    Ok(entries.into_iter().find(|p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }))
}

/// Stem source files of a track, de-duplicated by file name
pub fn find_stem_sources(track_folder: &Path, track_name: &str) -> Vec<PathBuf> {
    let mut candidates = vec![track_folder.to_path_buf()];
    let stems_sub = track_folder.join("Stems");
    if stems_sub.is_dir() {
        candidates.push(stems_sub);
    }

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for dir in candidates {
        let walker = WalkDir::new(&dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_archive(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if is_stem(name, track_name) && seen.insert(name.to_string()) {
                sources.push(entry.path().to_path_buf());
            }
        }
    }
    sources
}

fn stems_folder(session: &Session, track: &Track) -> PathBuf {
    track
        .stems_folder
        .clone()
        .unwrap_or_else(|| session.stems_path.join(session.track_base_name(track)))
}

fn stem_file_name(session: &Session, track: &Track, stem: &str) -> String {
    format!("{} {}.{}", session.track_base_name(track), stem, OUTPUT_EXTENSION)
}

/// Stem label of an output file name ("IMG042 - A - 01 T DRUMS.aiff" → "DRUMS")
pub fn stem_label(session: &Session, track: &Track, file_name: &str) -> String {
    let prefix = format!("{} ", session.track_base_name(track));
    let (base, _) = split_extension(file_name);
    base.strip_prefix(&prefix).unwrap_or(base).to_string()
}

struct ConversionJob {
    track_index: usize,
    src: PathBuf,
    dst: PathBuf,
}

/// Outcome of the stems step
#[derive(Debug, Default)]
pub struct StemReport {
    pub converted: usize,
    pub failed: Vec<PathBuf>,
}

/// Find, convert and name the stems of every track
///
/// Conversions run in parallel. A failed conversion is logged and the stem
/// dropped; a track left without stems fails the whole step.
pub fn process_stems(
    session: &mut Session,
    encoder: &dyn AudioEncoder,
) -> ReleaseResult<StemReport> {
    let album_dir = session.album_path_pending.clone();
    if !album_dir.is_dir() {
        return Err(ReleaseError::NotFound(format!(
            "album folder {}",
            album_dir.display()
        )));
    }

    let mut jobs = Vec::new();
    for (index, track) in session.tracks.iter().enumerate() {
        let Some(folder) = find_track_folder(&album_dir, &track.track_name)? else {
            tracing::warn!(track = %track.key(), "No working folder for track");
            continue;
        };
        let out_dir = stems_folder(session, track);
        std::fs::create_dir_all(&out_dir)?;

        let mut taken = HashSet::new();
        for src in find_stem_sources(&folder, &track.track_name) {
            let file_name = src
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let label = unique_stem_name(&clean_stem_name(file_name, &track.track_name), &taken);
            taken.insert(label.clone());
            let dst = out_dir.join(stem_file_name(session, track, &label));
            tracing::debug!(track = %track.key(), src = %src.display(), stem = %label, "Stem found");
            jobs.push(ConversionJob {
                track_index: index,
                src,
                dst,
            });
        }
    }

    let results: Vec<(usize, PathBuf, Result<(), _>)> = jobs
        .par_iter()
        .map(|job| {
            let result = encoder.convert(&job.src, &job.dst, EncodeTarget::AiffPcm24At48k);
            (job.track_index, job.dst.clone(), result)
        })
        .collect();

    let mut report = StemReport::default();
    let mut stems: Vec<Vec<String>> = vec![Vec::new(); session.tracks.len()];
    for ((index, dst, result), job) in results.into_iter().zip(&jobs) {
        match result {
            Ok(()) => {
                report.converted += 1;
                if let Some(name) = dst.file_name().and_then(|n| n.to_str()) {
                    stems[index].push(name.to_string());
                }
            }
            Err(e) => {
                tracing::error!(src = %job.src.display(), error = %e, "Stem conversion failed");
                report.failed.push(job.src.clone());
            }
        }
    }

    let empty: Vec<String> = session
        .tracks
        .iter()
        .zip(&stems)
        .filter(|(_, s)| s.is_empty())
        .map(|(t, _)| t.key())
        .collect();
    if !empty.is_empty() {
        return Err(ReleaseError::BadRequest(format!(
            "no stems found for: {}",
            empty.join(", ")
        )));
    }

    for (index, (track, names)) in session.tracks.iter_mut().zip(stems).enumerate() {
        track.stems = names;
        if track.stems_folder.is_none() {
            track.stems_folder = jobs
                .iter()
                .find(|j| j.track_index == index)
                .and_then(|j| j.dst.parent().map(Path::to_path_buf));
        }
    }

    tracing::info!(
        album = %session.album_code,
        converted = report.converted,
        failed = report.failed.len(),
        "Stems processed"
    );
    Ok(report)
}

fn track_index(session: &Session, track_number: &str) -> ReleaseResult<usize> {
    session
        .tracks
        .iter()
        .position(|t| t.track_number == track_number)
        .ok_or_else(|| ReleaseError::NotFound(format!("track {}", track_number)))
}

fn stem_index(session: &Session, track: &Track, stem: &str) -> ReleaseResult<usize> {
    track
        .stems
        .iter()
        .position(|f| f == stem || stem_label(session, track, f).eq_ignore_ascii_case(stem))
        .ok_or_else(|| {
            ReleaseError::NotFound(format!("stem '{}' of track {}", stem, track.key()))
        })
}

/// Rename a stem on disk and in the session
///
/// `from` may be the full file name or just the stem label.
pub fn rename_stem(
    session: &mut Session,
    track_number: &str,
    from: &str,
    to: &str,
) -> ReleaseResult<String> {
    let label = to.trim();
    if label.is_empty() {
        return Err(ReleaseError::BadRequest("new stem name is empty".to_string()));
    }

    let ti = track_index(session, track_number)?;
    let track = &session.tracks[ti];
    let si = stem_index(session, track, from)?;
    let folder = stems_folder(session, track);
    let old_name = track.stems[si].clone();
    let new_name = stem_file_name(session, track, label);
    if new_name == old_name {
        return Ok(new_name);
    }
    if track.stems.contains(&new_name) || folder.join(&new_name).exists() {
        return Err(ReleaseError::Conflict(format!("stem already exists: {}", new_name)));
    }

    std::fs::rename(folder.join(&old_name), folder.join(&new_name))?;
    tracing::info!(track = %track.key(), from = %old_name, to = %new_name, "Stem renamed");
    session.tracks[ti].stems[si] = new_name.clone();
    Ok(new_name)
}

/// Delete a stem file and drop it from the session
pub fn remove_stem(session: &mut Session, track_number: &str, stem: &str) -> ReleaseResult<String> {
    let ti = track_index(session, track_number)?;
    let track = &session.tracks[ti];
    let si = stem_index(session, track, stem)?;
    let path = stems_folder(session, track).join(&track.stems[si]);
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    tracing::info!(track = %track.key(), path = %path.display(), "Stem removed");
    Ok(session.tracks[ti].stems.remove(si))
}
