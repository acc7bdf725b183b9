//! Composer matching against the composer directory
//!
//! Raw composer names come from working folder names and are typed by hand,
//! so they rarely match a directory key exactly. Matching is deliberately
//! simple: exact key after whitespace normalization, otherwise first and last
//! word (middle names optional). Anything else must be resolved by the user,
//! helped by Jaro-Winkler suggestions.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{join_name_parts, ComposerDirectory, ComposerEntry, Session};
use std::collections::HashMap;

/// Minimum Jaro-Winkler similarity for a suggestion
pub const SUGGESTION_THRESHOLD: f64 = 0.80;
pub const MAX_SUGGESTIONS: usize = 3;

/// A raw composer name with no directory entry
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedName {
    /// "01 Track Name"
    pub track: String,
    pub name: String,
    /// Closest directory keys, best first
    pub suggestions: Vec<String>,
}

fn normalize_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Directory key for a raw composer name
pub fn smart_lookup(name: &str, directory: &ComposerDirectory) -> Option<String> {
    let norm = normalize_whitespace(name);
    if directory.composers.contains_key(&norm) {
        return Some(norm);
    }

    let parts: Vec<&str> = norm.split(' ').collect();
    if parts.len() < 2 {
        return None;
    }
    let first = parts[0].to_lowercase();
    let last = parts[parts.len() - 1].to_lowercase();

    directory
        .composers
        .keys()
        .find(|key| {
            let words: Vec<&str> = key.split_whitespace().collect();
            words.len() >= 2
                && words[0].to_lowercase() == first
                && words[words.len() - 1].to_lowercase() == last
        })
        .cloned()
}

/// Up to three directory keys resembling a name
pub fn suggest(name: &str, directory: &ComposerDirectory) -> Vec<String> {
    let target = normalize_whitespace(name).to_lowercase();
    let mut scored: Vec<(f64, &String)> = directory
        .composers
        .keys()
        .map(|key| (strsim::jaro_winkler(&target, &key.to_lowercase()), key))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, key)| key.clone())
        .collect()
}

/// Parse `--assign "Raw Name=Directory Key"` values
pub fn parse_assignments(values: &[String]) -> ReleaseResult<HashMap<String, String>> {
    values
        .iter()
        .map(|value| {
            let (raw, key) = value.split_once('=').ok_or_else(|| {
                ReleaseError::BadRequest(format!(
                    "assignment '{}' is not of the form \"Raw Name=Directory Key\"",
                    value
                ))
            })?;
            Ok((normalize_whitespace(raw), normalize_whitespace(key)))
        })
        .collect()
}

/// Resolve every raw composer name of the session to a directory key
///
/// Manual assignments win over lookup. The session is only modified when all
/// names resolve; otherwise `Unresolved` lists what is missing.
pub fn match_session(
    session: &mut Session,
    directory: &ComposerDirectory,
    assignments: &HashMap<String, String>,
) -> ReleaseResult<()> {
    for key in assignments.values() {
        if !directory.composers.contains_key(key) {
            return Err(ReleaseError::NotFound(format!(
                "composer '{}' in the directory",
                key
            )));
        }
    }

    let mut matched = Vec::with_capacity(session.tracks.len());
    let mut unresolved = Vec::new();
    for track in &session.tracks {
        let mut keys = Vec::with_capacity(track.composers.len());
        for raw in &track.composers {
            let resolved = assignments
                .get(&normalize_whitespace(raw))
                .cloned()
                .or_else(|| smart_lookup(raw, directory));
            match resolved {
                Some(key) => {
                    tracing::debug!(track = %track.key(), raw = %raw, key = %key, "Composer matched");
                    keys.push(key);
                }
                None => unresolved.push(UnresolvedName {
                    track: track.key(),
                    name: raw.clone(),
                    suggestions: suggest(raw, directory),
                }),
            }
        }
        matched.push(keys);
    }

    if !unresolved.is_empty() {
        tracing::warn!(
            album = %session.album_code,
            unresolved = unresolved.len(),
            "Composer matching incomplete"
        );
        return Err(ReleaseError::Unresolved(unresolved));
    }

    for (track, keys) in session.tracks.iter_mut().zip(matched) {
        track.matched_composers = keys;
    }
    tracing::info!(album = %session.album_code, "All composers matched");
    Ok(())
}

/// Result of adding a composer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(String),
    /// Key already present; the existing entry was kept
    AlreadyExists(String),
}

/// Add a composer under the key built from its names
pub fn add_composer(
    directory: &mut ComposerDirectory,
    entry: ComposerEntry,
) -> ReleaseResult<AddOutcome> {
    let entry = ComposerEntry {
        first_name: entry.first_name.trim().to_string(),
        middle_name: entry.middle_name.trim().to_string(),
        last_name: entry.last_name.trim().to_string(),
        society: entry.society.trim().to_string(),
        ipi: entry.ipi.trim().to_string(),
        publisher_key: entry.publisher_key.trim().to_string(),
        capacity: entry.capacity,
    };
    if entry.first_name.is_empty() && entry.last_name.is_empty() {
        return Err(ReleaseError::BadRequest(
            "a composer needs a first or last name".to_string(),
        ));
    }
    if !entry.publisher_key.is_empty() && !directory.publishers.contains_key(&entry.publisher_key) {
        return Err(ReleaseError::NotFound(format!(
            "publisher '{}' in the directory",
            entry.publisher_key
        )));
    }

    let key = join_name_parts(&entry.first_name, &entry.middle_name, &entry.last_name);
    if directory.composers.contains_key(&key) {
        return Ok(AddOutcome::AlreadyExists(key));
    }
    directory.composers.insert(key.clone(), entry);
    tracing::info!(key = %key, "Composer added");
    Ok(AddOutcome::Added(key))
}

pub fn remove_composer(directory: &mut ComposerDirectory, key: &str) -> ReleaseResult<ComposerEntry> {
    let entry = directory
        .composers
        .shift_remove(key)
        .ok_or_else(|| ReleaseError::NotFound(format!("composer '{}'", key)))?;
    tracing::info!(key = %key, "Composer removed");
    Ok(entry)
}

/// (key, society, publisher) rows sorted by key
pub fn list_composers(directory: &ComposerDirectory) -> Vec<(String, String, String)> {
    let mut rows: Vec<_> = directory
        .composers
        .iter()
        .map(|(key, entry)| {
            (
                key.clone(),
                entry.society.clone(),
                directory.publisher_display(entry),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}
