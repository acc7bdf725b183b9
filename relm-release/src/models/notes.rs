//! Album notes: the texts staff prepare before metadata generation
//!
//! Read from a TOML file so descriptions can be pasted in comfortably:
//!
//! ```toml
//! release_date = "2025-11-07"
//! description = "Epic hybrid trailer cues."
//! styles = "Epic, Hybrid"
//!
//! [[tracks]]
//! number = "01"
//! title = "Iron Will"
//! description = "Pounding drums build to a choir climax."
//! instrumentation = "Drums, Choir, Strings"
//! keywords = "epic, battle, heroic"
//! ```

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::Session;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlbumNotes {
    /// YYYY-MM-DD; today when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub styles: String,
    #[serde(default)]
    pub tracks: Vec<TrackNotes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackNotes {
    /// Track number as in the session ("01")
    pub number: String,
    /// Informational only, helps whoever fills the file in
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instrumentation: String,
    /// Comma-separated
    #[serde(default)]
    pub keywords: String,
}

impl AlbumNotes {
    /// Blank notes with one entry per session track
    pub fn template(session: &Session) -> Self {
        Self {
            release_date: Some(relm_common::time::today().to_string()),
            description: session.album_description.clone().unwrap_or_default(),
            styles: String::new(),
            tracks: session
                .tracks
                .iter()
                .map(|t| TrackNotes {
                    number: t.track_number.clone(),
                    title: t.track_name.clone(),
                    description: t.manual_description.clone(),
                    instrumentation: t.manual_instrumentation.clone(),
                    keywords: t.manual_keywords.clone(),
                })
                .collect(),
        }
    }

    pub fn read(path: &Path) -> ReleaseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ReleaseError::InvalidNotes(format!("{}: {}", path.display(), e))
        })
    }

    pub fn write(&self, path: &Path) -> ReleaseResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReleaseError::InvalidNotes(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Release date, defaulting to today
    pub fn release_date(&self) -> ReleaseResult<NaiveDate> {
        match self.release_date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(date) => Ok(relm_common::time::parse_release_date(date)?),
            None => Ok(relm_common::time::today()),
        }
    }

    /// Copy per-track texts into the session
    ///
    /// Every notes entry must name a session track; tracks without an entry
    /// keep whatever texts they already had.
    pub fn apply_to(&self, session: &mut Session) -> ReleaseResult<()> {
        let album_code = session.album_code.clone();
        for notes in &self.tracks {
            let track = session.track_mut(&notes.number).ok_or_else(|| {
                ReleaseError::InvalidNotes(format!(
                    "track {} is not part of {}",
                    notes.number, album_code
                ))
            })?;
            track.manual_description = notes.description.trim().to_string();
            track.manual_instrumentation = notes.instrumentation.trim().to_string();
            track.manual_keywords = notes.keywords.trim().to_string();
        }
        session.album_description = Some(self.description.trim().to_string());
        Ok(())
    }
}
