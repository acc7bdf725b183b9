//! Album session and wizard state machine
//!
//! The session is the single mutable record describing the album being
//! released. It is created by the structure step, loaded at the start of every
//! later step, mutated in memory and written back wholesale.
//!
//! Steps run strictly in order: Structure → Stems → Composers → Cover →
//! Metadata → TotalSync → Harvest → Social → Finished. A step may only run
//! once its predecessor is recorded in `completed_steps`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Wizard screens in release order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Scan `_MASTERED`, create album folders, write the session
    Structure,
    /// Find, convert and rename stems
    Stems,
    /// Map raw composer names onto directory keys
    Composers,
    /// Copy the "8 MB" cover into the album
    Cover,
    /// Generate the album METADATA.xlsx and allocate ISRCs
    Metadata,
    /// Append the album rows to TOTAL METADATA
    TotalSync,
    /// Build the Harvest delivery folder
    Harvest,
    /// Draft social media posts
    Social,
    /// Release done
    Finished,
}

impl WizardStep {
    pub const ALL: [WizardStep; 9] = [
        WizardStep::Structure,
        WizardStep::Stems,
        WizardStep::Composers,
        WizardStep::Cover,
        WizardStep::Metadata,
        WizardStep::TotalSync,
        WizardStep::Harvest,
        WizardStep::Social,
        WizardStep::Finished,
    ];

    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    /// Step that must be completed before this one
    pub fn previous(self) -> Option<WizardStep> {
        match self.index() {
            0 => None,
            i => Some(Self::ALL[i - 1]),
        }
    }

    /// Step that follows this one
    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// CLI command that runs this step
    pub fn command(self) -> &'static str {
        match self {
            WizardStep::Structure => "relm scan <album>",
            WizardStep::Stems => "relm stems run",
            WizardStep::Composers => "relm composers match",
            WizardStep::Cover => "relm cover",
            WizardStep::Metadata => "relm metadata --notes <file>",
            WizardStep::TotalSync => "relm sync-total",
            WizardStep::Harvest => "relm harvest",
            WizardStep::Social => "relm social --disco <url> --youtube <url>",
            WizardStep::Finished => "relm status",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStep::Structure => "album structure",
            WizardStep::Stems => "stems",
            WizardStep::Composers => "composers",
            WizardStep::Cover => "cover",
            WizardStep::Metadata => "metadata",
            WizardStep::TotalSync => "TOTAL METADATA sync",
            WizardStep::Harvest => "Harvest delivery",
            WizardStep::Social => "social media",
            WizardStep::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// One mastered track of the album
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Two-digit position from the mastered file name ("01")
    pub track_number: String,
    pub track_name: String,
    /// Raw composer names parsed from the track folder
    #[serde(default)]
    pub composers: Vec<String>,
    /// BPM as written in the track folder name, "000" when unknown
    #[serde(default)]
    pub track_bpm: String,
    /// Seconds, rounded to hundredths; `None` when the file could not be read
    #[serde(default)]
    pub duration: Option<f64>,
    /// File name inside `_MASTERED`
    pub mastered_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stems_folder: Option<PathBuf>,
    /// Stem file names inside `stems_folder`
    #[serde(default)]
    pub stems: Vec<String>,
    /// Composer directory keys, one per raw composer name
    #[serde(default)]
    pub matched_composers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(default)]
    pub manual_description: String,
    #[serde(default)]
    pub manual_instrumentation: String,
    #[serde(default)]
    pub manual_keywords: String,
}

impl Track {
    /// "01 Track Name", used in logs and review listings
    pub fn key(&self) -> String {
        format!("{} {}", self.track_number, self.track_name)
    }
}

/// Album release in progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub album_code: String,
    pub album_name: String,
    /// Album folder inside the pending folder
    pub album_path_pending: PathBuf,
    pub album_path_aiff: PathBuf,
    pub album_path_mp3: PathBuf,
    pub stems_path: PathBuf,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_description: Option<String>,
    #[serde(default)]
    pub completed_steps: BTreeSet<WizardStep>,
}

impl Session {
    /// "IMG042 Album Name"
    pub fn album_title(&self) -> String {
        format!("{} {}", self.album_code, self.album_name)
    }

    /// Base name shared by a track's master, stems and delivery files:
    /// "IMG042 - Album Name - 01 Track Name"
    pub fn track_base_name(&self, track: &Track) -> String {
        format!(
            "{} - {} - {} {}",
            self.album_code, self.album_name, track.track_number, track.track_name
        )
    }

    pub fn is_completed(&self, step: WizardStep) -> bool {
        self.completed_steps.contains(&step)
    }

    /// First step not yet completed
    pub fn next_step(&self) -> Option<WizardStep> {
        WizardStep::ALL
            .iter()
            .copied()
            .find(|s| !self.is_completed(*s))
    }

    /// Record a step; later steps are forgotten because their output is now stale
    pub fn mark_completed(&mut self, step: WizardStep) {
        self.completed_steps.retain(|s| *s < step);
        self.completed_steps.insert(step);
    }

    pub fn track_mut(&mut self, track_number: &str) -> Option<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.track_number == track_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_is_linear() {
        assert_eq!(WizardStep::Structure.previous(), None);
        assert_eq!(WizardStep::Stems.previous(), Some(WizardStep::Structure));
        assert_eq!(WizardStep::Social.next(), Some(WizardStep::Finished));
        assert_eq!(WizardStep::Finished.next(), None);
        assert!(WizardStep::Cover < WizardStep::Metadata);
    }

    #[test]
    fn test_rerunning_a_step_forgets_later_steps() {
        let mut session = Session::default();
        for step in [
            WizardStep::Structure,
            WizardStep::Stems,
            WizardStep::Composers,
            WizardStep::Cover,
        ] {
            session.mark_completed(step);
        }

        session.mark_completed(WizardStep::Stems);

        assert!(session.is_completed(WizardStep::Structure));
        assert!(session.is_completed(WizardStep::Stems));
        assert!(!session.is_completed(WizardStep::Composers));
        assert_eq!(session.next_step(), Some(WizardStep::Composers));
    }

    #[test]
    fn test_track_base_name() {
        let session = Session {
            album_code: "IMG042".to_string(),
            album_name: "Rise Of Titans".to_string(),
            ..Default::default()
        };
        let track = Track {
            track_number: "03".to_string(),
            track_name: "Iron Will".to_string(),
            ..Default::default()
        };
        assert_eq!(
            session.track_base_name(&track),
            "IMG042 - Rise Of Titans - 03 Iron Will"
        );
        assert_eq!(track.key(), "03 Iron Will");
    }

    #[test]
    fn test_session_json_uses_snake_case_steps() {
        let mut session = Session::default();
        session.mark_completed(WizardStep::Structure);
        session.mark_completed(WizardStep::TotalSync);
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"structure\""));
        assert!(json.contains("\"total_sync\""));
    }
}
