//! Error types for relm-release

use crate::models::WizardStep;
use crate::services::album_scanner::ScanError;
use crate::services::composer_matcher::UnresolvedName;
use crate::services::encoder::EncoderError;
use crate::services::spreadsheet::SpreadsheetError;
use thiserror::Error;

/// Release workflow error type
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// relm-common error (config, JSON stores)
    #[error(transparent)]
    Common(#[from] relm_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Encoder(#[from] EncoderError),

    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    /// No session.json yet
    #[error("No album in progress, run `relm scan <album>` first")]
    NoSession,

    /// Step attempted before its predecessor was completed
    #[error("Cannot run {step} before {required} is completed (run `{}`)", .required.command())]
    StepOrder {
        step: WizardStep,
        required: WizardStep,
    },

    /// Output already exists and `--overwrite` was not given
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Composer names with no directory entry
    #[error("{}", format_unresolved(.0))]
    Unresolved(Vec<UnresolvedName>),

    #[error("Invalid album notes: {0}")]
    InvalidNotes(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

fn format_unresolved(names: &[UnresolvedName]) -> String {
    let mut out = format!("{} composer name(s) not found in the directory:", names.len());
    for name in names {
        out.push_str(&format!("\n  track {}: \"{}\"", name.track, name.name));
        if !name.suggestions.is_empty() {
            out.push_str(&format!(" (did you mean: {}?)", name.suggestions.join(", ")));
        }
    }
    out.push_str("\nAdd them with `relm composers add` or map them with --assign \"Name=Directory Key\"");
    out
}

/// Result type for release operations
pub type ReleaseResult<T> = Result<T, ReleaseError>;
