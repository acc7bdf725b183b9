//! Data models for the release wizard
//!
//! - `session`: the album in progress, its tracks and the wizard position
//! - `directory`: composer, publisher and ISRC directory entries
//! - `notes`: album/track texts typed in before metadata generation

pub mod directory;
pub mod notes;
pub mod session;

pub use directory::{
    join_name_parts, ComposerDirectory, ComposerEntry, IsrcDirectory, IsrcEntry, PublisherEntry,
    DEFAULT_WRITER_CAPACITY,
};
pub use notes::{AlbumNotes, TrackNotes};
pub use session::{Session, Track, WizardStep};
