//! Release services, one module per concern
//!
//! Services are plain functions over the session and the directories; the
//! wizard in `crate::workflow` sequences them and persists the results.

pub mod album_scanner;
pub mod composer_matcher;
pub mod cover_finder;
pub mod directory_import;
pub mod encoder;
pub mod harvest;
pub mod isrc_allocator;
pub mod metadata_builder;
pub mod shares;
pub mod social_media;
pub mod spreadsheet;
pub mod stem_processor;
pub mod total_sync;

pub use album_scanner::{ScanError, ScannedAlbum};
pub use composer_matcher::UnresolvedName;
pub use encoder::{AudioEncoder, EncodeTarget, EncoderError, FfmpegEncoder};
pub use spreadsheet::{Sheet, SpreadsheetError};
