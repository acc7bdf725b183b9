//! Album metadata rows
//!
//! One row per track in the label's 84-column layout. The same layout is used
//! by the per-album METADATA.xlsx and by the IMG/IMT sheets of the TOTAL
//! METADATA workbook, which is also where the composer and ISRC directories
//! are rebuilt from.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{AlbumNotes, ComposerDirectory, Session, Track};
use crate::services::shares::{build_writers_and_publishers, Publisher, Writer};
use chrono::NaiveDate;
use relm_common::config::LabelConfig;
use relm_common::human_time::format_minutes_seconds;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Column headers, in sheet order
pub const COLUMNS: [&str; 84] = [
    "LIBRARY: Name",
    "ALBUM: Code",
    "ALBUM: Identity",
    "ALBUM: Title",
    "ALBUM: Display Title",
    "ALBUM: Description",
    "ALBUM: Keywords",
    "ALBUM: Tags",
    "ALBUM: Styles",
    "ALBUM: Release Date",
    "ALBUM: Artwork Filename",
    "TRACK: Title",
    "TRACK: Display Title",
    "TRACK: Alternate Title",
    "TRACK: Description",
    "TRACK: Number",
    "TRACK: Is Main",
    "TRACK: Main Track Number",
    "TRACK: Version",
    "TRACK: Duration",
    "TRACK: BPM",
    "TRACK: Tempo",
    "TRACK: Genre",
    "TRACK: Mixout",
    "TRACK: Instrumentation",
    "TRACK: Keywords",
    "TRACK: Lyrics",
    "TRACK: Identity",
    "TRACK: Category Codes",
    "TRACK: Composer(s)",
    "TRACK: Publisher(s)",
    "TRACK: Artist(s)",
    "TRACK: Audio Filename",
    "ARTIST:1: First Name",
    "ARTIST:1: Middle Name",
    "ARTIST:1: Last Name",
    "ARTIST:1: Society",
    "ARTIST:1: IPI",
    "WRITER:1: First Name",
    "WRITER:1: Middle Name",
    "WRITER:1: Last Name",
    "WRITER:1: Capacity",
    "WRITER:1: Society",
    "WRITER:1: IPI",
    "WRITER:1: Territory",
    "WRITER:1: Owner Performance Share %",
    "WRITER:1: Owner Mechanical Share %",
    "WRITER:1: Original Publisher",
    "WRITER:2: First Name",
    "WRITER:2: Middle Name",
    "WRITER:2: Last Name",
    "WRITER:2: Capacity",
    "WRITER:2: Society",
    "WRITER:2: IPI",
    "WRITER:2: Territory",
    "WRITER:2: Owner Performance Share %",
    "WRITER:2: Owner Mechanical Share %",
    "WRITER:2: Original Publisher",
    "WRITER:3: First Name",
    "WRITER:3: Middle Name",
    "WRITER:3: Last Name",
    "WRITER:3: Capacity",
    "WRITER:3: Society",
    "WRITER:3: IPI",
    "WRITER:3: Territory",
    "WRITER:3: Owner Performance Share %",
    "WRITER:3: Owner Mechanical Share %",
    "WRITER:3: Original Publisher",
    "PUBLISHER:1: Name",
    "PUBLISHER:1: Capacity",
    "PUBLISHER:1: Society",
    "PUBLISHER:1: IPI",
    "PUBLISHER:1: Territory",
    "PUBLISHER:1: Owner Performance Share %",
    "PUBLISHER:1: Owner Mechanical Share %",
    "PUBLISHER:2: Name",
    "PUBLISHER:2: Capacity",
    "PUBLISHER:2: Society",
    "PUBLISHER:2: IPI",
    "PUBLISHER:2: Territory",
    "PUBLISHER:2: Owner Performance Share %",
    "PUBLISHER:2: Owner Mechanical Share %",
    "CODE: ISWC",
    "CODE: ISRC",
];

pub const WRITER_SLOTS: usize = 3;
pub const PUBLISHER_SLOTS: usize = 2;
pub const TERRITORY: &str = "WORLD";
pub const PUBLISHER_CAPACITY: &str = "Original Publisher";

/// Position of a column header
pub fn column_index(name: &str) -> Option<usize> {
    COLUMNS.iter().position(|c| *c == name)
}

/// Tempo bucket for a BPM string; unparsable values count as 0
pub fn tempo_bucket(bpm: &str) -> &'static str {
    let bpm: i64 = bpm.trim().parse().unwrap_or(0);
    match bpm {
        i64::MIN..=70 => "Slow",
        71..=90 => "Downtempo",
        91..=115 => "Midtempo",
        116..=140 => "Uptempo",
        _ => "Fast",
    }
}

/// Sorted, de-duplicated union of every track's comma-separated keywords
pub fn album_keywords(tracks: &[Track]) -> String {
    tracks
        .iter()
        .flat_map(|t| t.manual_keywords.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Album-level values repeated on every row
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumFields {
    pub library: String,
    pub code: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub styles: String,
    pub release_date: NaiveDate,
    pub artwork: String,
}

impl AlbumFields {
    pub fn new(session: &Session, notes: &AlbumNotes, label: &LabelConfig) -> ReleaseResult<Self> {
        let artwork = session
            .cover_file
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self {
            library: label.library_name(&session.album_code).to_string(),
            code: session.album_code.clone(),
            title: session.album_name.clone(),
            description: notes.description.trim().to_string(),
            keywords: album_keywords(&session.tracks),
            styles: notes.styles.trim().to_string(),
            release_date: notes.release_date()?,
            artwork,
        })
    }
}

/// Row builder keyed by column name
struct Row {
    cells: Vec<String>,
}

impl Row {
    fn new() -> Self {
        Self {
            cells: vec![String::new(); COLUMNS.len()],
        }
    }

    fn set(&mut self, column: &str, value: impl Into<String>) {
        if let Some(i) = column_index(column) {
            self.cells[i] = value.into();
        } else {
            tracing::error!(column, "Unknown metadata column");
        }
    }

    fn set_writer(&mut self, slot: usize, writer: &Writer) {
        let p = format!("WRITER:{}", slot);
        let share = writer.share.to_string();
        self.set(&format!("{}: First Name", p), writer.first_name.as_str());
        self.set(&format!("{}: Middle Name", p), writer.middle_name.as_str());
        self.set(&format!("{}: Last Name", p), writer.last_name.as_str());
        self.set(&format!("{}: Capacity", p), writer.capacity.as_str());
        self.set(&format!("{}: Society", p), writer.society.as_str());
        self.set(&format!("{}: IPI", p), writer.ipi.as_str());
        self.set(&format!("{}: Territory", p), TERRITORY);
        self.set(&format!("{}: Owner Performance Share %", p), share.as_str());
        self.set(&format!("{}: Owner Mechanical Share %", p), share.as_str());
        self.set(&format!("{}: Original Publisher", p), writer.publisher_name.as_str());
    }

    fn set_publisher(&mut self, slot: usize, publisher: &Publisher) {
        let p = format!("PUBLISHER:{}", slot);
        let share = publisher.share.to_string();
        self.set(&format!("{}: Name", p), publisher.name.as_str());
        self.set(&format!("{}: Capacity", p), PUBLISHER_CAPACITY);
        self.set(&format!("{}: Society", p), publisher.society.as_str());
        self.set(&format!("{}: IPI", p), publisher.ipi.as_str());
        self.set(&format!("{}: Territory", p), TERRITORY);
        self.set(&format!("{}: Owner Performance Share %", p), share.as_str());
        self.set(&format!("{}: Owner Mechanical Share %", p), share.as_str());
    }
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Metadata row of one track (`position` is 0-based)
pub fn build_track_row(
    album: &AlbumFields,
    track: &Track,
    position: usize,
    directory: &ComposerDirectory,
    genre: &str,
) -> Vec<String> {
    let (writers, publishers) = build_writers_and_publishers(&track.matched_composers, directory);
    let composers = writers
        .iter()
        .map(Writer::full_name)
        .collect::<Vec<_>>()
        .join(" and ");
    let publisher_names = writers
        .iter()
        .map(|w| w.publisher_name.as_str())
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" and ");

    let mut row = Row::new();
    row.set("LIBRARY: Name", album.library.as_str());
    row.set("ALBUM: Code", album.code.as_str());
    row.set("ALBUM: Title", album.title.as_str());
    row.set("ALBUM: Display Title", format!("{} {}", album.code, album.title));
    row.set("ALBUM: Description", album.description.as_str());
    row.set("ALBUM: Keywords", album.keywords.as_str());
    row.set("ALBUM: Styles", album.styles.as_str());
    row.set("ALBUM: Release Date", album.release_date.format("%Y-%m-%d").to_string());
    row.set("ALBUM: Artwork Filename", album.artwork.as_str());

    row.set("TRACK: Title", track.track_name.as_str());
    row.set("TRACK: Display Title", track.track_name.as_str());
    row.set("TRACK: Description", track.manual_description.as_str());
    row.set("TRACK: Number", (position + 1).to_string());
    row.set("TRACK: Is Main", "Y");
    row.set("TRACK: Version", "Main");
    row.set("TRACK: Duration", format_minutes_seconds(track.duration.unwrap_or(0.0)));
    row.set("TRACK: BPM", track.track_bpm.as_str());
    row.set("TRACK: Tempo", tempo_bucket(&track.track_bpm));
    row.set("TRACK: Genre", genre);
    row.set("TRACK: Instrumentation", track.manual_instrumentation.as_str());
    row.set("TRACK: Keywords", track.manual_keywords.as_str());
    row.set("TRACK: Identity", track.track_name.as_str());
    row.set("TRACK: Composer(s)", composers.as_str());
    row.set("TRACK: Publisher(s)", publisher_names);
    row.set("TRACK: Artist(s)", composers);
    row.set("TRACK: Audio Filename", file_stem(&track.mastered_file));

    for (i, writer) in writers.iter().take(WRITER_SLOTS).enumerate() {
        row.set_writer(i + 1, writer);
    }
    for (i, publisher) in publishers.iter().take(PUBLISHER_SLOTS).enumerate() {
        row.set_publisher(i + 1, publisher);
    }
    if writers.len() > WRITER_SLOTS {
        tracing::warn!(
            track = %track.key(),
            writers = writers.len(),
            "Only the first {} writers fit the sheet",
            WRITER_SLOTS
        );
    }

    row.set("CODE: ISRC", track.isrc.clone().unwrap_or_default());
    row.cells
}

/// Rows for every track of the session
pub fn build_rows(
    session: &Session,
    album: &AlbumFields,
    directory: &ComposerDirectory,
    genre: &str,
) -> Vec<Vec<String>> {
    session
        .tracks
        .iter()
        .enumerate()
        .map(|(i, track)| build_track_row(album, track, i, directory, genre))
        .collect()
}

/// `<metadata>/<CODE> <NAME> METADATA.xlsx`, upper-cased
pub fn metadata_file_path(metadata_dir: &Path, session: &Session) -> PathBuf {
    metadata_dir.join(format!(
        "{} {} METADATA.xlsx",
        session.album_code.to_uppercase(),
        session.album_name.to_uppercase()
    ))
}

/// Fail when any track still lacks matched composers
pub fn ensure_composers_matched(session: &Session) -> ReleaseResult<()> {
    let missing: Vec<String> = session
        .tracks
        .iter()
        .filter(|t| t.matched_composers.is_empty())
        .map(Track::key)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReleaseError::BadRequest(format!(
            "no matched composers for: {} (run `relm composers match`)",
            missing.join(", ")
        )))
    }
}
