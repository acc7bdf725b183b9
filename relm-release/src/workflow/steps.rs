//! Wizard steps
//!
//! One function per CLI command. Each resolves folders from the
//! configuration, loads what it needs, calls the services and persists the
//! result. Nothing is written when a step fails part-way through its checks.

use crate::db::{composers, isrc};
use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{AlbumNotes, ComposerEntry, Session, WizardStep};
use crate::services::composer_matcher::{self, AddOutcome};
use crate::services::encoder::AudioEncoder;
use crate::services::harvest::{self, HarvestReport};
use crate::services::isrc_allocator::{assign_session_isrcs, IsrcAllocator};
use crate::services::metadata_builder::{self, AlbumFields, COLUMNS};
use crate::services::social_media::{self, SocialInputs};
use crate::services::stem_processor::{self, StemReport};
use crate::services::total_sync::{self, SyncReport};
use crate::services::{album_scanner, cover_finder, directory_import, spreadsheet, ScanError};
use crate::workflow::{checklist, Wizard};
use crate::AppContext;
use relm_common::config::LibraryFolder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Albums waiting in the pending folder
pub fn list_albums(ctx: &AppContext) -> ReleaseResult<Vec<String>> {
    let pending = ctx.config.folders.existing_dir(LibraryFolder::Pending)?;
    Ok(album_scanner::list_albums(pending)?)
}

/// Step 1: scan a pending album and create its library folders
///
/// Starts a new session; any previous session is replaced.
pub fn scan(ctx: &AppContext, album: &str, overwrite: bool) -> ReleaseResult<Session> {
    let folders = &ctx.config.folders;
    let album_dir = folders.existing_dir(LibraryFolder::Pending)?.join(album);
    if !album_dir.is_dir() {
        return Err(ScanError::PathNotFound(album_dir).into());
    }
    let all_aiff = folders.existing_dir(LibraryFolder::AllAiff)?;
    let all_mp3 = folders.existing_dir(LibraryFolder::AllMp3)?;

    let scanned = album_scanner::scan_album(&album_dir)?;
    let session = album_scanner::create_album_structure(scanned, all_aiff, all_mp3, overwrite)?;

    ctx.initialize()?;
    crate::db::sessions::save_session(&ctx.session_path(), &session)?;
    tracing::info!(
        album = %session.album_code,
        tracks = session.tracks.len(),
        "New session started"
    );
    Ok(session)
}

/// Step 2: find and convert stems
pub fn run_stems(wizard: &Wizard, encoder: &dyn AudioEncoder) -> ReleaseResult<StemReport> {
    let mut session = wizard.begin(WizardStep::Stems)?;
    let report = stem_processor::process_stems(&mut session, encoder)?;
    wizard.complete(&mut session, WizardStep::Stems)?;
    Ok(report)
}

pub fn rename_stem(wizard: &Wizard, track: &str, from: &str, to: &str) -> ReleaseResult<String> {
    let mut session = wizard.load()?;
    let name = stem_processor::rename_stem(&mut session, track, from, to)?;
    wizard.save(&session)?;
    Ok(name)
}

pub fn remove_stem(wizard: &Wizard, track: &str, stem: &str) -> ReleaseResult<String> {
    let mut session = wizard.load()?;
    let name = stem_processor::remove_stem(&mut session, track, stem)?;
    wizard.save(&session)?;
    Ok(name)
}

/// Step 3: resolve composer names against the directory
pub fn match_composers(wizard: &Wizard, assignments: &[String]) -> ReleaseResult<Session> {
    let assignments: HashMap<String, String> = composer_matcher::parse_assignments(assignments)?;
    let mut session = wizard.begin(WizardStep::Composers)?;
    let directory = composers::load_directory(&wizard.context().composer_db_path())?;
    composer_matcher::match_session(&mut session, &directory, &assignments)?;
    wizard.complete(&mut session, WizardStep::Composers)?;
    Ok(session)
}

pub fn list_composers(ctx: &AppContext) -> ReleaseResult<Vec<(String, String, String)>> {
    let directory = composers::load_directory(&ctx.composer_db_path())?;
    Ok(composer_matcher::list_composers(&directory))
}

pub fn add_composer(ctx: &AppContext, entry: ComposerEntry) -> ReleaseResult<AddOutcome> {
    let path = ctx.composer_db_path();
    let mut directory = composers::load_directory(&path)?;
    let outcome = composer_matcher::add_composer(&mut directory, entry)?;
    if let AddOutcome::Added(_) = outcome {
        composers::save_directory(&path, &directory)?;
    }
    Ok(outcome)
}

pub fn remove_composer(ctx: &AppContext, key: &str) -> ReleaseResult<ComposerEntry> {
    let path = ctx.composer_db_path();
    let mut directory = composers::load_directory(&path)?;
    let entry = composer_matcher::remove_composer(&mut directory, key)?;
    composers::save_directory(&path, &directory)?;
    Ok(entry)
}

/// Step 4: copy the designer's cover into the album folder
pub fn add_cover(wizard: &Wizard) -> ReleaseResult<PathBuf> {
    let covers = wizard
        .context()
        .config
        .folders
        .existing_dir(LibraryFolder::Covers)?
        .to_path_buf();
    let mut session = wizard.begin(WizardStep::Cover)?;
    let target = cover_finder::add_cover(&mut session, &covers)?;
    wizard.complete(&mut session, WizardStep::Cover)?;
    Ok(target)
}

/// Write a notes file prefilled from the session
pub fn write_notes_template(wizard: &Wizard, path: &Path, overwrite: bool) -> ReleaseResult<()> {
    if path.exists() && !overwrite {
        return Err(ReleaseError::Conflict(format!(
            "notes file already exists: {} (use --overwrite to replace it)",
            path.display()
        )));
    }
    let session = wizard.load()?;
    AlbumNotes::template(&session).write(path)?;
    tracing::info!(path = %path.display(), "Notes template written");
    Ok(())
}

/// Outcome of the metadata step
#[derive(Debug, Clone)]
pub struct MetadataReport {
    pub path: PathBuf,
    /// Codes allocated in this run
    pub new_isrcs: Vec<String>,
}

/// Step 5: allocate ISRCs and write the album metadata workbook
///
/// The ISRC directory is only updated after the workbook is saved, so a
/// failed write never burns codes.
pub fn generate_metadata(
    wizard: &Wizard,
    notes_path: &Path,
    overwrite: bool,
) -> ReleaseResult<MetadataReport> {
    let ctx = wizard.context();
    let metadata_dir = ctx
        .config
        .folders
        .existing_dir(LibraryFolder::Metadata)?
        .to_path_buf();
    let mut session = wizard.begin(WizardStep::Metadata)?;
    metadata_builder::ensure_composers_matched(&session)?;

    let notes = AlbumNotes::read(notes_path)?;
    notes.apply_to(&mut session)?;

    let output = metadata_builder::metadata_file_path(&metadata_dir, &session);
    if output.exists() && !overwrite {
        return Err(ReleaseError::Conflict(format!(
            "metadata file already exists: {} (use --overwrite to replace it)",
            output.display()
        )));
    }

    let directory = composers::load_directory(&ctx.composer_db_path())?;
    let isrc_path = ctx.isrc_db_path();
    let mut isrc_directory = isrc::load_isrc_directory(&isrc_path)?;
    let mut allocator = IsrcAllocator::new(&ctx.config.isrc, &isrc_directory)?;
    let assigned = assign_session_isrcs(&mut session, &mut allocator)?;

    let album = AlbumFields::new(&session, &notes, &ctx.config.label)?;
    let rows = metadata_builder::build_rows(&session, &album, &directory, &ctx.config.label.genre);
    spreadsheet::write_xlsx(&output, &session.album_code, &COLUMNS, &rows)?;
    tracing::info!(path = %output.display(), rows = rows.len(), "Album metadata written");

    let new_isrcs: Vec<String> = assigned.iter().map(|(code, _)| code.clone()).collect();
    if !assigned.is_empty() {
        isrc_directory.extend(assigned);
        isrc::save_isrc_directory(&isrc_path, &isrc_directory)?;
        tracing::info!(count = new_isrcs.len(), last = %allocator.last_code(), "ISRC codes recorded");
    }

    wizard.complete(&mut session, WizardStep::Metadata)?;
    Ok(MetadataReport {
        path: output,
        new_isrcs,
    })
}

fn metadata_path(ctx: &AppContext, session: &Session) -> ReleaseResult<PathBuf> {
    let metadata_dir = ctx.config.folders.get(LibraryFolder::Metadata)?;
    Ok(metadata_builder::metadata_file_path(metadata_dir, session))
}

/// Step 5b: append the album rows to TOTAL METADATA
pub fn sync_total(wizard: &Wizard) -> ReleaseResult<SyncReport> {
    let ctx = wizard.context();
    let total = ctx.config.folders.total_metadata_path()?;
    let mut session = wizard.begin(WizardStep::TotalSync)?;
    let album_metadata = metadata_path(ctx, &session)?;
    let report = total_sync::sync_total(&album_metadata, &total, &session.album_code, &ctx.config.label)?;
    wizard.complete(&mut session, WizardStep::TotalSync)?;
    Ok(report)
}

/// Step 6: assemble the Harvest delivery folder
pub fn prepare_harvest(
    wizard: &Wizard,
    encoder: &dyn AudioEncoder,
    overwrite: bool,
) -> ReleaseResult<HarvestReport> {
    let ctx = wizard.context();
    let harvest_root = ctx
        .config
        .folders
        .existing_dir(LibraryFolder::Harvest)?
        .to_path_buf();
    let mut session = wizard.begin(WizardStep::Harvest)?;
    let album_metadata = metadata_path(ctx, &session)?;
    let report = harvest::prepare_harvest(&session, &harvest_root, &album_metadata, encoder, overwrite)?;
    wizard.complete(&mut session, WizardStep::Harvest)?;
    Ok(report)
}

/// Social step arguments as typed on the command line
#[derive(Debug, Clone, Default)]
pub struct SocialArgs {
    pub disco_link: String,
    pub youtube_link: String,
    pub description_en: Option<String>,
    pub description_ru: Option<String>,
    pub output: Option<PathBuf>,
}

/// Step 7: produce the social media texts and finish the release
pub fn social_posts(wizard: &Wizard, args: &SocialArgs) -> ReleaseResult<String> {
    let ctx = wizard.context();
    let mut session = wizard.begin(WizardStep::Social)?;
    let inputs = SocialInputs::new(
        &session,
        &args.disco_link,
        &args.youtube_link,
        args.description_en.clone(),
        args.description_ru.clone(),
    )?;
    let posts = social_media::build_posts(&session, &inputs, &ctx.config.label);
    let document = social_media::render_document(&posts);

    if let Some(path) = &args.output {
        std::fs::write(path, &document)?;
        tracing::info!(path = %path.display(), "Social media posts written");
    }

    session.mark_completed(WizardStep::Social);
    wizard.complete(&mut session, WizardStep::Finished)?;
    Ok(document)
}

/// Human-readable summary of the current session
pub fn status_report(wizard: &Wizard) -> ReleaseResult<String> {
    let session = wizard.load()?;
    let mut lines = vec![
        format!("Album: {}", session.album_title()),
        format!("Tracks: {}", session.tracks.len()),
    ];
    for track in &session.tracks {
        let composers = if track.matched_composers.is_empty() {
            track.composers.join(", ")
        } else {
            track.matched_composers.join(", ")
        };
        lines.push(format!(
            "  {} {} [{} BPM] {} stems, composers: {}{}",
            track.track_number,
            track.track_name,
            track.track_bpm,
            track.stems.len(),
            composers,
            track
                .isrc
                .as_deref()
                .map(|i| format!(", ISRC {}", i))
                .unwrap_or_default()
        ));
    }

    let done: Vec<String> = WizardStep::ALL
        .iter()
        .filter(|s| session.is_completed(**s))
        .map(|s| s.to_string())
        .collect();
    lines.push(format!("Completed: {}", done.join(", ")));

    match session.next_step() {
        Some(next) => {
            lines.push(format!("Next: {} ({})", next, next.command()));
            if let Some(items) = checklist::before_step(next) {
                lines.push(String::new());
                lines.push("Before you continue:".to_string());
                lines.push(checklist::render(items));
            }
        }
        None => lines.push("Release finished".to_string()),
    }
    Ok(lines.join("\n"))
}

fn check_store_free(path: &Path, overwrite: bool) -> ReleaseResult<()> {
    if path.exists() && !overwrite {
        return Err(ReleaseError::Conflict(format!(
            "{} already exists (use --overwrite to rebuild it)",
            path.display()
        )));
    }
    Ok(())
}

/// Rebuild the composer directory from TOTAL METADATA; returns (composers, publishers)
pub fn import_composers(ctx: &AppContext, overwrite: bool) -> ReleaseResult<(usize, usize)> {
    let path = ctx.composer_db_path();
    check_store_free(&path, overwrite)?;
    let total = ctx.config.folders.total_metadata_path()?;
    let sheets = spreadsheet::read_workbook(&total)?;
    let directory = directory_import::import_composers(&sheets);
    ctx.initialize()?;
    composers::save_directory(&path, &directory)?;
    Ok((directory.composers.len(), directory.publishers.len()))
}

/// Rebuild the ISRC directory from TOTAL METADATA; returns the code count
pub fn import_isrc(ctx: &AppContext, overwrite: bool) -> ReleaseResult<usize> {
    let path = ctx.isrc_db_path();
    check_store_free(&path, overwrite)?;
    let total = ctx.config.folders.total_metadata_path()?;
    let sheets = spreadsheet::read_workbook(&total)?;
    let directory = directory_import::import_isrc(&sheets);
    ctx.initialize()?;
    isrc::save_isrc_directory(&path, &directory)?;
    Ok(directory.len())
}
