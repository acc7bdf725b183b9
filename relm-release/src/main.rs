//! relm - album release wizard
//!
//! Walks one album from the pending folder to a published release:
//! structure, stems, composers, cover, metadata, TOTAL METADATA sync,
//! Harvest delivery and social media texts. Each step is a subcommand; the
//! album in progress lives in `<root>/session.json`.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relm_common::config::{self, LoggingConfig, RootFolderResolver};
use relm_release::models::ComposerEntry;
use relm_release::services::composer_matcher::AddOutcome;
use relm_release::services::FfmpegEncoder;
use relm_release::workflow::steps::{self, SocialArgs};
use relm_release::workflow::{checklist, Wizard};
use relm_release::AppContext;

/// Command-line arguments for relm
#[derive(Parser, Debug)]
#[command(name = "relm")]
#[command(about = "Album release wizard for the label's music library")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root folder holding the session and the _DATABASES stores
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Run a step even if the previous one is not completed
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List albums waiting in the pending folder
    Albums,
    /// Step 1: scan a pending album and create its library folders
    Scan {
        /// Album folder name inside the pending folder
        album: String,
        /// Replace existing album folders
        #[arg(long)]
        overwrite: bool,
    },
    /// Step 2: stems
    #[command(subcommand)]
    Stems(StemsCommand),
    /// Step 3: composer matching and directory maintenance
    #[command(subcommand)]
    Composers(ComposersCommand),
    /// Step 4: copy the cover into the album folder
    Cover,
    /// Step 5: write the album metadata workbook
    Metadata(MetadataArgs),
    /// Append the album metadata to TOTAL METADATA
    SyncTotal,
    /// Step 6: build the Harvest delivery folder
    Harvest {
        #[arg(long)]
        overwrite: bool,
    },
    /// Step 7: social media texts
    Social(SocialCliArgs),
    /// Show the album in progress and what comes next
    Status,
    /// Rebuild the JSON directories from TOTAL METADATA
    #[command(subcommand)]
    Db(DbCommand),
    /// Configuration file
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
enum StemsCommand {
    /// Find, convert and rename the stems of every track
    Run,
    /// List the stems of every track
    List,
    /// Rename a stem on disk and in the session
    Rename {
        #[arg(long)]
        track: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Delete a stem
    Remove {
        #[arg(long)]
        track: String,
        #[arg(long)]
        stem: String,
    },
}

#[derive(Subcommand, Debug)]
enum ComposersCommand {
    /// Match raw composer names against the directory
    Match {
        /// Manual mapping "Raw Name=Directory Key" (repeatable)
        #[arg(long = "assign", value_name = "NAME=KEY")]
        assign: Vec<String>,
    },
    /// List the composer directory
    List,
    /// Add a composer to the directory
    Add {
        #[arg(long, default_value = "")]
        first: String,
        #[arg(long, default_value = "")]
        middle: String,
        #[arg(long, default_value = "")]
        last: String,
        #[arg(long, default_value = "")]
        society: String,
        #[arg(long, default_value = "")]
        ipi: String,
        /// Publisher key in the directory
        #[arg(long, default_value = "")]
        publisher: String,
        /// Writer capacity (default "Composer/Author")
        #[arg(long)]
        capacity: Option<String>,
    },
    /// Remove a composer by key
    Remove { key: String },
}

#[derive(ClapArgs, Debug)]
struct MetadataArgs {
    /// Write a notes template for this album and exit
    #[arg(long, value_name = "FILE", conflicts_with = "notes")]
    template: Option<PathBuf>,
    /// Album notes (release date, descriptions, styles, keywords)
    #[arg(long, value_name = "FILE")]
    notes: Option<PathBuf>,
    /// Replace an existing metadata workbook or template
    #[arg(long)]
    overwrite: bool,
}

#[derive(ClapArgs, Debug)]
struct SocialCliArgs {
    /// Public DISCO link of the album
    #[arg(long)]
    disco: String,
    /// YouTube preview link
    #[arg(long)]
    youtube: String,
    /// English description (defaults to the album description)
    #[arg(long)]
    description_en: Option<String>,
    /// Russian description
    #[arg(long)]
    description_ru: Option<String>,
    /// Also write the posts to this file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Rebuild composer_database.json
    ImportComposers {
        #[arg(long)]
        overwrite: bool,
    },
    /// Rebuild isrc_database.json
    ImportIsrc {
        #[arg(long)]
        overwrite: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Target file (defaults to the user configuration path)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    match &logging.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&loaded.config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "relm starting"
    );
    match &loaded.source {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No configuration file found, using defaults"),
    }

    let root = RootFolderResolver::new(args.root.clone(), loaded.config.root_folder.clone()).resolve();
    info!("Root folder: {}", root.display());
    let ctx = AppContext::new(loaded.config, loaded.source, root);
    let wizard = Wizard::new(&ctx, args.force);

    run(&ctx, &wizard, args.command)
}

fn run(ctx: &AppContext, wizard: &Wizard, command: Command) -> Result<()> {
    let encoder = FfmpegEncoder::new(ctx.config.encoder.ffmpeg.clone());

    match command {
        Command::Albums => {
            let albums = steps::list_albums(ctx).context("Failed to list pending albums")?;
            if albums.is_empty() {
                println!("No albums in the pending folder");
            }
            for album in albums {
                println!("{}", album);
            }
            print_checklist(relm_release::models::WizardStep::Structure);
        }
        Command::Scan { album, overwrite } => {
            let session = steps::scan(ctx, &album, overwrite)
                .with_context(|| format!("Failed to scan album '{}'", album))?;
            println!("Created {} with {} tracks", session.album_title(), session.tracks.len());
            for track in &session.tracks {
                println!(
                    "  {} {} ({}, {} BPM)",
                    track.track_number,
                    track.track_name,
                    track.composers.join(" and "),
                    track.track_bpm
                );
            }
        }
        Command::Stems(cmd) => run_stems(wizard, &encoder, cmd)?,
        Command::Composers(cmd) => run_composers(ctx, wizard, cmd)?,
        Command::Cover => {
            let cover = steps::add_cover(wizard).context("Cover step failed")?;
            println!("Cover copied to {}", cover.display());
        }
        Command::Metadata(metadata) => run_metadata(wizard, metadata)?,
        Command::SyncTotal => {
            let report = steps::sync_total(wizard).context("TOTAL METADATA sync failed")?;
            println!(
                "Appended {} rows to sheet {} starting at row {} (backup: {})",
                report.rows_appended,
                report.sheet,
                report.first_row + 1,
                report.backup.display()
            );
        }
        Command::Harvest { overwrite } => {
            let report = steps::prepare_harvest(wizard, &encoder, overwrite)
                .context("Harvest step failed")?;
            println!(
                "Harvest folder {}: {} converted, {} copied{}",
                report.folder.display(),
                report.converted.len(),
                report.copied.len(),
                if report.metadata_copied { ", metadata included" } else { "" }
            );
        }
        Command::Social(social) => {
            let document = steps::social_posts(
                wizard,
                &SocialArgs {
                    disco_link: social.disco,
                    youtube_link: social.youtube,
                    description_en: social.description_en,
                    description_ru: social.description_ru,
                    output: social.output,
                },
            )
            .context("Social media step failed")?;
            println!("{}", document);
            print_checklist(relm_release::models::WizardStep::Finished);
        }
        Command::Status => {
            println!("{}", steps::status_report(wizard)?);
        }
        Command::Db(DbCommand::ImportComposers { overwrite }) => {
            let (composers, publishers) =
                steps::import_composers(ctx, overwrite).context("Composer import failed")?;
            println!("Imported {} composers and {} publishers", composers, publishers);
        }
        Command::Db(DbCommand::ImportIsrc { overwrite }) => {
            let count = steps::import_isrc(ctx, overwrite).context("ISRC import failed")?;
            println!("Imported {} ISRC codes", count);
        }
        Command::Settings(SettingsCommand::Show) => {
            match &ctx.config_source {
                Some(path) => println!("# {}", path.display()),
                None => println!("# defaults (no configuration file)"),
            }
            println!("# root folder: {}", ctx.root.root().display());
            print!("{}", toml::to_string_pretty(&ctx.config)?);
        }
        Command::Settings(SettingsCommand::Init { path, overwrite }) => {
            let Some(target) = path.or_else(config::default_config_path) else {
                bail!("Could not determine a configuration directory, pass --path");
            };
            if target.exists() && !overwrite {
                bail!("{} already exists (use --overwrite to replace it)", target.display());
            }
            config::write_toml_config(&ctx.config, &target)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            println!("Configuration written to {}", target.display());
        }
    }
    Ok(())
}

fn run_stems(wizard: &Wizard, encoder: &FfmpegEncoder, cmd: StemsCommand) -> Result<()> {
    match cmd {
        StemsCommand::Run => {
            let report = steps::run_stems(wizard, encoder).context("Stem processing failed")?;
            println!("Converted {} stems", report.converted);
            for failed in &report.failed {
                println!("  failed: {}", failed.display());
            }
        }
        StemsCommand::List => {
            let session = wizard.load()?;
            for track in &session.tracks {
                println!("{} {}", track.track_number, track.track_name);
                for stem in &track.stems {
                    println!("    {}", stem);
                }
            }
        }
        StemsCommand::Rename { track, from, to } => {
            let name = steps::rename_stem(wizard, &track, &from, &to)?;
            println!("Renamed to {}", name);
        }
        StemsCommand::Remove { track, stem } => {
            let name = steps::remove_stem(wizard, &track, &stem)?;
            println!("Removed {}", name);
        }
    }
    Ok(())
}

fn run_composers(ctx: &AppContext, wizard: &Wizard, cmd: ComposersCommand) -> Result<()> {
    match cmd {
        ComposersCommand::Match { assign } => {
            let session = steps::match_composers(wizard, &assign)?;
            for track in &session.tracks {
                println!(
                    "{} {}: {}",
                    track.track_number,
                    track.track_name,
                    track.matched_composers.join(", ")
                );
            }
        }
        ComposersCommand::List => {
            for (key, society, publisher) in steps::list_composers(ctx)? {
                println!("{}\t{}\t{}", key, society, publisher);
            }
        }
        ComposersCommand::Add {
            first,
            middle,
            last,
            society,
            ipi,
            publisher,
            capacity,
        } => {
            let entry = ComposerEntry {
                first_name: first,
                middle_name: middle,
                last_name: last,
                society,
                ipi,
                publisher_key: publisher,
                capacity,
            };
            match steps::add_composer(ctx, entry)? {
                AddOutcome::Added(key) => println!("Added {}", key),
                AddOutcome::AlreadyExists(key) => println!("{} already exists, left unchanged", key),
            }
        }
        ComposersCommand::Remove { key } => {
            steps::remove_composer(ctx, &key)?;
            println!("Removed {}", key);
        }
    }
    Ok(())
}

fn run_metadata(wizard: &Wizard, args: MetadataArgs) -> Result<()> {
    if let Some(template) = args.template {
        steps::write_notes_template(wizard, &template, args.overwrite)?;
        println!("Notes template written to {}", template.display());
        print_checklist(relm_release::models::WizardStep::Metadata);
        return Ok(());
    }
    let Some(notes) = args.notes else {
        bail!("Pass --notes FILE (create one with --template FILE)");
    };
    let report = steps::generate_metadata(wizard, &notes, args.overwrite)
        .context("Metadata step failed")?;
    println!("Metadata written to {}", report.path.display());
    if !report.new_isrcs.is_empty() {
        println!("New ISRC codes: {}", report.new_isrcs.join(", "));
    }
    Ok(())
}

fn print_checklist(step: relm_release::models::WizardStep) {
    if let Some(items) = checklist::before_step(step) {
        println!();
        println!("Checklist:");
        println!("{}", checklist::render(items));
    }
}
