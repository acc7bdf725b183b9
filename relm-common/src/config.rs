//! Configuration loading and root folder resolution
//!
//! Two things are resolved at startup:
//! - the TOML configuration file (library folders, label naming, ISRC range,
//!   encoder binary, logging), and
//! - the root folder holding `_DATABASES/` and the current `session.json`.
//!
//! Both follow the same priority order: command-line argument, environment
//! variable, then the platform default location.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV_VAR: &str = "RELM_CONFIG";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "RELM_ROOT_FOLDER";

/// Folder under the root folder holding the JSON directories
pub const DATABASES_FOLDER: &str = "_DATABASES";
pub const COMPOSER_DB_FILENAME: &str = "composer_database.json";
pub const ISRC_DB_FILENAME: &str = "isrc_database.json";
pub const SESSION_FILENAME: &str = "session.json";

/// Default file name of the label-wide metadata workbook
pub const TOTAL_METADATA_FILENAME: &str = "_IMAGINE MUSIC TOTAL METADATA.xlsx";

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for databases and the session file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub folders: FoldersConfig,

    #[serde(default)]
    pub label: LabelConfig,

    #[serde(default)]
    pub isrc: IsrcConfig,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Working folders of the label's file server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoldersConfig {
    /// Albums waiting to be released (one sub-folder per album)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_aiff: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_mp3: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covers: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harvest: Option<PathBuf>,
    /// TOTAL METADATA workbook; defaults to a file inside `metadata`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_metadata: Option<PathBuf>,
}

/// Named library folder, used for error messages and lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryFolder {
    Pending,
    AllAiff,
    AllMp3,
    Covers,
    Metadata,
    Harvest,
}

impl fmt::Display for LibraryFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            LibraryFolder::Pending => "pending",
            LibraryFolder::AllAiff => "all_aiff",
            LibraryFolder::AllMp3 => "all_mp3",
            LibraryFolder::Covers => "covers",
            LibraryFolder::Metadata => "metadata",
            LibraryFolder::Harvest => "harvest",
        };
        f.write_str(key)
    }
}

impl FoldersConfig {
    /// Configured path of a folder, or a configuration error naming the key
    pub fn get(&self, folder: LibraryFolder) -> Result<&Path> {
        let value = match folder {
            LibraryFolder::Pending => &self.pending,
            LibraryFolder::AllAiff => &self.all_aiff,
            LibraryFolder::AllMp3 => &self.all_mp3,
            LibraryFolder::Covers => &self.covers,
            LibraryFolder::Metadata => &self.metadata,
            LibraryFolder::Harvest => &self.harvest,
        };
        value.as_deref().ok_or_else(|| {
            Error::Config(format!("folders.{} is not configured", folder))
        })
    }

    /// Configured folder that must also exist on disk
    pub fn existing_dir(&self, folder: LibraryFolder) -> Result<&Path> {
        let path = self.get(folder)?;
        if !path.is_dir() {
            return Err(Error::NotFound(format!(
                "folders.{} does not exist: {}",
                folder,
                path.display()
            )));
        }
        Ok(path)
    }

    /// Path of the TOTAL METADATA workbook
    pub fn total_metadata_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.total_metadata {
            return Ok(path.clone());
        }
        Ok(self
            .get(LibraryFolder::Metadata)?
            .join(TOTAL_METADATA_FILENAME))
    }
}

/// Label naming conventions used when synthesizing metadata rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Library name for main catalogue albums
    pub name: String,
    /// Library name for albums coded with `tools_prefix`
    pub tools_name: String,
    /// Album code prefix of the main catalogue (also its TOTAL METADATA sheet)
    pub main_prefix: String,
    /// Album code prefix of the tools catalogue (also its TOTAL METADATA sheet)
    pub tools_prefix: String,
    /// Genre written on every track row
    pub genre: String,
    pub instagram_tags: String,
    pub linkedin_tags: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            name: "Imagine Music".to_string(),
            tools_name: "Imagine Music Tools".to_string(),
            main_prefix: "IMG".to_string(),
            tools_prefix: "IMT".to_string(),
            genre: "Trailer".to_string(),
            instagram_tags: "#imaginemusic".to_string(),
            linkedin_tags: "#imaginemusic #trailermusic".to_string(),
        }
    }
}

impl LabelConfig {
    fn is_tools(&self, album_code: &str) -> bool {
        !self.tools_prefix.is_empty() && album_code.starts_with(&self.tools_prefix)
    }

    /// Library name for an album code
    pub fn library_name(&self, album_code: &str) -> &str {
        if self.is_tools(album_code) {
            &self.tools_name
        } else {
            &self.name
        }
    }

    /// TOTAL METADATA sheet receiving rows for an album code
    pub fn total_sheet(&self, album_code: &str) -> &str {
        if self.is_tools(album_code) {
            &self.tools_prefix
        } else {
            &self.main_prefix
        }
    }
}

/// ISRC range allocated to the label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsrcConfig {
    /// Everything before the 5-digit designation code
    pub prefix: String,
    /// Code treated as "last allocated" when the ISRC directory is empty
    pub seed: String,
}

impl Default for IsrcConfig {
    fn default() -> Self {
        Self {
            prefix: "RU-AD4-20-".to_string(),
            seed: "RU-AD4-20-01000".to_string(),
        }
    }
}

/// External encoder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub ffmpeg: PathBuf,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,
    /// Append logs to this file instead of stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Loaded configuration plus the file it came from (if any)
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: Option<PathBuf>,
}

/// Resolve the configuration file path
///
/// Priority: command-line argument, `RELM_CONFIG`, `<config dir>/relm/config.toml`.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    default_config_path()
}

/// Platform default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("relm").join("config.toml"))
}

/// Load the configuration file
///
/// A missing file at the default location is not fatal: a warning is logged
/// and defaults are used. A file named explicitly (flag or env) must exist.
/// A file that exists but does not parse is always an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    let explicit = cli_arg.is_some() || std::env::var_os(CONFIG_ENV_VAR).is_some();
    let Some(path) = resolve_config_path(cli_arg) else {
        warn!("Could not determine a configuration directory, using defaults");
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: None,
        });
    };

    if !path.exists() {
        if explicit {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        warn!(
            "No config file at {}, using defaults (run `relm settings init` to create one)",
            path.display()
        );
        return Ok(LoadedConfig {
            config: TomlConfig::default(),
            source: None,
        });
    }

    let config = read_toml_config(&path)?;
    info!("Configuration loaded from {}", path.display());
    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}

/// Parse a TOML configuration file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Write a TOML configuration file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, target: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = target.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, target) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Root folder resolution
///
/// Priority order:
/// 1. Command-line argument
/// 2. `RELM_ROOT_FOLDER` environment variable
/// 3. `root_folder` in the TOML config
/// 4. OS-dependent default (`<local data dir>/relm`)
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_root: Option<PathBuf>) -> Self {
        Self { cli_arg, toml_root }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        if let Some(path) = &self.toml_root {
            return path.clone();
        }
        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("relm"))
        .unwrap_or_else(|| PathBuf::from("./relm_data"))
}

/// Creates the root folder layout and hands out the well-known file paths
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create `<root>/_DATABASES` if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        let databases = self.databases_dir();
        if !databases.exists() {
            std::fs::create_dir_all(&databases)?;
            info!("Created root folder layout at {}", self.root.display());
        }
        Ok(())
    }

    pub fn databases_dir(&self) -> PathBuf {
        self.root.join(DATABASES_FOLDER)
    }

    pub fn composer_db_path(&self) -> PathBuf {
        self.databases_dir().join(COMPOSER_DB_FILENAME)
    }

    pub fn isrc_db_path(&self) -> PathBuf {
        self.databases_dir().join(ISRC_DB_FILENAME)
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILENAME)
    }
}
