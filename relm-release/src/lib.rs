//! relm-release library interface
//!
//! The `relm` binary is a thin clap front end over this crate; integration
//! tests drive the same step functions with a fake encoder.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{ReleaseError, ReleaseResult};

use relm_common::config::{RootFolderInitializer, TomlConfig};
use std::path::PathBuf;

/// Resolved configuration and root folder shared by every command
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: TomlConfig,
    /// File the configuration was read from, `None` when defaults are used
    pub config_source: Option<PathBuf>,
    pub root: RootFolderInitializer,
}

impl AppContext {
    pub fn new(config: TomlConfig, config_source: Option<PathBuf>, root: PathBuf) -> Self {
        Self {
            config,
            config_source,
            root: RootFolderInitializer::new(root),
        }
    }

    /// Create the root folder layout
    pub fn initialize(&self) -> ReleaseResult<()> {
        self.root.ensure_directory_exists()?;
        Ok(())
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.session_path()
    }

    pub fn composer_db_path(&self) -> PathBuf {
        self.root.composer_db_path()
    }

    pub fn isrc_db_path(&self) -> PathBuf {
        self.root.isrc_db_path()
    }
}
