//! Scratch label library
//!
//! Builds the folder layout of the label's file server in a temp directory:
//! pending albums with `_MASTERED` files and per-track working folders, the
//! AIFF/MP3 libraries, covers, metadata and Harvest folders.

use relm_common::config::{FoldersConfig, TomlConfig};
use relm_release::db::composers::save_directory;
use relm_release::models::{ComposerDirectory, ComposerEntry, PublisherEntry};
use relm_release::services::{AudioEncoder, EncodeTarget, EncoderError};
use relm_release::AppContext;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Encoder that copies bytes instead of running ffmpeg
#[derive(Debug, Default)]
pub struct CopyEncoder;

impl AudioEncoder for CopyEncoder {
    fn convert(&self, src: &Path, dst: &Path, _target: EncodeTarget) -> Result<(), EncoderError> {
        if !src.is_file() {
            return Err(EncoderError::FileNotFound(src.to_path_buf()));
        }
        std::fs::copy(src, dst).map_err(|e| EncoderError::ExecutionError(e.to_string()))?;
        Ok(())
    }
}

/// Encoder that fails every conversion
#[derive(Debug, Default)]
pub struct FailingEncoder;

impl AudioEncoder for FailingEncoder {
    fn convert(&self, src: &Path, _dst: &Path, _target: EncodeTarget) -> Result<(), EncoderError> {
        Err(EncoderError::Failed {
            src: src.to_path_buf(),
            stderr: "Invalid data found when processing input".to_string(),
        })
    }
}

pub struct LibraryFixture {
    _temp: TempDir,
    pub base: PathBuf,
    pub ctx: AppContext,
}

impl LibraryFixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let base = temp.path().to_path_buf();
        let folder = |name: &str| {
            let path = base.join(name);
            std::fs::create_dir_all(&path).unwrap();
            Some(path)
        };
        let config = TomlConfig {
            folders: FoldersConfig {
                pending: folder("pending"),
                all_aiff: folder("all_aiff"),
                all_mp3: folder("all_mp3"),
                covers: folder("covers"),
                metadata: folder("metadata"),
                harvest: folder("harvest"),
                total_metadata: None,
            },
            ..Default::default()
        };
        let ctx = AppContext::new(config, None, base.join("root"));
        ctx.initialize().unwrap();
        Self {
            _temp: temp,
            base,
            ctx,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Pending album "Rise" (IMG042) with two tracks and their stems
    pub fn add_rise_album(&self) -> PathBuf {
        let album = self.path("pending").join("Rise");
        let mastered = album.join("_MASTERED");
        std::fs::create_dir_all(&mastered).unwrap();
        std::fs::write(mastered.join("IMG042 - Rise - 01 Iron Will.aif"), b"aiff-1").unwrap();
        std::fs::write(mastered.join("IMG042 - Rise - 02 Last Stand.aif"), b"aiff-2").unwrap();
        std::fs::write(mastered.join("notes.txt"), b"not a track").unwrap();

        let iron = album.join("John Smith and Jane Doe - Iron Will 120");
        std::fs::create_dir_all(iron.join("archive")).unwrap();
        std::fs::write(iron.join("Iron Will - Drums Stem 120.wav"), b"drums").unwrap();
        std::fs::write(iron.join("Iron Will_Pads_v2.wav"), b"pads").unwrap();
        std::fs::write(iron.join("Iron Will Full Mix.wav"), b"mix").unwrap();
        std::fs::write(iron.join("Iron Will.wav"), b"master copy").unwrap();
        std::fs::write(iron.join("archive").join("Old Drums.wav"), b"old").unwrap();

        let last = album.join("Alex Brown - Last Stand 95");
        std::fs::create_dir_all(last.join("Stems")).unwrap();
        std::fs::write(last.join("Stems").join("Strings & Brass.aif"), b"strings").unwrap();
        std::fs::write(last.join("Stems").join("Choir.wav"), b"choir").unwrap();
        album
    }

    /// Composer directory knowing everyone on the "Rise" album
    pub fn seed_composers(&self) -> ComposerDirectory {
        let mut directory = ComposerDirectory::default();
        directory.publishers.insert(
            "Epic Notes Publishing".to_string(),
            PublisherEntry {
                publisher_name: "Epic Notes Publishing".to_string(),
                publisher_society: "BMI".to_string(),
                publisher_ipi: "111".to_string(),
            },
        );
        for (first, middle, last, ipi) in [
            ("John", "Michael", "Smith", "201"),
            ("Jane", "", "Doe", "202"),
            ("Alex", "", "Brown", "203"),
        ] {
            let entry = ComposerEntry {
                first_name: first.to_string(),
                middle_name: middle.to_string(),
                last_name: last.to_string(),
                society: "BMI".to_string(),
                ipi: ipi.to_string(),
                publisher_key: "Epic Notes Publishing".to_string(),
                capacity: None,
            };
            directory.composers.insert(entry.full_name(), entry);
        }
        save_directory(&self.ctx.composer_db_path(), &directory).unwrap();
        directory
    }

    /// Designer cover for "IMG042 Rise"
    pub fn add_cover(&self) {
        let dir = self.path("covers").join("IMG042 Rise");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Rise 2MB.jpg"), b"small").unwrap();
        std::fs::write(dir.join("Rise_8MB.jpg"), b"cover").unwrap();
    }

    /// Files staff download from DISCO into the AIFF and MP3 album folders
    pub fn add_library_files(&self, aiff_album: &Path, mp3_album: &Path) {
        for track in ["01 Iron Will", "02 Last Stand"] {
            let base = format!("IMG042 - Rise - {}", track);
            std::fs::write(aiff_album.join(format!("{}.aiff", base)), b"aiff").unwrap();
            std::fs::write(mp3_album.join(format!("{}.mp3", base)), b"mp3").unwrap();
        }
    }
}
