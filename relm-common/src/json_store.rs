//! Whole-file JSON store
//!
//! The composer directory, the ISRC directory and the session are flat JSON
//! documents. They are read whole at the start of a step and written whole at
//! the end of it; there is no locking and no partial update.
//!
//! Writes go through a temp file and a rename so a crash never leaves a
//! truncated document behind. Output uses 4-space indentation and keeps
//! non-ASCII names (Cyrillic composer names are common) verbatim.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read a JSON document, returning `T::default()` when the file is missing or empty
///
/// A file with content that does not parse is an error: silently replacing a
/// damaged directory with an empty one would lose it on the next save.
pub fn load_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    parse(path, &content)
}

/// Read a JSON document that must exist
pub fn load<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse(path, &content)
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a JSON document atomically, creating parent directories as needed
pub fn save<T>(value: &T, path: &Path) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = to_pretty_bytes(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, bytes)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), "JSON document saved");
    Ok(())
}

fn to_pretty_bytes<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');
    Ok(buf)
}
