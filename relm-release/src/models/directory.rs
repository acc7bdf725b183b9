//! Composer, publisher and ISRC directory entries
//!
//! On disk the composer directory is one JSON document:
//!
//! ```json
//! {
//!     "composers":  { "John Paul Smith": { "first_name": "John", ... } },
//!     "publishers": { "Imagine Music Publishing": { "publisher_name": ..., ... } }
//! }
//! ```
//!
//! Keys are the full display names. A composer refers to its publisher by key.
//! Composers and publishers keep the order they were added in, both in memory
//! and in the saved document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capacity written for writers whose directory entry does not set one
pub const DEFAULT_WRITER_CAPACITY: &str = "Composer/Author";

/// Royalty metadata of one composer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerEntry {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Performing rights society (e.g. "BMI", "RAO")
    #[serde(default)]
    pub society: String,
    #[serde(default)]
    pub ipi: String,
    /// Key into the publisher table, empty when self-published
    #[serde(default)]
    pub publisher_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
}

impl ComposerEntry {
    /// First, middle and last name joined by single spaces, empty parts skipped
    pub fn full_name(&self) -> String {
        join_name_parts(&self.first_name, &self.middle_name, &self.last_name)
    }

    pub fn capacity(&self) -> &str {
        self.capacity
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_WRITER_CAPACITY)
    }
}

/// Join name parts into a directory key
pub fn join_name_parts(first: &str, middle: &str, last: &str) -> String {
    [first.trim(), middle.trim(), last.trim()]
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Royalty metadata of one publisher
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherEntry {
    #[serde(default)]
    pub publisher_name: String,
    #[serde(default)]
    pub publisher_society: String,
    #[serde(default)]
    pub publisher_ipi: String,
}

/// The composer directory document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposerDirectory {
    #[serde(default)]
    pub composers: IndexMap<String, ComposerEntry>,
    #[serde(default)]
    pub publishers: IndexMap<String, PublisherEntry>,
}

impl ComposerDirectory {
    /// Publisher of a composer, shown as "Name (Society)" in listings
    pub fn publisher_display(&self, composer: &ComposerEntry) -> String {
        let Some(publisher) = self.publishers.get(&composer.publisher_key) else {
            return composer.publisher_key.clone();
        };
        if publisher.publisher_society.is_empty() {
            publisher.publisher_name.clone()
        } else {
            format!(
                "{} ({})",
                publisher.publisher_name, publisher.publisher_society
            )
        }
    }
}

/// What an allocated ISRC was assigned to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsrcEntry {
    #[serde(default)]
    pub album_code: String,
    #[serde(default)]
    pub album_title: String,
    #[serde(default)]
    pub track_title: String,
}

/// ISRC code → assignment
pub type IsrcDirectory = BTreeMap<String, IsrcEntry>;
