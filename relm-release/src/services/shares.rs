//! Writer and publisher royalty shares
//!
//! Shares are whole percentages. 100 is split evenly across the writers; the
//! remainder goes one point each to the first writers, so the shares always
//! sum to 100.

use crate::models::{ComposerDirectory, DEFAULT_WRITER_CAPACITY};

/// One writer slot of a metadata row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Writer {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub capacity: String,
    pub society: String,
    pub ipi: String,
    /// Original publisher name, empty when self-published
    pub publisher_name: String,
    pub share: u32,
}

impl Writer {
    pub fn full_name(&self) -> String {
        crate::models::join_name_parts(&self.first_name, &self.middle_name, &self.last_name)
    }
}

/// One publisher slot of a metadata row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub name: String,
    pub society: String,
    pub ipi: String,
    /// Share of the writer that introduced this publisher
    pub share: u32,
}

/// Even split of 100 across `n` writers
pub fn split_shares(n: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let n32 = n as u32;
    let base = 100 / n32;
    let remainder = (100 % n32) as usize;
    (0..n)
        .map(|i| base + u32::from(i < remainder))
        .collect()
}

/// Writers in key order plus their publishers, de-duplicated by name
///
/// Keys missing from the directory still produce a (blank) writer so the
/// share split matches the number of credited composers.
pub fn build_writers_and_publishers(
    keys: &[String],
    directory: &ComposerDirectory,
) -> (Vec<Writer>, Vec<Publisher>) {
    let mut writers = Vec::with_capacity(keys.len());
    let mut publishers: Vec<Publisher> = Vec::new();

    for (key, share) in keys.iter().zip(split_shares(keys.len())) {
        let Some(composer) = directory.composers.get(key) else {
            tracing::warn!(key = %key, "Matched composer missing from directory");
            writers.push(Writer {
                first_name: String::new(),
                middle_name: String::new(),
                last_name: String::new(),
                capacity: DEFAULT_WRITER_CAPACITY.to_string(),
                society: String::new(),
                ipi: String::new(),
                publisher_name: String::new(),
                share,
            });
            continue;
        };

        let publisher = directory.publishers.get(&composer.publisher_key);
        let publisher_name = publisher
            .map(|p| p.publisher_name.clone())
            .unwrap_or_else(|| composer.publisher_key.clone());

        if !publisher_name.is_empty() && !publishers.iter().any(|p| p.name == publisher_name) {
            publishers.push(Publisher {
                name: publisher_name.clone(),
                society: publisher.map(|p| p.publisher_society.clone()).unwrap_or_default(),
                ipi: publisher.map(|p| p.publisher_ipi.clone()).unwrap_or_default(),
                share,
            });
        }

        writers.push(Writer {
            first_name: composer.first_name.clone(),
            middle_name: composer.middle_name.clone(),
            last_name: composer.last_name.clone(),
            capacity: composer.capacity().to_string(),
            society: composer.society.clone(),
            ipi: composer.ipi.clone(),
            publisher_name,
            share,
        });
    }

    (writers, publishers)
}
