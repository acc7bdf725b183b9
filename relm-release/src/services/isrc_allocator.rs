//! Sequential ISRC allocation
//!
//! The label owns one ISRC range: a fixed prefix (country, registrant, year)
//! followed by a 5-digit designation code. New codes continue after the
//! highest code already recorded in the ISRC directory.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{IsrcDirectory, IsrcEntry, Session};
use relm_common::config::IsrcConfig;

const DESIGNATION_DIGITS: usize = 5;
const MAX_DESIGNATION: u32 = 99_999;

/// Allocates designation codes within the configured prefix
#[derive(Debug, Clone)]
pub struct IsrcAllocator {
    prefix: String,
    last: u32,
}

impl IsrcAllocator {
    /// Start after the highest code in `directory`, or after the seed
    pub fn new(config: &IsrcConfig, directory: &IsrcDirectory) -> ReleaseResult<Self> {
        let highest = directory
            .keys()
            .filter_map(|code| designation(&config.prefix, code))
            .max();
        let last = match highest {
            Some(n) => n,
            None => designation(&config.prefix, &config.seed).ok_or_else(|| {
                ReleaseError::BadRequest(format!(
                    "isrc.seed '{}' does not start with isrc.prefix '{}' followed by {} digits",
                    config.seed, config.prefix, DESIGNATION_DIGITS
                ))
            })?,
        };
        Ok(Self {
            prefix: config.prefix.clone(),
            last,
        })
    }

    /// Last allocated code
    pub fn last_code(&self) -> String {
        format_code(&self.prefix, self.last)
    }

    /// Allocate the next `n` codes
    pub fn next_codes(&mut self, n: usize) -> ReleaseResult<Vec<String>> {
        let end = self.last as u64 + n as u64;
        if end > MAX_DESIGNATION as u64 {
            return Err(ReleaseError::BadRequest(format!(
                "ISRC range {} exhausted: {} codes requested after {}",
                self.prefix,
                n,
                self.last_code()
            )));
        }
        let codes = (1..=n as u32)
            .map(|i| format_code(&self.prefix, self.last + i))
            .collect();
        self.last += n as u32;
        Ok(codes)
    }
}

/// Numeric tail of a code inside the range
fn designation(prefix: &str, code: &str) -> Option<u32> {
    let tail = code.strip_prefix(prefix)?;
    if tail.len() != DESIGNATION_DIGITS || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

fn format_code(prefix: &str, n: u32) -> String {
    format!("{}{:0width$}", prefix, n, width = DESIGNATION_DIGITS)
}

/// Give every track without an ISRC the next code
///
/// Returns the newly assigned codes with their directory entries; the caller
/// records them once the metadata file is safely written.
pub fn assign_session_isrcs(
    session: &mut Session,
    allocator: &mut IsrcAllocator,
) -> ReleaseResult<Vec<(String, IsrcEntry)>> {
    let missing = session.tracks.iter().filter(|t| t.isrc.is_none()).count();
    let mut codes = allocator.next_codes(missing)?.into_iter();

    let mut assigned = Vec::with_capacity(missing);
    for track in session.tracks.iter_mut().filter(|t| t.isrc.is_none()) {
        let Some(code) = codes.next() else {
            break;
        };
        assigned.push((
            code.clone(),
            IsrcEntry {
                album_code: session.album_code.clone(),
                album_title: session.album_name.clone(),
                track_title: track.track_name.clone(),
            },
        ));
        track.isrc = Some(code);
    }

    tracing::info!(
        album = %session.album_code,
        assigned = assigned.len(),
        last = %allocator.last_code(),
        "ISRC codes allocated"
    );
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Track;

    fn entry() -> IsrcEntry {
        IsrcEntry::default()
    }

    #[test]
    fn test_seed_used_when_directory_empty() {
        let mut allocator = IsrcAllocator::new(&IsrcConfig::default(), &IsrcDirectory::new()).unwrap();
        assert_eq!(allocator.last_code(), "RU-AD4-20-01000");
        assert_eq!(
            allocator.next_codes(2).unwrap(),
            vec!["RU-AD4-20-01001", "RU-AD4-20-01002"]
        );
        assert_eq!(allocator.last_code(), "RU-AD4-20-01002");
    }

    #[test]
    fn test_highest_code_in_range_wins() {
        let mut directory = IsrcDirectory::new();
        directory.insert("RU-AD4-20-01234".to_string(), entry());
        directory.insert("RU-AD4-20-00999".to_string(), entry());
        directory.insert("RU-AD4-20-9999".to_string(), entry());
        directory.insert("RU-AD4-20-0150X".to_string(), entry());
        directory.insert("US-XXX-20-05000".to_string(), entry());

        let mut allocator = IsrcAllocator::new(&IsrcConfig::default(), &directory).unwrap();
        assert_eq!(allocator.next_codes(1).unwrap(), vec!["RU-AD4-20-01235"]);
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut directory = IsrcDirectory::new();
        directory.insert("RU-AD4-20-99998".to_string(), entry());
        let mut allocator = IsrcAllocator::new(&IsrcConfig::default(), &directory).unwrap();
        assert!(allocator.next_codes(2).is_err());
        assert_eq!(allocator.next_codes(1).unwrap(), vec!["RU-AD4-20-99999"]);
    }

    #[test]
    fn test_bad_seed_is_rejected() {
        let config = IsrcConfig {
            prefix: "RU-AD4-20-".to_string(),
            seed: "XX".to_string(),
        };
        assert!(IsrcAllocator::new(&config, &IsrcDirectory::new()).is_err());
    }

    #[test]
    fn test_existing_session_isrcs_are_kept() {
        let mut session = Session {
            album_code: "IMG042".to_string(),
            album_name: "Rise".to_string(),
            tracks: vec![
                Track {
                    track_name: "One".to_string(),
                    isrc: Some("RU-AD4-20-00500".to_string()),
                    ..Default::default()
                },
                Track {
                    track_name: "Two".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut allocator = IsrcAllocator::new(&IsrcConfig::default(), &IsrcDirectory::new()).unwrap();

        let assigned = assign_session_isrcs(&mut session, &mut allocator).unwrap();

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].0, "RU-AD4-20-01001");
        assert_eq!(assigned[0].1.track_title, "Two");
        assert_eq!(session.tracks[0].isrc.as_deref(), Some("RU-AD4-20-00500"));
        assert_eq!(session.tracks[1].isrc.as_deref(), Some("RU-AD4-20-01001"));
    }
}
