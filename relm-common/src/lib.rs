//! # Release Master Common Library
//!
//! Shared code for the Release Master workspace:
//! - Error types
//! - TOML configuration and root folder resolution
//! - Whole-file JSON store used by the composer, ISRC and session files
//! - Time helpers

pub mod config;
pub mod error;
pub mod human_time;
pub mod json_store;
pub mod time;

pub use error::{Error, Result};
