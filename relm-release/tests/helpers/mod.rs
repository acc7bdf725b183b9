//! Test Helper Utilities
//!
//! Shared utilities for the relm-release integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod library_fixture;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use library_fixture::{CopyEncoder, FailingEncoder, LibraryFixture};
