//! Track durations read from real audio headers

mod helpers;

use helpers::{generate_test_wav, AudioConfig};
use relm_release::services::album_scanner::read_duration;
use tempfile::TempDir;

#[test]
fn test_reads_wav_duration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    generate_test_wav(&path, &AudioConfig::default()).unwrap();

    assert_eq!(read_duration(&path), Some(2.5));
}

#[test]
fn test_duration_rounds_to_hundredths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.wav");
    let config = AudioConfig {
        duration_seconds: 1.234,
        sample_rate: 44100,
        channels: 1,
    };
    generate_test_wav(&path, &config).unwrap();

    let duration = read_duration(&path).unwrap();
    assert!((duration - 1.23).abs() < 0.011, "got {}", duration);
    assert_eq!((duration * 100.0).round() / 100.0, duration);
}

#[test]
fn test_unreadable_file_has_no_duration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.aif");
    std::fs::write(&path, b"not audio").unwrap();

    assert_eq!(read_duration(&path), None);
}
