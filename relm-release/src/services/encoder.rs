//! Audio conversion through an external encoder
//!
//! Stems are delivered as AIFF and Harvest as WAV, both 24-bit / 48 kHz.
//! Conversion is delegated to the `ffmpeg` command-line tool; the trait seam
//! lets tests substitute an encoder that simply copies bytes.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Encoder errors
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Encoder binary could not be started
    #[error("Encoder binary not found: {0} (set [encoder].ffmpeg in the config)")]
    BinaryNotFound(PathBuf),

    /// Failed to execute the encoder process
    #[error("Failed to execute encoder: {0}")]
    ExecutionError(String),

    /// Encoder ran and reported failure
    #[error("Conversion of {src} failed: {stderr}")]
    Failed { src: PathBuf, stderr: String },

    /// Source audio file missing
    #[error("Audio file not found: {0}")]
    FileNotFound(PathBuf),
}

/// Output format of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// Big-endian 24-bit PCM AIFF at 48 kHz (stems)
    AiffPcm24At48k,
    /// Little-endian 24-bit PCM WAV at 48 kHz (Harvest delivery)
    WavPcm24At48k,
}

impl EncodeTarget {
    fn codec(self) -> &'static str {
        match self {
            EncodeTarget::AiffPcm24At48k => "pcm_s24be",
            EncodeTarget::WavPcm24At48k => "pcm_s24le",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            EncodeTarget::AiffPcm24At48k => "aiff",
            EncodeTarget::WavPcm24At48k => "wav",
        }
    }
}

/// Converts one audio file into another format
pub trait AudioEncoder: Send + Sync {
    fn convert(&self, src: &Path, dst: &Path, target: EncodeTarget) -> Result<(), EncoderError>;
}

/// `ffmpeg` process encoder
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Arguments for one conversion, overwriting `dst`
    pub fn arguments(src: &Path, dst: &Path, target: EncodeTarget) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            src.display().to_string(),
            "-c:a".to_string(),
            target.codec().to_string(),
            "-ar".to_string(),
            "48000".to_string(),
            dst.display().to_string(),
        ]
    }
}

impl AudioEncoder for FfmpegEncoder {
    fn convert(&self, src: &Path, dst: &Path, target: EncodeTarget) -> Result<(), EncoderError> {
        if !src.exists() {
            return Err(EncoderError::FileNotFound(src.to_path_buf()));
        }

        tracing::debug!(
            src = %src.display(),
            dst = %dst.display(),
            codec = target.codec(),
            "Running ffmpeg"
        );

        let output = Command::new(&self.binary)
            .args(Self::arguments(src, dst, target))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncoderError::BinaryNotFound(self.binary.clone())
                } else {
                    EncoderError::ExecutionError(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = std::fs::remove_file(dst);
            return Err(EncoderError::Failed {
                src: src.to_path_buf(),
                stderr: last_lines(&stderr, 5),
            });
        }

        Ok(())
    }
}

// ffmpeg prints its whole banner to stderr; the error is at the end
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_arguments_use_big_endian_aiff() {
        let args = FfmpegEncoder::arguments(
            Path::new("in.wav"),
            Path::new("out.aiff"),
            EncodeTarget::AiffPcm24At48k,
        );
        assert_eq!(
            args,
            ["-y", "-i", "in.wav", "-c:a", "pcm_s24be", "-ar", "48000", "out.aiff"]
        );
    }

    #[test]
    fn test_harvest_arguments_use_little_endian_wav() {
        let args = FfmpegEncoder::arguments(
            Path::new("a.aiff"),
            Path::new("a.wav"),
            EncodeTarget::WavPcm24At48k,
        );
        assert_eq!(args[4], "pcm_s24le");
        assert_eq!(EncodeTarget::WavPcm24At48k.extension(), "wav");
    }

    #[test]
    fn test_missing_binary_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let src = dir.path().join("in.wav");
        std::fs::write(&src, b"RIFF").unwrap();
        let encoder = FfmpegEncoder::new(dir.path().join("no-such-ffmpeg"));

        let result = encoder.convert(&src, &dir.path().join("out.aiff"), EncodeTarget::AiffPcm24At48k);

        assert!(matches!(result, Err(EncoderError::BinaryNotFound(_))));
    }

    #[test]
    fn test_missing_source_is_reported() {
        let encoder = FfmpegEncoder::new("ffmpeg");
        let result = encoder.convert(
            Path::new("/nonexistent/in.wav"),
            Path::new("/nonexistent/out.aiff"),
            EncodeTarget::AiffPcm24At48k,
        );
        assert!(matches!(result, Err(EncoderError::FileNotFound(_))));
    }

    #[test]
    fn test_last_lines_keeps_tail() {
        assert_eq!(last_lines("a\n\nb\nc\n", 2), "b\nc");
        assert_eq!(last_lines("only", 5), "only");
    }
}
