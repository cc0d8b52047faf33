//! External transcoder fallback
//!
//! Used only when symphonia cannot decode a file directly. The transcoder
//! writes a mono WAV at the canonical rate which is then decoded again.

use super::CANONICAL_SAMPLE_RATE;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// Transcoder errors
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// Transcoder binary not found in PATH
    #[error("Transcoder binary not found: {0}")]
    BinaryNotFound(String),

    /// Failed to launch the transcoder process
    #[error("Failed to execute transcoder: {0}")]
    ExecutionError(String),

    /// Transcoder ran and reported failure
    #[error("Transcoding failed: {0}")]
    Failed(String),
}

/// Converts an arbitrary audio file into a mono WAV at [`CANONICAL_SAMPLE_RATE`]
pub trait Transcoder: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Whether the transcoder can currently be run
    fn is_available(&self) -> bool;

    /// Transcode `src` into a WAV file at `dst` (overwriting it)
    fn transcode_to_wav(&self, src: &Path, dst: &Path) -> Result<(), TranscodeError>;
}

/// ffmpeg command-line transcoder
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        match Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(program = %self.program, error = %e, "Transcoder not available");
                false
            }
        }
    }

    fn transcode_to_wav(&self, src: &Path, dst: &Path) -> Result<(), TranscodeError> {
        debug!(
            program = %self.program,
            src = %src.display(),
            dst = %dst.display(),
            "Transcoding to WAV"
        );

        let output = Command::new(&self.program)
            .args(["-y", "-v", "error", "-i"])
            .arg(src)
            .args(["-ar", &CANONICAL_SAMPLE_RATE.to_string(), "-ac", "1", "-f", "wav"])
            .arg(dst)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::BinaryNotFound(self.program.clone())
                } else {
                    TranscodeError::ExecutionError(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.lines().last().unwrap_or("").trim();
            return Err(TranscodeError::Failed(if reason.is_empty() {
                output.status.to_string()
            } else {
                format!("{} ({})", reason, output.status)
            }));
        }

        Ok(())
    }
}
