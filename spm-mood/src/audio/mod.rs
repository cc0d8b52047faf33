//! Audio input stage
//!
//! Turns an arbitrary container/codec file into a mono signal at the
//! canonical analysis rate. Direct decoding uses symphonia; when that fails
//! an external transcoder (ffmpeg) normalises the file to WAV and decoding
//! is retried on the intermediate.

pub mod decoder;
pub mod resample;
pub mod transcode;

pub use decoder::{decode_file, AudioDecoder, DecodedAudio};
pub use resample::resample_mono;
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder};

use thiserror::Error;

/// Sample rate every signal is converted to before analysis
pub const CANONICAL_SAMPLE_RATE: u32 = 22_050;

/// Mono PCM signal at [`CANONICAL_SAMPLE_RATE`]
#[derive(Debug, Clone)]
pub struct AudioSignal {
    /// Mono samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Always [`CANONICAL_SAMPLE_RATE`] once produced by the decoder
    pub sample_rate: u32,
    /// Native rate of the source before resampling
    pub source_sample_rate: u32,
    /// Channel count of the source before downmixing
    pub source_channels: usize,
}

impl AudioSignal {
    /// Duration in seconds (`sample_count / sample_rate`)
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Audio decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Source file could not be opened
    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Container or codec not recognised
    #[error("Unsupported audio format: {0}")]
    Unsupported(String),

    /// Stream-level read failure
    #[error("Failed to read audio stream: {0}")]
    Read(String),

    /// Stream decoded to zero samples
    #[error("Audio stream contains no samples")]
    Empty,

    /// Sample rate conversion failed
    #[error("Resampling failed: {0}")]
    Resample(String),

    /// Direct decode failed and no transcoder could be used
    #[error("Could not decode audio ({primary}); transcoder unavailable")]
    TranscoderUnavailable { primary: String },

    /// Direct decode failed and the transcoder fallback failed too
    #[error("Could not decode audio ({primary}); fallback failed: {fallback}")]
    FallbackFailed { primary: String, fallback: String },
}
