//! Audio decoding
//!
//! Uses symphonia for format-agnostic decoding (WAV, MP3, FLAC, OGG/Vorbis,
//! AAC/M4A). Multi-channel audio is downmixed to mono by averaging channels
//! and the result is resampled to [`CANONICAL_SAMPLE_RATE`].

use super::transcode::Transcoder;
use super::{resample_mono, AudioSignal, DecodeError, CANONICAL_SAMPLE_RATE};
use std::path::Path;
use std::sync::Arc;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

/// Decoded audio at the source's native rate
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
}

/// Decode an audio file to mono f32 samples at its native rate
///
/// Corrupt packets inside an otherwise readable stream are skipped with a
/// warning. A stream that yields no samples at all is an error.
pub fn decode_file(file_path: &Path) -> Result<DecodedAudio, DecodeError> {
    debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| DecodeError::Open {
        path: file_path.display().to_string(),
        source: e,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::Unsupported("no audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Read(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped_packets += 1;
                warn!(path = %file_path.display(), error = msg, "Skipping corrupt packet");
                continue;
            }
            Err(SymphoniaError::IoError(e)) => {
                skipped_packets += 1;
                warn!(path = %file_path.display(), error = %e, "Skipping unreadable packet");
                continue;
            }
            Err(e) => return Err(DecodeError::Read(e.to_string())),
        };

        let spec = *decoded.spec();
        let frame_channels = spec.channels.count().max(1);
        sample_rate = spec.rate;
        channels = frame_channels;

        let needed = decoded.capacity() * frame_channels;
        if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        let scale = 1.0 / frame_channels as f32;
        mono.extend(
            buf.samples()
                .chunks_exact(frame_channels)
                .map(|frame| frame.iter().sum::<f32>() * scale),
        );
    }

    if mono.is_empty() || sample_rate == 0 {
        return Err(DecodeError::Empty);
    }

    debug!(
        path = %file_path.display(),
        total_samples = mono.len(),
        sample_rate,
        channels,
        skipped_packets,
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: mono,
        sample_rate,
        channels,
    })
}

/// Decode and resample to the canonical analysis rate
fn decode_to_signal(file_path: &Path) -> Result<AudioSignal, DecodeError> {
    let decoded = decode_file(file_path)?;
    let samples = resample_mono(decoded.samples, decoded.sample_rate, CANONICAL_SAMPLE_RATE)?;
    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(AudioSignal {
        samples,
        sample_rate: CANONICAL_SAMPLE_RATE,
        source_sample_rate: decoded.sample_rate,
        source_channels: decoded.channels,
    })
}

/// Audio decoder with optional transcoder fallback
#[derive(Clone, Default)]
pub struct AudioDecoder {
    transcoder: Option<Arc<dyn Transcoder>>,
}

impl AudioDecoder {
    /// Decoder without a fallback path
    pub fn new() -> Self {
        Self { transcoder: None }
    }

    /// Decoder that falls back to `transcoder` when direct decoding fails
    pub fn with_transcoder(transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            transcoder: Some(transcoder),
        }
    }

    /// Decode `path` to a mono [`AudioSignal`] at [`CANONICAL_SAMPLE_RATE`]
    ///
    /// The transcoder's intermediate WAV lives in a temporary file that is
    /// removed on every exit path.
    pub fn decode(&self, path: &Path) -> Result<AudioSignal, DecodeError> {
        let primary = match decode_to_signal(path) {
            Ok(signal) => return Ok(signal),
            Err(e) => e.to_string(),
        };

        warn!(path = %path.display(), error = %primary, "Direct decode failed");

        let transcoder = match &self.transcoder {
            Some(t) if t.is_available() => t,
            _ => return Err(DecodeError::TranscoderUnavailable { primary }),
        };

        info!(path = %path.display(), transcoder = transcoder.name(), "Retrying via transcoder");

        let intermediate = tempfile::Builder::new()
            .prefix("spm-transcode-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| DecodeError::FallbackFailed {
                primary: primary.clone(),
                fallback: format!("could not create temporary file: {}", e),
            })?;

        transcoder
            .transcode_to_wav(path, intermediate.path())
            .map_err(|e| DecodeError::FallbackFailed {
                primary: primary.clone(),
                fallback: e.to_string(),
            })?;

        decode_to_signal(intermediate.path()).map_err(|e| DecodeError::FallbackFailed {
            primary,
            fallback: e.to_string(),
        })
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("transcoder", &self.transcoder.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}
