//! Core `SpeechSynthesizer` trait and `KokoroClient` implementation.
//!
//! `KokoroClient` calls a local Kokoro speech server's OpenAI-compatible
//! `/v1/audio/speech` endpoint and decodes the returned WAV body into raw
//! samples.  The runtime loads its model weights from the asset files this
//! service downloads (see the `assets` module).

use std::io::Cursor;

use async_trait::async_trait;
use thiserror::Error;

use crate::chunk::AudioChunk;
use crate::config::TtsConfig;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the speech-synthesis runtime.
#[derive(Debug, Clone, Error)]
pub enum TtsError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("TTS request timed out")]
    Timeout,

    /// The runtime answered with a non-success status (unknown voice, bad
    /// input, internal model error).
    #[error("TTS runtime returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    /// The response body was not decodable WAV audio.
    #[error("failed to decode synthesised audio: {0}")]
    Decode(String),

    /// The runtime produced zero samples.
    #[error("TTS runtime returned empty audio")]
    EmptyAudio,
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech synthesis.
///
/// One call renders one text unit with one voice; the orchestrator stitches
/// the returned buffers in chunk order.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` with `voice`, returning the samples and their rate.
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioChunk, TtsError>;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

// ---------------------------------------------------------------------------
// WAV decoding
// ---------------------------------------------------------------------------

/// Decode a WAV byte buffer into mono f32 samples.
///
/// Accepts the two encodings Kokoro servers produce: 32-bit float and
/// 16-bit signed PCM (rescaled to [-1, 1]).
pub fn decode_wav(bytes: &[u8]) -> Result<AudioChunk, TtsError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| TtsError::Decode(e.to_string()))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(TtsError::Decode(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| TtsError::Decode(e.to_string()))?,
        (hound::SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| f32::from(v) / 32_768.0))
            .collect::<Result<_, _>>()
            .map_err(|e| TtsError::Decode(e.to_string()))?,
        (format, bits) => {
            return Err(TtsError::Decode(format!(
                "unsupported sample encoding: {format:?} at {bits} bits"
            )))
        }
    };

    if samples.is_empty() {
        return Err(TtsError::EmptyAudio);
    }

    Ok(AudioChunk::new(samples, spec.sample_rate))
}

// ---------------------------------------------------------------------------
// KokoroClient
// ---------------------------------------------------------------------------

/// HTTP client for a local Kokoro speech server.
pub struct KokoroClient {
    client: reqwest::Client,
    config: TtsConfig,
}

impl KokoroClient {
    /// Build a `KokoroClient` from application config.
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for KokoroClient {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioChunk, TtsError> {
        let url = format!("{}/v1/audio/speech", self.config.base_url);

        let body = serde_json::json!({
            "model":           "kokoro",
            "input":           text,
            "voice":           voice,
            "response_format": "wav",
            "speed":           self.config.speed
        });

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let bytes = response.bytes().await?;
        decode_wav(&bytes)
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// A test double that renders a fixed number of samples per call.
#[cfg(test)]
pub struct MockSynthesizer {
    samples_per_call: usize,
    sample_rate: u32,
    fail: bool,
}

#[cfg(test)]
impl MockSynthesizer {
    /// Mock producing `samples_per_call` samples at `sample_rate` Hz.
    pub fn ok(samples_per_call: usize, sample_rate: u32) -> Self {
        Self {
            samples_per_call,
            sample_rate,
            fail: false,
        }
    }

    /// Mock that fails every call.
    pub fn failing() -> Self {
        Self {
            samples_per_call: 0,
            sample_rate: 24_000,
            fail: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str, _voice: &str) -> Result<AudioChunk, TtsError> {
        if self.fail {
            return Err(TtsError::Request("mock synthesis failure".into()));
        }
        Ok(AudioChunk::new(
            vec![0.25; self.samples_per_call],
            self.sample_rate,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_float_wav() {
        let bytes = wav_bytes(&[0.0, 0.5, -0.5], 24_000);
        let audio = decode_wav(&bytes).unwrap();
        assert_eq!(audio.sample_rate, 24_000);
        assert_eq!(audio.samples, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn decodes_int16_wav() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(16_384i16).unwrap();
            writer.write_sample(-16_384i16).unwrap();
            writer.finalize().unwrap();
        }

        let audio = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(audio.sample_rate, 22_050);
        assert!((audio.samples[0] - 0.5).abs() < 1e-4);
        assert!((audio.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(matches!(
            decode_wav(b"definitely not a wav"),
            Err(TtsError::Decode(_))
        ));
    }

    #[test]
    fn rejects_empty_audio() {
        let bytes = wav_bytes(&[], 24_000);
        assert!(matches!(decode_wav(&bytes), Err(TtsError::EmptyAudio)));
    }

    #[test]
    fn from_config_builds_without_panic() {
        let _client = KokoroClient::from_config(&TtsConfig::default());
    }

    /// Verify that `KokoroClient` is object-safe (usable as `dyn SpeechSynthesizer`).
    #[test]
    fn synthesizer_is_object_safe() {
        let client: Box<dyn SpeechSynthesizer> =
            Box::new(KokoroClient::from_config(&TtsConfig::default()));
        drop(client);
    }
}
