//! Audio buffer stitching and WAV output.
//!
//! Each synthesis chunk yields an [`AudioChunk`] (mono f32 samples plus the
//! runtime's sample rate).  The stitcher concatenates them in chunk order
//! into one continuous buffer; resampling is out of scope, so mixed sample
//! rates are rejected outright.

use std::path::Path;

use thiserror::Error;

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One synthesised audio buffer: mono f32 PCM at `sample_rate` Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// StitchError
// ---------------------------------------------------------------------------

/// Errors from stitching or writing the final audio artifact.
#[derive(Debug, Error)]
pub enum StitchError {
    /// There were no chunks to stitch — synthesis produced no audio.
    #[error("no audio chunks to stitch")]
    Empty,

    /// Two chunks disagree on sample rate.  Resampling is out of scope, so
    /// this is a fatal configuration error.
    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    /// The WAV encoder failed.
    #[error("failed to write WAV file: {0}")]
    Wav(String),
}

// ---------------------------------------------------------------------------
// Stitching
// ---------------------------------------------------------------------------

/// Concatenate `chunks` in order into one continuous buffer.
///
/// All chunks must share one sample rate; no silence is inserted between
/// them beyond what the synthesis stage itself produced.
pub fn stitch(chunks: Vec<AudioChunk>) -> Result<AudioChunk, StitchError> {
    let mut iter = chunks.into_iter();
    let first = iter.next().ok_or(StitchError::Empty)?;
    let sample_rate = first.sample_rate;
    let mut samples = first.samples;

    for chunk in iter {
        if chunk.sample_rate != sample_rate {
            return Err(StitchError::SampleRateMismatch {
                expected: sample_rate,
                found: chunk.sample_rate,
            });
        }
        samples.extend_from_slice(&chunk.samples);
    }

    Ok(AudioChunk::new(samples, sample_rate))
}

/// Write `audio` to `path` as a mono 32-bit-float WAV file.
pub fn write_wav(path: &Path, audio: &AudioChunk) -> Result<(), StitchError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| StitchError::Wav(e.to_string()))?;
    for &sample in &audio.samples {
        writer
            .write_sample(sample)
            .map_err(|e| StitchError::Wav(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| StitchError::Wav(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stitched_length_is_the_sum_of_inputs() {
        let chunks = vec![
            AudioChunk::new(vec![0.1; 100], 24_000),
            AudioChunk::new(vec![0.2; 250], 24_000),
            AudioChunk::new(vec![0.3; 7], 24_000),
        ];
        let out = stitch(chunks).unwrap();
        assert_eq!(out.samples.len(), 357);
        assert_eq!(out.sample_rate, 24_000);
    }

    #[test]
    fn chunk_order_is_preserved() {
        let chunks = vec![
            AudioChunk::new(vec![1.0], 24_000),
            AudioChunk::new(vec![2.0], 24_000),
        ];
        let out = stitch(chunks).unwrap();
        assert_eq!(out.samples, vec![1.0, 2.0]);
    }

    #[test]
    fn mixed_sample_rates_are_rejected() {
        let chunks = vec![
            AudioChunk::new(vec![0.0; 10], 24_000),
            AudioChunk::new(vec![0.0; 10], 22_050),
        ];
        match stitch(chunks) {
            Err(StitchError::SampleRateMismatch { expected, found }) => {
                assert_eq!(expected, 24_000);
                assert_eq!(found, 22_050);
            }
            other => panic!("expected sample-rate mismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(stitch(Vec::new()), Err(StitchError::Empty)));
    }

    #[test]
    fn written_wav_round_trips() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("out.wav");
        let audio = AudioChunk::new(vec![0.0, 0.5, -0.5, 1.0], 24_000);

        write_wav(&path, &audio).expect("write");

        let mut reader = hound::WavReader::open(&path).expect("open");
        assert_eq!(reader.spec().sample_rate, 24_000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, audio.samples);
    }
}
