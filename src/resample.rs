//! The resampler adapter (spec.md §4.3).
//!
//! Thin façade over `speexdsp_resampler::State`, one instance per channel,
//! grounded on `quark-zju-sndcat`'s `Resampler` in `resample.rs`. Passes
//! samples through untouched at 48 kHz; otherwise runs a polyphase
//! conversion at a configurable quality, defaulting per
//! [`crate::config::resample_quality`].

use crate::config;
use crate::error::{Error, Result};

/// Converts interleaved float PCM from one sample rate to 48 kHz.
pub enum Resampler {
    /// Input is already 48 kHz; samples pass through unchanged.
    PassThrough { channels: usize },
    /// Per-channel polyphase converter state.
    Converting { channels: usize, input_rate: u32, state: Vec<speexdsp_resampler::State> },
}

/// Frames processed per internal resampler pass (spec.md §4.3).
const CHUNK_FRAMES: usize = 256;

impl Resampler {
    /// Builds an adapter from `input_rate` to 48 kHz for `channels`
    /// channels, using `quality` (0-10) or the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the underlying resampler state
    /// cannot be constructed (invalid channel count or quality).
    pub fn new(channels: usize, input_rate: u32, quality: Option<usize>) -> Result<Self> {
        if input_rate == 48_000 {
            return Ok(Self::PassThrough { channels });
        }
        let quality = quality.unwrap_or_else(config::resample_quality).min(10);
        log::debug!("resample {input_rate}hz to 48000hz with quality {quality}, {channels} channels");
        let mut state = Vec::with_capacity(channels);
        for _ in 0..channels {
            state.push(
                speexdsp_resampler::State::new(1, input_rate as usize, 48_000, quality)
                    .map_err(|_| Error::Internal("failed to construct resampler state"))?,
            );
        }
        Ok(Self::Converting { channels, input_rate, state })
    }

    #[must_use]
    pub const fn channels(&self) -> usize {
        match self {
            Self::PassThrough { channels } | Self::Converting { channels, .. } => *channels,
        }
    }

    /// Converts `input` (interleaved, 16-bit values pre-normalized to
    /// `[-1.0, 1.0]` by the caller) into 48 kHz interleaved float output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if the underlying converter rejects a
    /// chunk.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        match self {
            Self::PassThrough { .. } => Ok(input.to_vec()),
            Self::Converting { channels, input_rate, state } => {
                let channels = *channels;
                let in_frames = input.len() / channels;
                let mut out = Vec::new();
                let mut offset = 0;
                while offset < in_frames {
                    let take = CHUNK_FRAMES.min(in_frames - offset);
                    let out_len = take * 48_000 / (*input_rate as usize);
                    if channels == 1 {
                        let mut chunk_in = input[offset..offset + take].to_vec();
                        let mut chunk_out = vec![0.0f32; out_len];
                        state[0]
                            .process_float(0, &mut chunk_in, &mut chunk_out)
                            .map_err(|_| Error::Internal("resampler rejected a chunk"))?;
                        out.extend_from_slice(&chunk_out);
                    } else {
                        let mut per_channel_out = vec![vec![0.0f32; out_len]; channels];
                        for (c, per_out) in per_channel_out.iter_mut().enumerate() {
                            let mut chunk_in: Vec<f32> =
                                (0..take).map(|i| input[(offset + i) * channels + c]).collect();
                            state[c]
                                .process_float(0, &mut chunk_in, per_out)
                                .map_err(|_| Error::Internal("resampler rejected a chunk"))?;
                        }
                        for i in 0..out_len {
                            for per_out in &per_channel_out {
                                out.push(per_out[i]);
                            }
                        }
                    }
                    offset += take;
                }
                Ok(out)
            },
        }
    }
}

/// Normalizes 16-bit signed PCM to float in `[-1.0, 1.0]` (spec.md §4.3).
#[must_use]
pub fn normalize_i16(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| f32::from(s) / 32768.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_at_48khz_is_identity() {
        let mut r = Resampler::new(2, 48_000, None).unwrap();
        let input = vec![0.1, -0.2, 0.3, -0.4];
        let out = r.process(&input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn normalize_i16_maps_extremes_near_unit_range() {
        let out = normalize_i16(&[i16::MIN, 0, i16::MAX]);
        assert!((out[0] - (-1.0)).abs() < 1e-3);
        assert_eq!(out[1], 0.0);
        assert!(out[2] > 0.99 && out[2] < 1.0);
    }

    #[test]
    fn converting_produces_roughly_scaled_output_length() {
        let mut r = Resampler::new(1, 24_000, Some(3)).unwrap();
        let input: Vec<f32> = (0..2400).map(|i| (i as f32 * 0.01).sin()).collect();
        let out = r.process(&input).unwrap();
        // 24kHz -> 48kHz should roughly double the frame count.
        assert!(out.len() > input.len());
    }
}
