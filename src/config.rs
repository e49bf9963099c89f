//! Ambient configuration: typed settings with defaults, plus the one
//! environment-variable escape hatch the teacher's own `config.rs` uses
//! (`RESAMPLE_QUALITY` read once via a lazily-initialized static).

use std::sync::OnceLock;

use crate::error::Result;

/// Default resampler quality (0-10) when the caller does not override it.
const DEFAULT_RESAMPLE_QUALITY: usize = 4;

/// Resampler quality, read once from `OGGOPUS_RESAMPLE_QUALITY` if set,
/// falling back to [`DEFAULT_RESAMPLE_QUALITY`].
#[must_use]
pub fn resample_quality() -> usize {
    static QUALITY: OnceLock<usize> = OnceLock::new();
    *QUALITY.get_or_init(|| {
        std::env::var("OGGOPUS_RESAMPLE_QUALITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RESAMPLE_QUALITY)
    })
}

/// Opus application profile (spec.md §6 codec settings).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    Voip,
    Audio,
    LowDelay,
}

/// Codec-facing knobs forwarded to the Opus encoder (spec.md §6).
#[derive(Debug, Clone)]
pub struct OpusSettings {
    pub application: Application,
    pub bitrate: Option<i32>,
    pub vbr: bool,
    pub complexity: u8,
    pub fec: bool,
    pub dtx: bool,
    pub lsb_depth: u8,
    /// Frame duration in milliseconds: one of 2.5, 5, 10, 20, 40, 60,
    /// 80, 100, 120.
    pub frame_duration_ms: f32,
}

impl Default for OpusSettings {
    fn default() -> Self {
        Self {
            application: Application::Audio,
            bitrate: None,
            vbr: true,
            complexity: 10,
            fec: false,
            dtx: false,
            lsb_depth: 24,
            frame_duration_ms: 20.0,
        }
    }
}

/// Muxer-facing knobs (spec.md §6).
#[derive(Debug, Clone)]
pub struct EncoderSettings {
    /// Sample look-ahead, in 48 kHz samples, before encoding a frame.
    pub decision_delay: u64,
    /// Maximum 48 kHz samples buffered in the packer before a forced flush.
    pub muxing_delay: u64,
    /// Bytes of padding appended to the comment packet.
    pub comment_padding: u32,
    pub opus: OpusSettings,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            decision_delay: crate::staging::MAX_LOOKAHEAD as u64,
            muxing_delay: crate::packer::DEFAULT_MUXING_DELAY,
            comment_padding: 512,
            opus: OpusSettings::default(),
        }
    }
}

impl EncoderSettings {
    /// Validates ranges the constructor cannot enforce via the type alone.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BadArg`] if `complexity` is out of `0..=10`.
    pub fn validate(&self) -> Result<()> {
        if self.opus.complexity > 10 {
            return Err(crate::Error::BadArg("opus complexity must be 0..=10"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_values() {
        let settings = EncoderSettings::default();
        assert_eq!(settings.decision_delay, 96_000);
        assert_eq!(settings.muxing_delay, 48_000);
        assert_eq!(settings.comment_padding, 512);
    }

    #[test]
    fn validate_rejects_out_of_range_complexity() {
        let mut settings = EncoderSettings::default();
        settings.opus.complexity = 11;
        assert!(settings.validate().is_err());
    }
}
