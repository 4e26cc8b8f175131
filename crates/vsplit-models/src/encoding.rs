//! Per-segment encoding options.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_VIDEO_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_VIDEO_CRF: u8 = 23;
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Highest CRF accepted by x264/x265
pub const MAX_VIDEO_CRF: u8 = 51;

/// Invalid encoding option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("video_crf must be between 0 and 51, got {0}")]
    CrfOutOfRange(u8),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Encoding settings applied to every segment of a split job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingOptions {
    /// Video codec (e.g., "libx264", "libx265")
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_video_preset")]
    pub video_preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_video_crf")]
    pub video_crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate (e.g., "128k")
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_video_preset() -> String {
    DEFAULT_VIDEO_PRESET.to_string()
}
fn default_video_crf() -> u8 {
    DEFAULT_VIDEO_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            video_preset: default_video_preset(),
            video_crf: DEFAULT_VIDEO_CRF,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

impl EncodingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.video_crf = crf;
        self
    }

    /// Returns a new config with updated video codec and preset.
    pub fn with_video(mut self, codec: impl Into<String>, preset: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self.video_preset = preset.into();
        self
    }

    /// Returns a new config with updated audio codec and bitrate.
    pub fn with_audio(mut self, codec: impl Into<String>, bitrate: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self.audio_bitrate = bitrate.into();
        self
    }

    /// Check the options before any process is spawned with them.
    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.video_crf > MAX_VIDEO_CRF {
            return Err(EncodingError::CrfOutOfRange(self.video_crf));
        }
        for (name, value) in [
            ("video_codec", &self.video_codec),
            ("video_preset", &self.video_preset),
            ("audio_codec", &self.audio_codec),
            ("audio_bitrate", &self.audio_bitrate),
        ] {
            if value.trim().is_empty() {
                return Err(EncodingError::Empty(name));
            }
        }
        Ok(())
    }
}
