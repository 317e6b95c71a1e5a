use serde::{Deserialize, Serialize};

use crate::common::types::QualityTier;

/// Timing contracts and retry budget for playback sessions.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Stall threshold while the element claims to be playing.
    pub stall_playing_secs: u64,
    /// Stall threshold regardless of the element's claimed state.
    pub stall_hard_secs: u64,
    /// Automatic recoveries before the session surfaces a terminal failure.
    pub max_recoveries: u32,
    /// How long a native-HLS attach may take to become ready.
    pub probe_timeout_secs: u64,
    /// Minimum wall time between progress writes during playback.
    pub progress_interval_ms: u64,
    /// Advance to the next episode when playback ends.
    pub auto_next: bool,
    pub default_quality: QualityTier,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            stall_playing_secs: 8,
            stall_hard_secs: 12,
            max_recoveries: 3,
            probe_timeout_secs: 4,
            progress_interval_ms: 1500,
            auto_next: true,
            default_quality: QualityTier::Q720,
        }
    }
}
