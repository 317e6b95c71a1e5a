use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::common::types::{ContentCode, Language, QualityTier, SessionId};

/// Lifecycle of one playback session.
///
/// `Idle -> Resolving -> Attached -> Playing <-> Buffering`, with
/// `Stalled -> Recovering -> Attached` on watchdog trips, terminating in
/// `Ended` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Idle,
    Resolving,
    Attached,
    Playing,
    Buffering,
    Stalled,
    Recovering,
    Ended,
    Failed,
}

/// Terminal failure taxonomy surfaced to the UI layer. Every kind except
/// `Aborted` maps to a retry affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    NoSource,
    UpstreamUnavailable,
    FormatUnsupported,
    DecodeError,
    NetworkError,
    Aborted,
}

impl FailureKind {
    pub fn retryable(&self) -> bool {
        !matches!(self, Self::Aborted)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NoSource => "No stream URL available for this episode",
            Self::UpstreamUnavailable => "The streaming provider is unreachable",
            Self::FormatUnsupported => "HLS playback is not supported here",
            Self::DecodeError => "The stream could not be decoded",
            Self::NetworkError => "Playback kept stalling on network errors",
            Self::Aborted => "Playback was aborted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureView {
    pub kind: FailureKind,
    pub message: String,
    pub retryable: bool,
}

impl From<FailureKind> for FailureView {
    fn from(kind: FailureKind) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            retryable: kind.retryable(),
        }
    }
}

/// Stall bookkeeping. Timers reset on every successful reattachment; the
/// retry budget survives until playback genuinely advances again or the
/// user asks for a fresh start.
#[derive(Debug, Clone)]
pub struct WatchdogState {
    pub last_position: f64,
    pub last_progress_at: Instant,
    pub retry_count: u32,
}

impl WatchdogState {
    pub fn new(position: f64) -> Self {
        Self {
            last_position: position,
            last_progress_at: Instant::now(),
            retry_count: 0,
        }
    }

    /// Timer reset after a reattach, keeping the retry budget.
    pub fn reattached(&mut self, position: f64) {
        self.last_position = position;
        self.last_progress_at = Instant::now();
    }
}

/// Full session state as returned by REST endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub session_id: SessionId,
    pub state: SessionState,
    pub code: Option<ContentCode>,
    pub episode: Option<u32>,
    pub lang: Option<Language>,
    pub title: Option<String>,
    pub quality: QualityTier,
    /// Playback position in seconds.
    pub position: f64,
    pub duration: Option<f64>,
    pub paused: bool,
    pub auto_next: bool,
    pub retry_count: u32,
    pub failure: Option<FailureView>,
    /// Unix timestamp in milliseconds.
    pub time: u64,
}

/// Request body for PATCH /v1/sessions/{sessionId}/player.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdateRequest {
    #[serde(default)]
    pub code: Option<ContentCode>,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub lang: Option<Language>,
    #[serde(default)]
    pub quality: Option<QualityTier>,
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub auto_next: Option<bool>,
}

/// Events pushed to the session's embedder.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    #[serde(rename = "stateChanged")]
    StateChanged { state: SessionState },

    #[serde(rename = "playbackFailed")]
    PlaybackFailed { failure: FailureView },

    /// Playback ended with auto-next enabled and a next episode known.
    /// Navigation itself is the caller's business.
    #[serde(rename = "navigateNext")]
    NavigateNext {
        code: ContentCode,
        episode: u32,
        lang: Language,
    },
}
