use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::time::Instant;
use tracing::debug;

use crate::common::types::{QualityTier, SessionId, now_ms};
use crate::upstream::{PlayDescriptor, ResolutionKey};

use super::element::MediaElement;
use super::state::{
    FailureKind, PlayerView, SessionEvent, SessionState, WatchdogState,
};

/// Mutable state of one playback session. Guarded by a `tokio::sync::RwLock`
/// in the session map; the watchdog task and the REST handlers share it.
pub struct SessionContext {
    pub session_id: SessionId,
    pub element: Arc<dyn MediaElement>,
    pub state: SessionState,
    pub key: Option<ResolutionKey>,
    pub descriptor: Option<PlayDescriptor>,
    pub quality: QualityTier,
    /// Play/pause intent, preserved across recoveries.
    pub paused: bool,
    pub auto_next: bool,
    /// Last observed playback position in seconds.
    pub position: f64,
    pub failure: Option<FailureKind>,
    pub watchdog: WatchdogState,
    pub stop_signal: Arc<AtomicBool>,
    pub watchdog_task: Option<tokio::task::JoinHandle<()>>,
    pub last_progress_write: Instant,
    pub events: flume::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(
        session_id: SessionId,
        element: Arc<dyn MediaElement>,
        auto_next: bool,
        default_quality: QualityTier,
        events: flume::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session_id,
            element,
            state: SessionState::Idle,
            key: None,
            descriptor: None,
            quality: default_quality,
            paused: false,
            auto_next,
            position: 0.0,
            failure: None,
            watchdog: WatchdogState::new(0.0),
            stop_signal: Arc::new(AtomicBool::new(false)),
            watchdog_task: None,
            last_progress_write: Instant::now(),
            events,
        }
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!("[{}] {:?} -> {:?}", self.session_id, self.state, state);
        self.state = state;
        self.emit(SessionEvent::StateChanged { state });
    }

    /// Terminal failure: stop recovering, surface the cause, and (except
    /// for user aborts) leave a retry affordance armed.
    pub fn fail(&mut self, kind: FailureKind) {
        self.failure = Some(kind);
        self.set_state(SessionState::Failed);
        self.emit(SessionEvent::PlaybackFailed {
            failure: kind.into(),
        });
    }

    /// Signals the current watchdog task to wind down and aborts it.
    /// Call before any reattach so two watchdogs never race one element.
    pub fn stop_watchdog(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(task) = self.watchdog_task.take() {
            task.abort();
        }
        self.stop_signal = Arc::new(AtomicBool::new(false));
    }

    pub fn to_player_response(&self) -> PlayerView {
        PlayerView {
            session_id: self.session_id.clone(),
            state: self.state,
            code: self.key.as_ref().map(|k| k.code.clone()),
            episode: self.key.as_ref().map(|k| k.ep),
            lang: self.key.as_ref().map(|k| k.lang.clone()),
            title: self.descriptor.as_ref().and_then(|d| d.title.clone()),
            quality: self.quality,
            position: self.position,
            duration: self.element.duration(),
            paused: self.paused,
            auto_next: self.auto_next,
            retry_count: self.watchdog.retry_count,
            failure: self.failure.map(Into::into),
            time: now_ms(),
        }
    }
}
