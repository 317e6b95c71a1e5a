use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use tokio::time::{Duration, Instant, MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::player::element::{ElementEvent, MediaElement, MediaErrorKind};
use crate::player::state::{FailureKind, SessionEvent, SessionState};

use super::{PlayerDeps, SharedSession, failure_kind_of, start::attach_current, write_progress};

/// Position delta below which a tick counts as "no advance".
const PROGRESS_EPSILON: f64 = 0.01;

pub struct MonitorCtx {
    pub session: SharedSession,
    pub deps: Arc<PlayerDeps>,
    pub element: Arc<dyn MediaElement>,
    pub element_events: flume::Receiver<ElementEvent>,
    pub stop_signal: Arc<AtomicBool>,
}

enum Flow {
    Continue,
    Stop,
}

/// Per-session watchdog: a 1s poll of playback position interleaved with
/// the element's own signals. Declares a stall when position freezes past
/// the configured thresholds and drives bounded recovery.
pub async fn monitor_loop(ctx: MonitorCtx) {
    let MonitorCtx {
        session,
        deps,
        element,
        element_events,
        stop_signal,
    } = ctx;

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if stop_signal.load(Ordering::SeqCst) {
            break;
        }

        let flow = tokio::select! {
            _ = ticker.tick() => handle_tick(&session, &deps, &element).await,
            ev = element_events.recv_async() => match ev {
                Ok(event) => handle_event(&session, &deps, &element, event).await,
                Err(_) => break,
            },
        };

        if matches!(flow, Flow::Stop) {
            break;
        }
    }
}

async fn handle_tick(
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
    element: &Arc<dyn MediaElement>,
) -> Flow {
    let now = Instant::now();
    let stall_cause;
    {
        let mut s = session.write().await;
        match s.state {
            SessionState::Ended | SessionState::Failed | SessionState::Idle => return Flow::Stop,
            _ => {}
        }

        let position = element.position();
        if position > s.watchdog.last_position + PROGRESS_EPSILON {
            s.watchdog.last_position = position;
            s.watchdog.last_progress_at = now;
            s.position = position;
            // Genuine forward progress is the end of a recovery episode.
            s.watchdog.retry_count = 0;
            if matches!(
                s.state,
                SessionState::Attached | SessionState::Buffering | SessionState::Stalled
            ) {
                s.set_state(SessionState::Playing);
            }
            if !s.paused
                && now.duration_since(s.last_progress_write)
                    >= Duration::from_millis(deps.config.progress_interval_ms)
            {
                write_progress(&mut s, deps);
            }
            return Flow::Continue;
        }

        // Position frozen. Paused sessions are supposed to be frozen.
        if s.paused {
            return Flow::Continue;
        }

        let frozen_for = now.duration_since(s.watchdog.last_progress_at);
        let claims_playing = element.claims_playing();
        let stalled = (claims_playing
            && frozen_for >= Duration::from_secs(deps.config.stall_playing_secs))
            || frozen_for >= Duration::from_secs(deps.config.stall_hard_secs);
        if !stalled {
            return Flow::Continue;
        }

        warn!(
            "[{}] Stall: no progress for {:?} (claims playing: {})",
            s.session_id, frozen_for, claims_playing
        );
        s.set_state(SessionState::Stalled);
        stall_cause = FailureKind::NetworkError;
    }

    recover(session, deps, stall_cause).await
}

async fn handle_event(
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
    element: &Arc<dyn MediaElement>,
    event: ElementEvent,
) -> Flow {
    match event {
        ElementEvent::Waiting => {
            let mut s = session.write().await;
            if matches!(s.state, SessionState::Playing | SessionState::Attached) {
                s.set_state(SessionState::Buffering);
            }
            Flow::Continue
        }
        ElementEvent::Playing => {
            let mut s = session.write().await;
            s.watchdog.last_progress_at = Instant::now();
            if !matches!(s.state, SessionState::Ended | SessionState::Failed) {
                s.set_state(SessionState::Playing);
            }
            Flow::Continue
        }
        ElementEvent::Ended => {
            let mut s = session.write().await;
            if let Some(d) = element.duration() {
                s.position = d;
            }
            write_progress(&mut s, deps);
            s.set_state(SessionState::Ended);

            if s.auto_next {
                if let Some(descriptor) = &s.descriptor {
                    let next = descriptor.episode + 1;
                    if descriptor.total.is_some_and(|total| next <= total) {
                        info!("[{}] Auto-advancing to episode {}", s.session_id, next);
                        s.emit(SessionEvent::NavigateNext {
                            code: descriptor.code.clone(),
                            episode: next,
                            lang: descriptor.lang.clone(),
                        });
                    }
                }
            }
            Flow::Stop
        }
        ElementEvent::Error(MediaErrorKind::Aborted) => {
            session.write().await.fail(FailureKind::Aborted);
            Flow::Stop
        }
        ElementEvent::Error(kind) => {
            let cause = match kind {
                MediaErrorKind::Decode => FailureKind::DecodeError,
                _ => FailureKind::NetworkError,
            };
            {
                let mut s = session.write().await;
                warn!("[{}] Element error: {:?}", s.session_id, kind);
                s.set_state(SessionState::Stalled);
            }
            recover(session, deps, cause).await
        }
    }
}

/// Smart retry: one bounded recovery attempt. Re-resolves a fresh
/// descriptor (the cached URL may be the one that just died), reattaches
/// at the preserved position and intent, and resets the stall timers.
async fn recover(session: &SharedSession, deps: &Arc<PlayerDeps>, cause: FailureKind) -> Flow {
    let key = {
        let mut s = session.write().await;
        if s.watchdog.retry_count >= deps.config.max_recoveries {
            warn!(
                "[{}] Recovery budget exhausted ({} attempts)",
                s.session_id, s.watchdog.retry_count
            );
            s.fail(cause);
            return Flow::Stop;
        }
        s.watchdog.retry_count += 1;
        s.set_state(SessionState::Recovering);
        match s.key.clone() {
            Some(key) => key,
            None => {
                s.fail(FailureKind::NoSource);
                return Flow::Stop;
            }
        }
    };

    let resume_at = {
        let s = session.read().await;
        s.watchdog.last_position.max(s.position)
    };

    let attached = match deps.resolution.resolve_fresh(&key).await {
        Ok(descriptor) => {
            session.write().await.descriptor = Some(descriptor);
            attach_current(session, deps, Some(resume_at)).await
        }
        Err(e) => {
            warn!("[{}] Recovery resolve failed: {}", key, e);
            Err(failure_kind_of(&e))
        }
    };

    let mut s = session.write().await;
    match attached {
        Ok(()) => {
            s.watchdog.reattached(resume_at);
            s.set_state(SessionState::Attached);
            info!(
                "[{}] Recovered at {:.1}s (attempt {})",
                s.session_id, resume_at, s.watchdog.retry_count
            );
            Flow::Continue
        }
        Err(kind) => {
            if s.watchdog.retry_count >= deps.config.max_recoveries {
                s.fail(kind);
                return Flow::Stop;
            }
            // Budget left: rearm the stall clock and let the watchdog
            // declare the next attempt.
            s.watchdog.reattached(resume_at);
            s.set_state(SessionState::Buffering);
            Flow::Continue
        }
    }
}
