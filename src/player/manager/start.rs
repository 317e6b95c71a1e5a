use std::sync::Arc;

use tokio::time::{Duration, Instant, sleep};
use tracing::{info, warn};

use crate::player::context::SessionContext;
use crate::player::element::{AttachMode, MediaElement};
use crate::player::state::{FailureKind, SessionState, WatchdogState};
use crate::upstream::ResolutionKey;

use super::{
    PlayerDeps, SharedSession, failure_kind_of,
    monitor::{MonitorCtx, monitor_loop},
};

/// Resume only when meaningfully into the episode and not effectively at
/// the end (`duration - 0.7s`).
fn resume_position(start_at: f64, duration: Option<f64>) -> Option<f64> {
    if start_at <= 1.0 || !start_at.is_finite() {
        return None;
    }
    match duration {
        Some(d) if d > 0.0 && start_at >= d - 0.7 => None,
        _ => Some(start_at),
    }
}

/// Poll the element until the source is playable, bounded by the format
/// probe timeout.
async fn wait_ready(element: &Arc<dyn MediaElement>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if element.is_ready() {
            return true;
        }
        sleep(Duration::from_millis(100)).await;
    }
    element.is_ready()
}

/// Bind the session's current descriptor/quality to its element and seek
/// into position. Does not spawn or touch the watchdog; callers reset it.
///
/// `start_at` overrides the continue-watching restore (used by recovery
/// and quality switches to preserve the live position).
pub(super) async fn attach_current(
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
    start_at: Option<f64>,
) -> Result<(), FailureKind> {
    let (element, descriptor, quality, paused, session_id) = {
        let s = session.read().await;
        let descriptor = s.descriptor.clone().ok_or(FailureKind::NoSource)?;
        (
            s.element.clone(),
            descriptor,
            s.quality,
            s.paused,
            s.session_id.clone(),
        )
    };

    let (tier, url) = descriptor
        .variant_or_any(quality)
        .ok_or(FailureKind::NoSource)?;
    if tier != quality {
        warn!(
            "[{}] Quality {} unavailable, using {}",
            session_id, quality, tier
        );
    }

    let native = element.supports_native_hls();
    if !native && !element.supports_hls_engine() {
        return Err(FailureKind::FormatUnsupported);
    }

    element.detach();
    element.pause();

    if native {
        element.attach(url, AttachMode::NativeHls);
        let probe = Duration::from_secs(deps.config.probe_timeout_secs);
        if !wait_ready(&element, probe).await {
            // Native probe timed out; fall through to the bundled engine
            // when there is one.
            if !element.supports_hls_engine() {
                return Err(FailureKind::FormatUnsupported);
            }
            element.detach();
            element.attach(url, AttachMode::HlsEngine);
        }
    } else {
        element.attach(url, AttachMode::HlsEngine);
    }

    let restored = start_at.or_else(|| {
        deps.history
            .find(&descriptor.code, descriptor.episode)
            .and_then(|e| resume_position(e.time, element.duration().or(Some(e.duration))))
    });
    if let Some(t) = restored {
        element.seek(t);
    }

    if paused {
        element.pause();
    } else {
        element.play();
    }

    let mut s = session.write().await;
    s.position = restored.unwrap_or(0.0);
    Ok(())
}

/// Tear down whatever was playing, resolve `key` and start a monitored
/// playback session for it.
pub async fn start_playback(session: SharedSession, deps: Arc<PlayerDeps>, key: ResolutionKey) {
    {
        let mut s = session.write().await;
        s.stop_watchdog();
        s.element.detach();
        s.failure = None;
        s.descriptor = None;
        s.key = Some(key.clone());
        s.set_state(SessionState::Resolving);
    }

    let descriptor = match deps.resolution.resolve_cached(&key).await {
        Ok((descriptor, cached)) => {
            info!("Playback starting: {} (cached: {})", key, cached);
            descriptor
        }
        Err(e) => {
            warn!("Failed to resolve {}: {} (status {:?})", key, e, e.status());
            session.write().await.fail(failure_kind_of(&e));
            return;
        }
    };

    session.write().await.descriptor = Some(descriptor);

    if let Err(kind) = attach_current(&session, &deps, None).await {
        session.write().await.fail(kind);
        return;
    }

    let mut s = session.write().await;
    let position = s.position;
    s.watchdog = WatchdogState::new(position);
    s.set_state(SessionState::Attached);
    spawn_watchdog(&mut s, &session, &deps);
}

/// Arm a fresh watchdog task for the session. The caller must have
/// stopped any previous one (`stop_watchdog`) first.
pub(super) fn spawn_watchdog(
    s: &mut SessionContext,
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
) {
    let ctx = MonitorCtx {
        session: session.clone(),
        deps: deps.clone(),
        element: s.element.clone(),
        element_events: s.element.events(),
        stop_signal: s.stop_signal.clone(),
    };
    s.watchdog_task = Some(tokio::spawn(monitor_loop(ctx)));
}
