use std::sync::Arc;

use tokio::time::Instant;
use tracing::info;

use crate::common::types::{Language, QualityTier};
use crate::player::state::{PlayerUpdateRequest, PlayerView, SessionState};
use crate::upstream::ResolutionKey;

use super::{
    PlayerDeps, SharedSession,
    start::{attach_current, spawn_watchdog, start_playback},
    write_progress,
};

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("an episode target requires a content code")]
    MissingCode,
    #[error("nothing to retry: the session never resolved an episode")]
    NothingToRetry,
}

/// Apply a PATCH body to the session. Navigation fields (code/episode)
/// restart playback; the rest adjust the running session in place.
pub async fn update_session(
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
    req: PlayerUpdateRequest,
) -> Result<PlayerView, ControlError> {
    if let Some(auto) = req.auto_next {
        session.write().await.auto_next = auto;
    }

    if req.code.is_some() || req.episode.is_some() {
        let key = {
            let s = session.read().await;
            let current = s.key.clone();
            let code = req
                .code
                .clone()
                .or_else(|| current.as_ref().map(|k| k.code.clone()))
                .ok_or(ControlError::MissingCode)?;
            let ep = match req.episode {
                Some(ep) => ep,
                // A bare code means "play this title from the start".
                None => 1,
            };
            let lang =
                Language::or_default(req.lang.clone().or_else(|| current.map(|k| k.lang)));
            ResolutionKey { lang, code, ep }
        };
        {
            let mut s = session.write().await;
            if let Some(q) = req.quality {
                s.quality = q;
            }
            if let Some(p) = req.paused {
                s.paused = p;
            }
        }
        start_playback(session.clone(), deps.clone(), key).await;
        if let Some(pos) = req.position {
            seek(session, pos).await;
        }
    } else {
        if let Some(q) = req.quality {
            switch_quality(session, deps, q).await;
        }
        if let Some(pos) = req.position {
            seek(session, pos).await;
        }
        if let Some(p) = req.paused {
            set_paused(session, deps, p).await;
        }
    }

    Ok(session.read().await.to_player_response())
}

/// Fresh start after a terminal failure: full retry budget, same episode.
pub async fn retry_session(
    session: &SharedSession,
    deps: &Arc<PlayerDeps>,
) -> Result<PlayerView, ControlError> {
    let key = {
        let s = session.read().await;
        s.key.clone().ok_or(ControlError::NothingToRetry)?
    };
    info!("Manual retry requested for {}", key);
    start_playback(session.clone(), deps.clone(), key).await;
    Ok(session.read().await.to_player_response())
}

/// Tear the session down, writing a final continue-watching entry for
/// whatever was on screen.
pub async fn destroy_session(session: &SharedSession, deps: &Arc<PlayerDeps>) {
    let mut s = session.write().await;
    s.stop_watchdog();
    if !matches!(s.state, SessionState::Idle | SessionState::Failed) {
        s.position = s.element.position().max(s.position);
        write_progress(&mut s, deps);
    }
    s.element.detach();
    s.set_state(SessionState::Idle);
}

/// Rebind the element at a different quality tier, preserving position
/// and play/pause intent. Not a recovery: the retry budget is untouched.
pub async fn switch_quality(session: &SharedSession, deps: &Arc<PlayerDeps>, quality: QualityTier) {
    let resume_at = {
        let mut s = session.write().await;
        if s.quality == quality || s.descriptor.is_none() {
            s.quality = quality;
            return;
        }
        s.stop_watchdog();
        s.quality = quality;
        s.element.position().max(s.position)
    };

    match attach_current(session, deps, Some(resume_at)).await {
        Ok(()) => {
            let mut s = session.write().await;
            s.watchdog.reattached(resume_at);
            s.set_state(SessionState::Attached);
            info!(
                "[{}] Switched to {} at {:.1}s",
                s.session_id, quality, resume_at
            );
            spawn_watchdog(&mut s, session, deps);
        }
        Err(kind) => {
            session.write().await.fail(kind);
        }
    }
}

pub async fn seek(session: &SharedSession, position: f64) {
    let mut s = session.write().await;
    let position = position.max(0.0);
    s.element.seek(position);
    s.position = position;
    // A seek is deliberate; do not let the watchdog read it as a stall.
    s.watchdog.last_position = position;
    s.watchdog.last_progress_at = Instant::now();
}

/// Pause writes progress unconditionally so a quit right after pausing
/// still lands in continue-watching.
pub async fn set_paused(session: &SharedSession, deps: &Arc<PlayerDeps>, paused: bool) {
    let mut s = session.write().await;
    s.paused = paused;
    if paused {
        s.element.pause();
        s.position = s.element.position().max(s.position);
        write_progress(&mut s, deps);
    } else {
        s.element.play();
        s.watchdog.last_progress_at = Instant::now();
    }
}
