pub mod control;
pub mod monitor;
pub mod start;

#[cfg(test)]
mod tests;

pub use control::{destroy_session, retry_session, update_session};
pub use start::start_playback;

use std::sync::Arc;

use tokio::time::Instant;

use crate::common::types::SharedRw;
use crate::configs::PlaybackConfig;
use crate::history::{ContinueEntry, ContinueStore};
use crate::player::context::SessionContext;
use crate::player::state::FailureKind;
use crate::upstream::{PlayResolution, UpstreamError};

/// Everything a session needs besides its own state: the resolver chain,
/// the continue-watching store and the timing contracts.
pub struct PlayerDeps {
    pub resolution: Arc<PlayResolution>,
    pub history: Arc<ContinueStore>,
    pub config: PlaybackConfig,
}

pub type SharedSession = SharedRw<SessionContext>;

pub(crate) fn failure_kind_of(err: &UpstreamError) -> FailureKind {
    match err {
        UpstreamError::NoVariants => FailureKind::NoSource,
        _ => FailureKind::UpstreamUnavailable,
    }
}

/// Write the session's position to the continue-watching store.
/// Throttling is the caller's business; this always writes.
pub(crate) fn write_progress(session: &mut SessionContext, deps: &PlayerDeps) {
    let Some(descriptor) = &session.descriptor else {
        return;
    };
    let duration = session.element.duration().unwrap_or(0.0);
    deps.history.upsert(ContinueEntry {
        code: descriptor.code.clone(),
        ep: descriptor.episode,
        time: session.position,
        duration,
        title: descriptor.title.clone(),
        cover: descriptor.cover.clone(),
        lang: Some(descriptor.lang.clone()),
        updated_at: 0,
    });
    session.last_progress_write = Instant::now();
}
