use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::common::types::{AnyResult, SessionId};
use crate::configs::Config;
use crate::history::ContinueStore;
use crate::player::manager::{self, PlayerDeps, SharedSession};
use crate::player::{MediaElement, SessionContext, SessionEvent};
use crate::upstream::{CatalogService, PlayResolution, UpstreamClient};

/// Top-level application state.
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogService,
    pub deps: Arc<PlayerDeps>,
    pub sessions: DashMap<String, SharedSession>,
}

impl AppState {
    pub fn new(config: Config) -> AnyResult<Arc<Self>> {
        let client = Arc::new(UpstreamClient::new(&config.upstream)?);
        let resolution = Arc::new(PlayResolution::new(
            client.clone(),
            config.upstream.prefer_proxy,
        ));
        let history = Arc::new(ContinueStore::open(&config.history.path));
        let deps = Arc::new(PlayerDeps {
            resolution,
            history,
            config: config.playback.clone(),
        });

        Ok(Arc::new(Self {
            config,
            catalog: CatalogService::new(client),
            deps,
            sessions: DashMap::new(),
        }))
    }

    /// Register a playback session for an embedder-provided element.
    /// Returns the id REST callers address it by, and the event stream
    /// the embedder reacts to (state changes, failures, auto-next).
    pub fn create_session(
        &self,
        element: Arc<dyn MediaElement>,
    ) -> (SessionId, flume::Receiver<SessionEvent>) {
        let session_id = SessionId::generate();
        let (tx, rx) = flume::unbounded();
        let ctx = SessionContext::new(
            session_id.clone(),
            element,
            self.config.playback.auto_next,
            self.config.playback.default_quality,
            tx,
        );
        self.sessions.insert(
            session_id.to_string(),
            Arc::new(tokio::sync::RwLock::new(ctx)),
        );
        info!("Session created: {}", session_id);
        (session_id, rx)
    }

    pub fn session(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Tear a session down and drop it from the map.
    pub async fn destroy_session(&self, session_id: &str) -> bool {
        let Some((_, session)) = self.sessions.remove(session_id) else {
            return false;
        };
        manager::destroy_session(&session, &self.deps).await;
        info!("Session destroyed: {}", session_id);
        true
    }
}
