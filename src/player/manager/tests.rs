use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant, sleep};

use crate::common::types::{QualityTier, SessionId};
use crate::configs::PlaybackConfig;
use crate::history::ContinueStore;
use crate::player::context::SessionContext;
use crate::player::element::{AttachMode, ElementEvent, MediaElement, MediaErrorKind};
use crate::player::state::{FailureKind, SessionEvent, SessionState};
use crate::upstream::{PlayDescriptor, PlayResolution, PlayResolver, ResolutionKey, UpstreamError};

use super::control::{retry_session, set_paused, switch_quality};
use super::start::start_playback;
use super::{PlayerDeps, SharedSession};

/// Media element whose position advances with (virtual) time while
/// playing, unless frozen. Freezing while still claiming to play is the
/// stall scenario the watchdog exists for.
struct FakeElement {
    native: bool,
    engine: bool,
    /// Whether a native-HLS attach ever becomes playable (format probe).
    native_ready: bool,
    inner: parking_lot::Mutex<FakeInner>,
    tx: flume::Sender<ElementEvent>,
    rx: flume::Receiver<ElementEvent>,
}

struct FakeInner {
    base: f64,
    playing_since: Option<Instant>,
    frozen: bool,
    attached: Option<(String, AttachMode)>,
    attach_count: u32,
}

impl FakeElement {
    fn new() -> Arc<Self> {
        Self::with_modes(false, true, true)
    }

    fn with_modes(native: bool, engine: bool, native_ready: bool) -> Arc<Self> {
        let (tx, rx) = flume::unbounded();
        Arc::new(Self {
            native,
            engine,
            native_ready,
            inner: parking_lot::Mutex::new(FakeInner {
                base: 0.0,
                playing_since: None,
                frozen: false,
                attached: None,
                attach_count: 0,
            }),
            tx,
            rx,
        })
    }

    fn current(inner: &FakeInner) -> f64 {
        match inner.playing_since {
            Some(t) if !inner.frozen => inner.base + t.elapsed().as_secs_f64(),
            _ => inner.base,
        }
    }

    /// Stop advancing position without changing the claimed state.
    fn freeze(&self) {
        let mut i = self.inner.lock();
        i.base = Self::current(&i);
        i.frozen = true;
    }

    fn emit(&self, event: ElementEvent) {
        let _ = self.tx.send(event);
    }

    fn attach_count(&self) -> u32 {
        self.inner.lock().attach_count
    }

    fn attached_url(&self) -> Option<String> {
        self.inner.lock().attached.as_ref().map(|(u, _)| u.clone())
    }

    fn attached_mode(&self) -> Option<AttachMode> {
        self.inner.lock().attached.as_ref().map(|(_, m)| *m)
    }
}

impl MediaElement for FakeElement {
    fn supports_native_hls(&self) -> bool {
        self.native
    }

    fn supports_hls_engine(&self) -> bool {
        self.engine
    }

    fn attach(&self, url: &str, mode: AttachMode) {
        let mut i = self.inner.lock();
        i.attached = Some((url.to_string(), mode));
        i.attach_count += 1;
        i.frozen = false;
    }

    fn detach(&self) {
        let mut i = self.inner.lock();
        i.attached = None;
        i.base = 0.0;
        i.playing_since = None;
    }

    fn play(&self) {
        let mut i = self.inner.lock();
        if i.playing_since.is_none() {
            i.playing_since = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut i = self.inner.lock();
        i.base = Self::current(&i);
        i.playing_since = None;
    }

    fn seek(&self, position_secs: f64) {
        let mut i = self.inner.lock();
        i.base = position_secs;
        if i.playing_since.is_some() {
            i.playing_since = Some(Instant::now());
        }
    }

    fn position(&self) -> f64 {
        Self::current(&self.inner.lock())
    }

    fn duration(&self) -> Option<f64> {
        Some(100.0)
    }

    fn is_ready(&self) -> bool {
        match self.inner.lock().attached {
            Some((_, AttachMode::NativeHls)) => self.native_ready,
            Some(_) => true,
            None => false,
        }
    }

    fn claims_playing(&self) -> bool {
        self.inner.lock().playing_since.is_some()
    }

    fn events(&self) -> flume::Receiver<ElementEvent> {
        self.rx.clone()
    }
}

/// Resolver failing calls outside the `[fail_first, fail_from)` success
/// window with 503; counts every call.
struct ScriptedResolver {
    calls: AtomicU32,
    fail_first: u32,
    fail_from: u32,
}

impl ScriptedResolver {
    fn new(fail_first: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            fail_first,
            fail_from: u32::MAX,
        })
    }

    /// Succeeds for the first `fail_from` calls, fails afterwards.
    fn failing_from(fail_from: u32) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
            fail_first: 0,
            fail_from,
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayResolver for Arc<ScriptedResolver> {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn resolve(&self, key: &ResolutionKey) -> Result<PlayDescriptor, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first || n >= self.fail_from {
            return Err(UpstreamError::Status {
                status: 503,
                body: "scripted outage".into(),
            });
        }
        let mut variants = BTreeMap::new();
        variants.insert(
            QualityTier::Q720,
            format!("http://cdn/{}-{}/720.m3u8", key.code, n),
        );
        variants.insert(
            QualityTier::Q1080,
            format!("http://cdn/{}-{}/1080.m3u8", key.code, n),
        );
        Ok(PlayDescriptor {
            code: key.code.clone(),
            episode: key.ep,
            lang: key.lang.clone(),
            title: Some("Show".into()),
            cover: None,
            total: Some(12),
            variants,
            expires_in: Some(60),
        })
    }
}

struct Harness {
    session: SharedSession,
    deps: Arc<PlayerDeps>,
    element: Arc<FakeElement>,
    resolver: Arc<ScriptedResolver>,
    events: flume::Receiver<SessionEvent>,
    _dir: tempfile::TempDir,
}

fn harness(fail_first: u32) -> Harness {
    harness_with(ScriptedResolver::new(fail_first))
}

fn harness_with(resolver: Arc<ScriptedResolver>) -> Harness {
    harness_full(resolver, FakeElement::new())
}

fn harness_full(resolver: Arc<ScriptedResolver>, element: Arc<FakeElement>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let deps = Arc::new(PlayerDeps {
        resolution: Arc::new(PlayResolution::with_resolvers(vec![Box::new(
            resolver.clone(),
        )])),
        history: Arc::new(ContinueStore::open(dir.path().join("continue.json"))),
        config: PlaybackConfig::default(),
    });
    let (tx, rx) = flume::unbounded();
    let ctx = SessionContext::new(
        SessionId::generate(),
        element.clone(),
        true,
        QualityTier::Q720,
        tx,
    );
    Harness {
        session: Arc::new(RwLock::new(ctx)),
        deps,
        element,
        resolver,
        events: rx,
        _dir: dir,
    }
}

fn key() -> ResolutionKey {
    ResolutionKey::new("en".into(), "ABC123".into(), 3)
}

async fn state_of(session: &SharedSession) -> SessionState {
    session.read().await.state
}

#[tokio::test(start_paused = true)]
async fn stall_while_claiming_playback_recovers_once() {
    let h = harness(0);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    assert_eq!(state_of(&h.session).await, SessionState::Attached);
    assert_eq!(h.element.attach_count(), 1);

    // Normal progress flips the session to Playing.
    sleep(Duration::from_secs(3)).await;
    assert_eq!(state_of(&h.session).await, SessionState::Playing);
    let frozen_at = h.element.position();

    // Freeze the element while it still claims to play: the 8s threshold
    // applies and exactly one recovery runs.
    h.element.freeze();
    sleep(Duration::from_secs(9)).await;

    assert_eq!(h.element.attach_count(), 2, "stall must reattach once");
    assert_eq!(h.resolver.calls(), 2, "recovery must re-resolve fresh URLs");

    // Position was preserved across the reattach and advances again.
    sleep(Duration::from_secs(3)).await;
    let s = h.session.read().await;
    assert_eq!(s.state, SessionState::Playing);
    assert!(s.position >= frozen_at, "recovery must not lose position");
    assert_eq!(s.watchdog.retry_count, 0, "progress clears the budget");
}

#[tokio::test(start_paused = true)]
async fn recovery_budget_exhaustion_fails_the_session() {
    // First resolve succeeds, every recovery resolve fails.
    let h = harness_with(ScriptedResolver::failing_from(1));
    start_playback(h.session.clone(), h.deps.clone(), key()).await;

    sleep(Duration::from_secs(2)).await;
    h.element.freeze();

    // Three failed recoveries, 8s of frozen playback apart.
    sleep(Duration::from_secs(40)).await;

    {
        let s = h.session.read().await;
        assert_eq!(s.state, SessionState::Failed);
        assert_eq!(s.failure, Some(FailureKind::UpstreamUnavailable));
        assert_eq!(s.watchdog.retry_count, h.deps.config.max_recoveries);
    }

    // Terminal: the watchdog is gone, nothing keeps resolving.
    let calls = h.resolver.calls();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.resolver.calls(), calls);

    let failed = h
        .events
        .drain()
        .filter(|e| matches!(e, SessionEvent::PlaybackFailed { .. }))
        .count();
    assert_eq!(failed, 1, "exactly one terminal failure event");
}

#[tokio::test(start_paused = true)]
async fn quality_switch_preserves_position_and_budget() {
    let h = harness(0);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    sleep(Duration::from_secs(5)).await;
    let before = h.element.position();
    assert!(before >= 4.0);

    switch_quality(&h.session, &h.deps, QualityTier::Q1080).await;

    let s = h.session.read().await;
    assert_eq!(s.quality, QualityTier::Q1080);
    assert!((s.position - before).abs() < 1.5, "position must survive");
    assert_eq!(s.watchdog.retry_count, 0, "a switch is not a retry");
    assert!(h.element.attached_url().unwrap().contains("1080"));
    drop(s);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(state_of(&h.session).await, SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn ended_writes_progress_and_requests_auto_next() {
    let h = harness(0);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    sleep(Duration::from_secs(2)).await;

    h.element.emit(ElementEvent::Ended);
    sleep(Duration::from_millis(50)).await;

    assert_eq!(state_of(&h.session).await, SessionState::Ended);

    let next = h.events.drain().find_map(|e| match e {
        SessionEvent::NavigateNext { episode, .. } => Some(episode),
        _ => None,
    });
    assert_eq!(next, Some(4), "auto-next must target the next episode");

    let entry = h.deps.history.find(&key().code, key().ep).unwrap();
    assert_eq!(entry.time, 100.0, "end writes the full duration");
}

#[tokio::test(start_paused = true)]
async fn abort_is_terminal_and_not_retryable() {
    let h = harness(0);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    sleep(Duration::from_secs(1)).await;

    h.element.emit(ElementEvent::Error(MediaErrorKind::Aborted));
    sleep(Duration::from_millis(50)).await;

    let s = h.session.read().await;
    assert_eq!(s.state, SessionState::Failed);
    assert_eq!(s.failure, Some(FailureKind::Aborted));
    assert!(!s.failure.unwrap().retryable());
    assert_eq!(h.resolver.calls(), 1, "an abort never triggers recovery");
}

#[tokio::test(start_paused = true)]
async fn pause_writes_progress_immediately() {
    let h = harness(0);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    sleep(Duration::from_secs(4)).await;

    set_paused(&h.session, &h.deps, true).await;
    let entry = h.deps.history.find(&key().code, key().ep).unwrap();
    assert!(entry.time >= 3.0, "pause must flush the current position");

    // Paused sessions freeze legitimately; no stall, no recovery.
    sleep(Duration::from_secs(30)).await;
    assert_eq!(h.resolver.calls(), 1);
    assert_ne!(state_of(&h.session).await, SessionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn native_probe_timeout_falls_back_to_hls_engine() {
    // Native-capable element whose native attach never becomes playable.
    let element = FakeElement::with_modes(true, true, false);
    let h = harness_full(ScriptedResolver::new(0), element);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;

    assert_eq!(h.element.attached_mode(), Some(AttachMode::HlsEngine));
    assert_eq!(
        h.element.attach_count(),
        2,
        "native attach, then the engine fallback"
    );
    assert_eq!(state_of(&h.session).await, SessionState::Attached);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(state_of(&h.session).await, SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn native_only_element_with_dead_probe_is_unsupported() {
    let element = FakeElement::with_modes(true, false, false);
    let h = harness_full(ScriptedResolver::new(0), element);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;

    let s = h.session.read().await;
    assert_eq!(s.state, SessionState::Failed);
    assert_eq!(s.failure, Some(FailureKind::FormatUnsupported));
}

#[tokio::test(start_paused = true)]
async fn manual_retry_restores_a_failed_session() {
    // Both the initial resolve and its fallback-free chain fail.
    let h = harness(1);
    start_playback(h.session.clone(), h.deps.clone(), key()).await;
    assert_eq!(state_of(&h.session).await, SessionState::Failed);
    assert_eq!(
        h.session.read().await.failure,
        Some(FailureKind::UpstreamUnavailable)
    );

    // The outage clears; a manual retry starts over with a full budget.
    let view = retry_session(&h.session, &h.deps).await.unwrap();
    assert_eq!(view.state, SessionState::Attached);
    assert_eq!(view.retry_count, 0);
    assert!(view.failure.is_none());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(state_of(&h.session).await, SessionState::Playing);
}
