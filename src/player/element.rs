//! Seam between the controller and the embedder's media runtime.
//!
//! The controller never touches a real `<video>` element or HLS engine;
//! it drives whatever the embedder hands it through this trait and reacts
//! to the events the element reports back.

/// How a URL is bound to the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachMode {
    /// The runtime plays HLS natively (e.g. iOS Safari).
    NativeHls,
    /// Playback goes through the bundled streaming-protocol engine.
    HlsEngine,
}

/// Element-level failure classes, mapped 1:1 onto the session failure
/// taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    Decode,
    Network,
    /// User-initiated teardown; never prompts a retry.
    Aborted,
}

/// Signals the element pushes at the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementEvent {
    /// The element ran out of buffered data.
    Waiting,
    /// Playback progressed (or resumed after a wait).
    Playing,
    Ended,
    Error(MediaErrorKind),
}

pub trait MediaElement: Send + Sync {
    fn supports_native_hls(&self) -> bool;
    fn supports_hls_engine(&self) -> bool;

    fn attach(&self, url: &str, mode: AttachMode);
    fn detach(&self);

    fn play(&self);
    fn pause(&self);
    fn seek(&self, position_secs: f64);

    /// Current playback position in seconds.
    fn position(&self) -> f64;
    /// Duration in seconds, once metadata is known.
    fn duration(&self) -> Option<f64>;
    /// Whether metadata is loaded and the source is playable (format probe).
    fn is_ready(&self) -> bool;
    /// Whether the element claims to be actively playing. A claim is not
    /// proof: the stall watchdog cross-checks it against position advance.
    fn claims_playing(&self) -> bool;

    /// Event stream for this element. Each event is delivered to one
    /// receiver, so only the active watchdog should hold one.
    fn events(&self) -> flume::Receiver<ElementEvent>;
}
