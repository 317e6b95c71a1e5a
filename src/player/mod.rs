pub mod context;
pub mod element;
pub mod manager;
pub mod state;

pub use context::SessionContext;
pub use element::{AttachMode, ElementEvent, MediaElement, MediaErrorKind};
pub use manager::{PlayerDeps, SharedSession, destroy_session, retry_session, start_playback, update_session};
pub use state::{
    FailureKind, FailureView, PlayerUpdateRequest, PlayerView, SessionEvent, SessionState,
};
