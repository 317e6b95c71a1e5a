pub mod base;
pub mod history;
pub mod logging;
pub mod playback;
pub mod server;
pub mod upstream;

pub use base::*;
pub use history::*;
pub use logging::*;
pub use playback::*;
pub use server::*;
pub use upstream::*;
