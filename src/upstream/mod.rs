pub mod catalog;
pub mod client;
pub mod error;
pub mod model;
pub mod resolver;
pub mod retry;

pub use catalog::CatalogService;
pub use client::UpstreamClient;
pub use error::UpstreamError;
pub use model::{
    Envelope, EpisodeInfo, LanguageInfo, PlayData, PlayDescriptor, ResolutionKey, TitleSummary,
};
pub use resolver::{PlayResolution, PlayResolver};
