use std::sync::Arc;

use crate::cache::{
    EPISODES_TTL_MS, HOME_TTL_MS, LANGUAGES_TTL_MS, SEARCH_TTL_MS, TtlCache, cache_key,
};

use super::client::UpstreamClient;
use super::error::UpstreamError;
use super::model::{EpisodeInfo, LanguageInfo, TitleSummary};

/// Cached catalog surfaces. These responses carry no signed URLs, so the
/// TTLs are fixed and generous compared to play descriptors.
pub struct CatalogService {
    client: Arc<UpstreamClient>,
    languages: TtlCache<Vec<LanguageInfo>>,
    home: TtlCache<Vec<TitleSummary>>,
    search: TtlCache<Vec<TitleSummary>>,
    episodes: TtlCache<Vec<EpisodeInfo>>,
}

impl CatalogService {
    pub fn new(client: Arc<UpstreamClient>) -> Self {
        Self {
            client,
            languages: TtlCache::new(),
            home: TtlCache::new(),
            search: TtlCache::new(),
            episodes: TtlCache::new(),
        }
    }

    pub async fn languages(&self) -> Result<Vec<LanguageInfo>, UpstreamError> {
        self.languages
            .get_or_fetch("langs", |_| LANGUAGES_TTL_MS, || self.client.languages())
            .await
    }

    pub async fn home(&self, lang: &str) -> Result<Vec<TitleSummary>, UpstreamError> {
        self.home
            .get_or_fetch(
                &cache_key(&["home", lang]),
                |_| HOME_TTL_MS,
                || self.client.home(lang),
            )
            .await
    }

    pub async fn search(&self, q: &str, lang: &str) -> Result<Vec<TitleSummary>, UpstreamError> {
        self.search
            .get_or_fetch(
                &cache_key(&["search", lang, q]),
                |_| SEARCH_TTL_MS,
                || self.client.search(q, lang),
            )
            .await
    }

    pub async fn episodes(
        &self,
        code: &str,
        lang: &str,
    ) -> Result<Vec<EpisodeInfo>, UpstreamError> {
        self.episodes
            .get_or_fetch(
                &cache_key(&["eps", lang, code]),
                |_| EPISODES_TTL_MS,
                || self.client.episodes(code, lang),
            )
            .await
    }
}
