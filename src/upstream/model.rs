use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::types::{ContentCode, Language, QualityTier};

use super::error::UpstreamError;

/// `{ data, ... }` wrapper every provider endpoint responds with. The
/// provider's own cache hints alongside `data` are ignored; descriptor
/// freshness comes from the payload's `expires_in`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: Language,
    #[serde(default)]
    pub name: Option<String>,
}

/// One row of the home feed or a search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleSummary {
    pub code: ContentCode,
    pub name: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub ep: u32,
    #[serde(default)]
    pub name: Option<String>,
}

/// Raw play payload as the provider ships it.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub episode: Option<u32>,
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub urls: PlayUrls,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayUrls {
    #[serde(default)]
    pub v480: Option<String>,
    #[serde(default)]
    pub v720: Option<String>,
    #[serde(default)]
    pub v1080: Option<String>,
}

/// `(language, content code, episode)` tuple identifying one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub lang: Language,
    pub code: ContentCode,
    pub ep: u32,
}

impl ResolutionKey {
    pub fn new(lang: Language, code: ContentCode, ep: u32) -> Self {
        Self { lang, code, ep }
    }

    pub fn cache_key(&self) -> String {
        crate::cache::cache_key(&["play", &self.lang, &self.code, &self.ep.to_string()])
    }
}

impl std::fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ep {} ({})", self.code, self.ep, self.lang)
    }
}

/// The resolved, time-limited set of playable URLs and metadata for one
/// episode. A descriptor with no variant cannot exist; such responses are
/// rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayDescriptor {
    pub code: ContentCode,
    pub episode: u32,
    pub lang: Language,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    /// Total episodes of the title, when the provider reports it.
    #[serde(default)]
    pub total: Option<u32>,
    /// Quality tier -> signed, time-limited URL.
    pub variants: BTreeMap<QualityTier, String>,
    /// Provider-declared remaining validity of the URLs, in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl PlayDescriptor {
    pub fn from_payload(key: &ResolutionKey, data: PlayData) -> Result<Self, UpstreamError> {
        let mut variants = BTreeMap::new();
        if let Some(url) = data.urls.v480.filter(|u| !u.is_empty()) {
            variants.insert(QualityTier::Q480, url);
        }
        if let Some(url) = data.urls.v720.filter(|u| !u.is_empty()) {
            variants.insert(QualityTier::Q720, url);
        }
        if let Some(url) = data.urls.v1080.filter(|u| !u.is_empty()) {
            variants.insert(QualityTier::Q1080, url);
        }
        if variants.is_empty() {
            return Err(UpstreamError::NoVariants);
        }

        Ok(Self {
            code: key.code.clone(),
            episode: data.episode.unwrap_or(key.ep),
            lang: key.lang.clone(),
            title: data.name,
            cover: data.cover,
            total: data.total,
            variants,
            expires_in: data.expires_in,
        })
    }

    pub fn variant(&self, tier: QualityTier) -> Option<&str> {
        self.variants.get(&tier).map(String::as_str)
    }

    /// The requested tier's URL, or any available variant as fallback.
    pub fn variant_or_any(&self, tier: QualityTier) -> Option<(QualityTier, &str)> {
        if let Some(url) = self.variant(tier) {
            return Some((tier, url));
        }
        QualityTier::PREFERRED
            .iter()
            .find_map(|t| self.variant(*t).map(|url| (*t, url)))
    }

    pub fn resolution_key(&self) -> ResolutionKey {
        ResolutionKey::new(self.lang.clone(), self.code.clone(), self.episode)
    }
}
