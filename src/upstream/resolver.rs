use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{TtlCache, play_ttl_ms};

use super::client::UpstreamClient;
use super::error::UpstreamError;
use super::model::{PlayDescriptor, ResolutionKey};

/// One way of obtaining a play descriptor. The proxy and direct provider
/// paths are equivalent capability providers tried in a fixed order.
#[async_trait]
pub trait PlayResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, key: &ResolutionKey) -> Result<PlayDescriptor, UpstreamError>;
}

struct ProxyResolver {
    client: Arc<UpstreamClient>,
}

#[async_trait]
impl PlayResolver for ProxyResolver {
    fn name(&self) -> &'static str {
        "proxy"
    }

    async fn resolve(&self, key: &ResolutionKey) -> Result<PlayDescriptor, UpstreamError> {
        let env = self.client.proxy_play(key).await?;
        PlayDescriptor::from_payload(key, env.data)
    }
}

struct DirectResolver {
    client: Arc<UpstreamClient>,
}

#[async_trait]
impl PlayResolver for DirectResolver {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn resolve(&self, key: &ResolutionKey) -> Result<PlayDescriptor, UpstreamError> {
        let env = self.client.play(key).await?;
        PlayDescriptor::from_payload(key, env.data)
    }
}

/// Ordered resolver chain plus the short-TTL descriptor cache.
///
/// When the primary path fails and the fallback fails too, the primary
/// error is the one surfaced: it is the diagnostically relevant failure.
pub struct PlayResolution {
    resolvers: Vec<Box<dyn PlayResolver>>,
    cache: TtlCache<PlayDescriptor>,
}

impl PlayResolution {
    pub fn new(client: Arc<UpstreamClient>, prefer_proxy: bool) -> Self {
        let proxy = Box::new(ProxyResolver {
            client: client.clone(),
        });
        let direct = Box::new(DirectResolver { client });

        let resolvers: Vec<Box<dyn PlayResolver>> = if prefer_proxy {
            vec![proxy, direct]
        } else {
            vec![direct]
        };

        Self {
            resolvers,
            cache: TtlCache::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_resolvers(resolvers: Vec<Box<dyn PlayResolver>>) -> Self {
        Self {
            resolvers,
            cache: TtlCache::new(),
        }
    }

    /// Walk the resolver chain. Fallback errors are logged, not raised.
    pub async fn resolve(&self, key: &ResolutionKey) -> Result<PlayDescriptor, UpstreamError> {
        let mut primary_err: Option<UpstreamError> = None;

        for resolver in &self.resolvers {
            match resolver.resolve(key).await {
                Ok(descriptor) => {
                    if let Some(e) = primary_err {
                        warn!(
                            "Play {} resolved via {} after primary path failed: {} (status {:?})",
                            key,
                            resolver.name(),
                            e,
                            e.status()
                        );
                    }
                    return Ok(descriptor);
                }
                Err(e) => {
                    if primary_err.is_none() {
                        debug!("Resolver {} failed for {}: {}", resolver.name(), key, e);
                        primary_err = Some(e);
                    } else {
                        warn!(
                            "Fallback resolver {} also failed for {}: {}",
                            resolver.name(),
                            key,
                            e
                        );
                    }
                }
            }
        }

        Err(primary_err.unwrap_or(UpstreamError::Malformed("no resolvers configured".into())))
    }

    /// Cache-or-fetch with a TTL derived from the descriptor's own
    /// `expires_in`. Returns whether the value came from cache.
    pub async fn resolve_cached(
        &self,
        key: &ResolutionKey,
    ) -> Result<(PlayDescriptor, bool), UpstreamError> {
        let cache_key = key.cache_key();
        if let Some(hit) = self.cache.get(&cache_key) {
            return Ok((hit, true));
        }
        let descriptor = self
            .cache
            .get_or_fetch(
                &cache_key,
                |d: &PlayDescriptor| play_ttl_ms(d.expires_in),
                || self.resolve(key),
            )
            .await?;
        Ok((descriptor, false))
    }

    /// Bypass the cache for a descriptor whose URLs are guaranteed fresh
    /// (smart retry never reuses a possibly-expired link), then re-prime
    /// the cache for nearby callers.
    pub async fn resolve_fresh(
        &self,
        key: &ResolutionKey,
    ) -> Result<PlayDescriptor, UpstreamError> {
        let descriptor = self.resolve(key).await?;
        self.cache.put(
            &key.cache_key(),
            descriptor.clone(),
            play_ttl_ms(descriptor.expires_in),
        );
        Ok(descriptor)
    }

    /// TTL the descriptor would be stored under, for freshness reporting.
    pub fn ttl_ms_of(descriptor: &PlayDescriptor) -> u64 {
        play_ttl_ms(descriptor.expires_in)
    }
}
