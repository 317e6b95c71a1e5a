use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::common::http::HttpClient;
use crate::configs::UpstreamConfig;

use super::error::UpstreamError;
use super::model::{Envelope, EpisodeInfo, LanguageInfo, PlayData, ResolutionKey, TitleSummary};
use super::retry::with_retry;

/// Authenticated client for both provider surfaces: the direct `/api/v1`
/// path and the `/proxy` path. One shared connection pool underneath.
pub struct UpstreamClient {
    http: Client,
    api_base: String,
    proxy_base: String,
    token: Option<String>,
    attempts: u32,
    backoff_ms: u64,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let root = config.base_url.trim_end_matches('/');
        if config.token.is_none() {
            warn!("No upstream token configured, requests will go out unauthenticated");
        }
        Ok(Self {
            http: HttpClient::new(config.request_timeout_secs)?,
            api_base: format!("{root}/api/v1"),
            proxy_base: format!("{root}/proxy"),
            token: config.token.clone(),
            attempts: config.retry_attempts,
            backoff_ms: config.retry_backoff_ms,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: Vec<(&'static str, String)>,
    ) -> Result<Envelope<T>, UpstreamError> {
        with_retry(self.attempts, self.backoff_ms, || {
            let mut req = self.http.get(&url).query(&query);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            async move {
                let resp = req.send().await?;
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(UpstreamError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                let raw = resp.text().await?;
                serde_json::from_str(&raw).map_err(|e| UpstreamError::Malformed(e.to_string()))
            }
        })
        .await
    }

    pub async fn languages(&self) -> Result<Vec<LanguageInfo>, UpstreamError> {
        let env: Envelope<Vec<LanguageInfo>> = self
            .get_json(format!("{}/languages", self.api_base), Vec::new())
            .await?;
        Ok(env.data)
    }

    pub async fn home(&self, lang: &str) -> Result<Vec<TitleSummary>, UpstreamError> {
        let env: Envelope<Vec<TitleSummary>> = self
            .get_json(
                format!("{}/home", self.api_base),
                vec![("lang", lang.to_string())],
            )
            .await?;
        Ok(env.data)
    }

    pub async fn search(&self, q: &str, lang: &str) -> Result<Vec<TitleSummary>, UpstreamError> {
        let env: Envelope<Vec<TitleSummary>> = self
            .get_json(
                format!("{}/search", self.api_base),
                vec![("q", q.to_string()), ("lang", lang.to_string())],
            )
            .await?;
        Ok(env.data)
    }

    pub async fn episodes(
        &self,
        code: &str,
        lang: &str,
    ) -> Result<Vec<EpisodeInfo>, UpstreamError> {
        let env: Envelope<Vec<EpisodeInfo>> = self
            .get_json(
                format!("{}/episodes/{}", self.api_base, urlencoding::encode(code)),
                vec![("lang", lang.to_string())],
            )
            .await?;
        Ok(env.data)
    }

    /// Play payload via the direct v1 path.
    pub async fn play(&self, key: &ResolutionKey) -> Result<Envelope<PlayData>, UpstreamError> {
        self.get_json(
            format!("{}/play/{}", self.api_base, urlencoding::encode(&key.code)),
            vec![("lang", key.lang.to_string()), ("ep", key.ep.to_string())],
        )
        .await
    }

    /// Play payload via the proxy path.
    pub async fn proxy_play(
        &self,
        key: &ResolutionKey,
    ) -> Result<Envelope<PlayData>, UpstreamError> {
        self.get_json(
            format!(
                "{}/play/{}",
                self.proxy_base,
                urlencoding::encode(&key.code)
            ),
            vec![("lang", key.lang.to_string()), ("ep", key.ep.to_string())],
        )
        .await
    }
}
