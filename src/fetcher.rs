use crate::config::FetcherConfig;
use crate::constants;
use crate::draft::EventDraft;
use crate::error::{ImportError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Outcome of resolving a source URL: either the page HTML, or a manual-entry
/// template for platforms that reject automated retrieval.
#[derive(Debug)]
pub enum FetchOutcome {
    Html(String),
    Blocked(EventDraft),
}

pub struct SourceFetcher {
    client: reqwest::Client,
}

impl SourceFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(constants::BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(constants::BROWSER_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the raw HTML for a source URL. Blocklisted platforms short-circuit
    /// before any network call; a non-2xx response is fatal for the attempt and
    /// is not retried.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ImportError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ImportError::InvalidUrl {
                url: url.to_string(),
                message: "URL has no host".to_string(),
            })?
            .to_lowercase();

        if let Some(source) = constants::blocked_platform(&host) {
            info!(
                "{} blocks automated retrieval; returning manual-entry template",
                source.display_name()
            );
            return Ok(FetchOutcome::Blocked(EventDraft::manual_template(
                url, source,
            )));
        }

        debug!("Fetching {}", url);
        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(FetchOutcome::Html(body))
    }
}
