//! HTTP event API client.
//!
//! Fetches pages of contract events from
//! `GET {base_url}/events?contract_id=..&limit=..&cursor=..`. When there is no
//! cursor yet, `start_ledger` is sent instead (if configured).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use tracing::debug;

use super::config::SourceConfig;
use super::error::SourceError;
use super::{EventPage, EventQuery, EventSource};

/// HTTP client for the chain event API.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    config: SourceConfig,
    http: reqwest::Client,
}

impl HttpEventSource {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .build()
            .map_err(SourceError::Request)?;

        Ok(Self { config, http })
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Builds the request URL for a query.
    fn events_url(&self, query: &EventQuery) -> Result<Url, SourceError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/events"))
            .map_err(|e| SourceError::InvalidConfig(e.to_string()))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("contract_id", &self.config.contract_id);
            pairs.append_pair("limit", &query.limit.to_string());

            match (&query.cursor, query.start_ledger) {
                (Some(cursor), _) => {
                    pairs.append_pair("cursor", cursor);
                }
                (None, Some(ledger)) => {
                    pairs.append_pair("start_ledger", &ledger.to_string());
                }
                (None, None) => {}
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn fetch_events(&self, query: &EventQuery) -> Result<EventPage, SourceError> {
        let url = self.events_url(query)?;
        debug!(url = %url, "Fetching events");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Deserialization(e.to_string()))
    }
}
