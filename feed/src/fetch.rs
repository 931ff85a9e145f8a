// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Retrieval of calendar documents.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::url::SourceUrl;

/// One attempt at retrieving a feed document.
///
/// Implementations must not retry; the scheduler interval is the retry policy.
#[async_trait]
pub trait FeedSource: Send + Sync + fmt::Debug {
    /// Fetches the raw calendar text behind `url`.
    async fn fetch(&self, url: &SourceUrl) -> Result<String, FetchError>;
}

/// HTTP implementation of [`FeedSource`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Creates a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Self::with_timeout(config, config.timeout())
    }

    /// Creates a fetcher with an explicit timeout, overriding `config.timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(config: &FetchConfig, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    async fn fetch(&self, url: &SourceUrl) -> Result<String, FetchError> {
        tracing::debug!(url = %url.fetch_url(), "fetching feed");
        let mut resp = self
            .client
            .get(url.fetch_url().clone())
            .header("Accept", "text/calendar, */*;q=0.5")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(%status, "feed request rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        if resp
            .content_length()
            .is_some_and(|len| usize::try_from(len).map_or(true, |len| len > self.max_body_bytes))
        {
            return Err(FetchError::TooLarge {
                limit: self.max_body_bytes,
            });
        }

        // Content-Length is absent on chunked replies, so count as we read
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_body_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = body.len(), "feed fetched");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
