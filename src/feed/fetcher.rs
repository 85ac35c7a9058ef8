use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};

use crate::config::Config;

/// Completed request, successful or not. Transport failures are carried as
/// data so one bad URL never aborts the batch it belongs to.
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<FetchedResponse, reqwest::Error>,
}

pub struct FetchedResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("review-harvester/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Fetch every URL with at most `pool_size` requests in flight.
    /// Completion order is unspecified; callers key their aggregates by ids
    /// extracted from the URL rather than by position.
    pub async fn fetch_batch(&self, urls: Vec<String>, pool_size: usize) -> Vec<FetchOutcome> {
        stream::iter(urls)
            .map(|url| async move {
                let result = self.fetch_one(&url).await;
                FetchOutcome { url, result }
            })
            .buffer_unordered(pool_size.max(1))
            .collect()
            .await
    }

    async fn fetch_one(&self, url: &str) -> Result<FetchedResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(FetchedResponse { status, body })
    }
}
