use std::collections::BTreeMap;

use crate::error::Result;
use crate::extract;
use crate::feed::envelope;
use crate::feed::FetchOutcome;
use crate::models::Review;

use super::Pipeline;

impl Pipeline {
    /// Fetch every scrape URL with pool-bounded parallelism, parse the pages
    /// into normalized reviews, and replace each app's stored review set in
    /// one upsert. Per-page failures are soft: pages already parsed for the
    /// same app are kept.
    pub async fn harvest(&self, scrape_urls: Vec<String>) -> Result<()> {
        tracing::info!("Got {} URLs to scrape", scrape_urls.len());

        let outcomes = self
            .fetcher
            .fetch_batch(scrape_urls, self.config.scrape_pool_size)
            .await;
        let reviews_by_app = collect_reviews(&outcomes);

        for (app_id, reviews) in reviews_by_app {
            tracing::info!(
                "Updating database for appID {} ({} reviews)",
                app_id,
                reviews.len()
            );
            self.repository.replace_reviews(app_id, reviews).await?;
        }

        Ok(())
    }
}

/// Accumulate parsed reviews per app across all of its pages. Keyed maps
/// (app id, then page number) make the result deterministic whatever order
/// the requests completed in; item order within a page is preserved.
fn collect_reviews(outcomes: &[FetchOutcome]) -> BTreeMap<i64, Vec<Review>> {
    let mut by_page: BTreeMap<i64, BTreeMap<i64, Vec<Review>>> = BTreeMap::new();

    for outcome in outcomes {
        let Some(app_id) = extract::app_id_from_url(&outcome.url) else {
            continue;
        };
        let page = extract::page_from_url(&outcome.url).unwrap_or(1);
        let response = match &outcome.result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Scrape request failed for appID {}: {}", app_id, e);
                continue;
            }
        };
        if !response.status.is_success() {
            tracing::warn!("Status was {} for appID {}", response.status, app_id);
            continue;
        }
        let feed = match envelope::parse_feed(&response.body) {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!("Malformed feed for appID {}: {}", app_id, e);
                continue;
            }
        };
        if feed.entry.is_empty() {
            tracing::warn!("No reviews in feed for appID {}", app_id);
            continue;
        }

        let mut reviews = Vec::with_capacity(feed.entry.len());
        for item in &feed.entry {
            if item.is_restricted() {
                continue;
            }
            match item.to_review(app_id) {
                Some(review) => reviews.push(review),
                None => {
                    tracing::warn!("Skipping malformed feed item for appID {}", app_id);
                }
            }
        }
        by_page.entry(app_id).or_default().insert(page, reviews);
    }

    by_page
        .into_iter()
        .map(|(app_id, pages)| (app_id, pages.into_values().flatten().collect()))
        .collect()
}
