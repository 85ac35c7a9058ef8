use crate::error::Result;
use crate::extract;
use crate::feed::envelope;
use crate::feed::FetchOutcome;

use super::{Pipeline, SCRAPE_CHECKPOINT};

impl Pipeline {
    /// Expand the probe list into one scrape URL per review page. Probes are
    /// issued in fixed-size batches with pool-bounded parallelism; every
    /// per-probe failure is soft and contributes zero pages.
    pub async fn discover_pages(&self, probe_urls: Vec<String>) -> Result<Vec<String>> {
        if let Some(urls) = self.checkpoints.get(SCRAPE_CHECKPOINT) {
            tracing::info!("Loading list of {} scrape URLs from checkpoint", urls.len());
            return Ok(urls);
        }

        tracing::info!("Generating scrape URLs from {} probe URLs", probe_urls.len());
        let total = probe_urls.len();
        let pool_size = self.config.probe_pool_size;

        let mut pages: Vec<(i64, i64)> = Vec::new();
        for (batch_index, batch) in probe_urls.chunks(pool_size.max(1)).enumerate() {
            if total > 0 {
                let done = batch_index * pool_size.max(1);
                tracing::info!("{:.0}%", 100.0 * done as f64 / total as f64);
            }
            let outcomes = self.fetcher.fetch_batch(batch.to_vec(), pool_size).await;
            pages.extend(collect_scrape_pages(&outcomes));
        }

        // Completion order is arbitrary; key by (app_id, page) so the
        // checkpointed list is deterministic for deterministic inputs.
        pages.sort_unstable();
        pages.dedup();

        let scrape_urls: Vec<String> = pages
            .iter()
            .map(|&(app_id, page)| self.config.scrape_url(page, app_id))
            .collect();

        tracing::info!("Dumping {} scrape URLs to checkpoint", scrape_urls.len());
        self.checkpoints.put(SCRAPE_CHECKPOINT, &scrape_urls)?;
        Ok(scrape_urls)
    }
}

/// Turn completed probe requests into `(app_id, page)` pairs. A feed whose
/// `last` link encodes page N yields pages `1..=N`; no link means one page.
fn collect_scrape_pages(outcomes: &[FetchOutcome]) -> Vec<(i64, i64)> {
    let mut pages = Vec::new();
    for outcome in outcomes {
        let Some(app_id) = extract::app_id_from_url(&outcome.url) else {
            continue;
        };
        let response = match &outcome.result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Probe request failed for appID {}: {}", app_id, e);
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
        let num_pages = feed.last_page_number();
        for page in 1..=num_pages {
            pages.push((app_id, page));
        }
    }
    pages
}
