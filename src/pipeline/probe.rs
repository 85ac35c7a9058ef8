use crate::error::Result;
use crate::extract;

use super::{Pipeline, PROBE_CHECKPOINT};

impl Pipeline {
    /// Build the probe work list: one feed-listing URL per app that has no
    /// harvested reviews yet. A valid checkpoint short-circuits the store
    /// scan entirely.
    pub async fn build_probe_list(&self) -> Result<Vec<String>> {
        if let Some(urls) = self.checkpoints.get(PROBE_CHECKPOINT) {
            tracing::info!("Loading list of {} probe URLs from checkpoint", urls.len());
            return Ok(urls);
        }

        tracing::info!("Building list of probe URLs");
        let apps = self.repository.apps_without_reviews().await?;
        let total = apps.len();
        let progress_step = (total / 100).max(1);

        let mut probe_urls = Vec::with_capacity(total);
        for (i, app) in apps.into_iter().enumerate() {
            if i % progress_step == 0 && total > 0 {
                tracing::info!("{:.2}%", 100.0 * i as f64 / total as f64);
            }

            let app_id = match app.app_id {
                Some(app_id) => app_id,
                // Derive once and write through immediately, so a crash
                // later in the scan does not lose the derivation.
                None => match extract::app_id_from_url(&app.application_url) {
                    Some(app_id) => {
                        self.repository.set_app_id(app.id, app_id).await?;
                        app_id
                    }
                    None => {
                        tracing::warn!(
                            "Skipping app row {}: no app id in `{}`",
                            app.id,
                            app.application_url
                        );
                        continue;
                    }
                },
            };

            probe_urls.push(self.config.probe_url(app_id));
        }

        tracing::info!("Done. Got {} URLs to probe", probe_urls.len());
        self.checkpoints.put(PROBE_CHECKPOINT, &probe_urls)?;
        Ok(probe_urls)
    }
}
