mod discover;
mod harvest;
mod probe;

use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedFetcher;

pub const PROBE_CHECKPOINT: &str = "probe_urls";
pub const SCRAPE_CHECKPOINT: &str = "scrape_urls";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Probe,
    Discover,
    Harvest,
}

impl Phase {
    pub fn parse(s: &str) -> Option<Phase> {
        match s {
            "probe" => Some(Phase::Probe),
            "discover" => Some(Phase::Discover),
            "harvest" => Some(Phase::Harvest),
            _ => None,
        }
    }
}

/// Sequential phase driver. All collaborators are constructed once in `main`
/// and passed in; the pipeline itself keeps no state between invocations
/// beyond the checkpoint files and the review rows in the store.
pub struct Pipeline {
    config: Config,
    repository: Repository,
    checkpoints: CheckpointStore,
    fetcher: FeedFetcher,
}

impl Pipeline {
    pub fn new(
        config: Config,
        repository: Repository,
        checkpoints: CheckpointStore,
        fetcher: FeedFetcher,
    ) -> Self {
        Self {
            config,
            repository,
            checkpoints,
            fetcher,
        }
    }

    /// Run all phases in order. Each phase is gated by its checkpoint, so a
    /// crashed run resumes at the last completed stage.
    pub async fn run(&self) -> Result<()> {
        let probe_urls = self.build_probe_list().await?;
        let scrape_urls = self.discover_pages(probe_urls).await?;
        self.harvest(scrape_urls).await
    }

    /// Run a single phase, for staged inspection. Earlier phases are loaded
    /// from their checkpoints (or regenerated when no checkpoint exists).
    pub async fn run_phase(&self, phase: Phase) -> Result<()> {
        match phase {
            Phase::Probe => {
                self.build_probe_list().await?;
            }
            Phase::Discover => {
                let probe_urls = self.build_probe_list().await?;
                self.discover_pages(probe_urls).await?;
            }
            Phase::Harvest => {
                let probe_urls = self.build_probe_list().await?;
                let scrape_urls = self.discover_pages(probe_urls).await?;
                self.harvest(scrape_urls).await?;
            }
        }
        Ok(())
    }
}
