use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const CHECKPOINT_VERSION: u32 = 1;

/// Versioned on-disk shape. The phase name is repeated inside the blob so
/// a file renamed or copied between phases fails validation rather than
/// feeding the wrong work list downstream.
#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    version: u32,
    phase: String,
    urls: Vec<String>,
}

/// Durable store for intermediate work lists, one JSON file per phase.
///
/// Presence of a valid file is the sole resume signal. Anything unreadable,
/// unparsable, or written by a different version reads as absent: the phase
/// regenerates its list instead of failing the run.
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, phase: &str) -> PathBuf {
        self.dir.join(format!("{phase}.json"))
    }

    /// Durably persist a work list under a phase name. Written to a temp
    /// file and renamed so a crash mid-write never replaces a good blob
    /// with a torn one.
    pub fn put(&self, phase: &str, urls: &[String]) -> Result<()> {
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            phase: phase.to_string(),
            urls: urls.to_vec(),
        };
        let tmp = self.dir.join(format!("{phase}.json.tmp"));
        std::fs::write(&tmp, serde_json::to_vec(&checkpoint)?)?;
        std::fs::rename(&tmp, self.path_for(phase))?;
        Ok(())
    }

    /// Load a work list, or `None` when no usable checkpoint exists.
    pub fn get(&self, phase: &str) -> Option<Vec<String>> {
        let path = self.path_for(phase);
        if !path.exists() {
            return None;
        }
        match read_checkpoint(&path, phase) {
            Ok(urls) => Some(urls),
            Err(reason) => {
                tracing::warn!(
                    "Ignoring unusable checkpoint {}: {}",
                    path.display(),
                    reason
                );
                None
            }
        }
    }

    #[allow(dead_code)]
    pub fn clear(&self, phase: &str) -> Result<()> {
        let path = self.path_for(phase);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn read_checkpoint(path: &Path, phase: &str) -> std::result::Result<Vec<String>, String> {
    let content = std::fs::read(path).map_err(|e| e.to_string())?;
    let checkpoint: Checkpoint =
        serde_json::from_slice(&content).map_err(|e| e.to_string())?;
    if checkpoint.version != CHECKPOINT_VERSION {
        return Err(format!(
            "version {} does not match expected {}",
            checkpoint.version, CHECKPOINT_VERSION
        ));
    }
    if checkpoint.phase != phase {
        return Err(format!(
            "phase `{}` does not match expected `{}`",
            checkpoint.phase, phase
        ));
    }
    Ok(checkpoint.urls)
}
