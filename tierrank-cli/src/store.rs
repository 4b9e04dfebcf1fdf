/// JSON persistence of the ranking state.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tierrank_core::{RankingState, ScorePolicy};
use tracing::{debug, info};

/// Default state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = "tierrank.json";

/// Load and validate the state at `path`.
///
/// A missing file is a fresh, empty ranking using `policy`. An existing file
/// keeps the policy it was created with.
pub fn load_state(path: &Path, policy: ScorePolicy) -> Result<RankingState> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no state file yet, starting an empty ranking");
            policy.validate()?;
            return Ok(RankingState::with_policy(policy));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read state from {}", path.display()));
        }
    };

    let state: RankingState = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file {}", path.display()))?;
    state
        .validate()
        .with_context(|| format!("State file {} is inconsistent", path.display()))?;
    debug!(path = %path.display(), items = state.total_count(), "loaded state");
    Ok(state)
}

/// Write `state` to `path` via a sibling temp file and rename.
pub fn save_state(path: &Path, state: &RankingState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    debug!(path = %path.display(), items = state.total_count(), "saved state");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
