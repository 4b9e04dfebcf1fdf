/// Config file loading and creation for the tierrank CLI.
///
/// Config lives at ~/.config/tierrank/config.toml.
/// All fields are optional. CLI args override config values.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierrankConfig {
    pub state_file: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub criterion: Option<String>,
    /// Only applied when a new state file is created.
    pub score_visibility_threshold: Option<usize>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# tierrank configuration
# All values here can be overridden by CLI flags.

# Where your ranking is stored
# state_file = \"/home/me/tierrank.json\"

# Number of ranked titles before scores are shown (new state files only)
# score_visibility_threshold = 10

# --- LLM oracle (tierrank add --oracle llm) ---

# OpenAI-compatible API endpoint
# endpoint = \"http://localhost:8000\"

# Model ID
# model = \"Qwen/Qwen3-4B-Instruct-2507\"

# API key: use OPENAI_API_KEY env var or --api-key flag (not stored in config)

# Sampling temperature
# temperature = 0.3

# Question the model answers for each pair
# criterion = \"Which of these would I rather rewatch?\"
";

/// Returns the default config path: ~/.config/tierrank/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("tierrank").join("config.toml"))
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> Result<TierrankConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TierrankConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config at {}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<TierrankConfig> {
    Ok(toml::from_str(content)?)
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
