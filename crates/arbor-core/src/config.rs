use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

/// Project-level engine settings read from `.arbor/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub cycles: CycleConfig,
    #[serde(default)]
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Deepest ancestor level the guard walks before it gives up and reports
    /// a cycle.
    #[serde(default = "default_cycle_max_depth")]
    pub max_depth: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_depth: default_cycle_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default = "default_uncategorized_id")]
    pub uncategorized_id: String,
    #[serde(default = "default_uncategorized_title")]
    pub uncategorized_title: String,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            uncategorized_id: default_uncategorized_id(),
            uncategorized_title: default_uncategorized_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Deepest nesting level the flattener will descend to.
    #[serde(default = "default_render_max_depth")]
    pub max_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_render_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

pub fn load_engine_config(project_root: &Path) -> Result<EngineConfig> {
    let path = project_root.join(".arbor/config.toml");
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<EngineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("arbor/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the output mode name: `--json` flag, then `FORMAT`, then the user
/// config, then TTY detection.
pub fn resolve_output_mode(cli_json: bool) -> Result<String> {
    let user = load_user_config()?;
    Ok(resolve_output(
        cli_json,
        user.output,
        env::var("FORMAT").ok(),
        std::io::stdout().is_terminal(),
    ))
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
    is_tty: bool,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    let fallback = if is_tty { "pretty" } else { "text" };
    fallback.to_string()
}

const fn default_cycle_max_depth() -> usize {
    10_000
}

fn default_uncategorized_id() -> String {
    "__uncategorized__".to_string()
}

fn default_uncategorized_title() -> String {
    "Uncategorized".to_string()
}

const fn default_render_max_depth() -> usize {
    256
}
