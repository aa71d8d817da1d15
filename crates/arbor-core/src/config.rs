use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::model::ProjectId;
use crate::order::{DEFAULT_SPACING, OrderKeyAllocator};

/// Directory under the project root holding the board and its config.
pub const ARBOR_DIR: &str = ".arbor";

/// Snapshot file name inside [`ARBOR_DIR`].
pub const BOARD_FILE: &str = "board.json";

/// Config file name inside [`ARBOR_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub board: BoardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Gap (Δ) between keys when appending or renumbering.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            spacing: default_spacing(),
        }
    }
}

impl OrderingConfig {
    #[must_use]
    pub fn allocator(&self) -> OrderKeyAllocator {
        OrderKeyAllocator::new(self.spacing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_project")]
    pub default_project: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_project: default_project(),
        }
    }
}

impl BoardConfig {
    #[must_use]
    pub fn project(&self) -> ProjectId {
        ProjectId::new(self.default_project.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

#[must_use]
pub fn board_path(project_root: &Path) -> PathBuf {
    project_root.join(ARBOR_DIR).join(BOARD_FILE)
}

#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(ARBOR_DIR).join(CONFIG_FILE)
}

/// Load `.arbor/config.toml`, defaulting every missing field (or the whole
/// file).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/arbor/config.toml`.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
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

/// Merge project and user config and pick the output mode.
///
/// `cli_output` is an explicit `--format` (or `json` for `--json`) and wins
/// over everything else.
///
/// # Errors
///
/// Propagates config load failures.
pub fn resolve_config(project_root: &Path, cli_output: Option<&str>) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_output, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" | "tsv" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_output: Option<&str>,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    let chosen = [cli_output, env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode);

    if let Some(mode) = chosen {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_spacing() -> f64 {
    DEFAULT_SPACING
}

fn default_project() -> String {
    "default".to_string()
}
