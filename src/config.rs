//! Configuration for texwatch.
//!
//! Layered settings: defaults, then `.texwatch/settings.toml` found by
//! walking up from the current directory, then environment variables.
//!
//! # Environment Variables
//!
//! Variables are prefixed with `TEXWATCH_` and use double underscores to
//! separate nesting levels:
//! - `TEXWATCH_DIFF__DPI=300` sets `diff.dpi`
//! - `TEXWATCH_WATCH__COOLDOWN_MS=2000` sets `watch.cooldown_ms`
//! - `TEXWATCH_SYNC__MAX_RETRIES=5` sets `sync.max_retries`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .texwatch is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Comparison tool invocation
    #[serde(default)]
    pub diff: DiffConfig,

    /// Watcher timing
    #[serde(default)]
    pub watch: WatchConfig,

    /// Draft replication
    #[serde(default)]
    pub sync: SyncConfig,

    /// File naming conventions
    #[serde(default)]
    pub naming: NamingConfig,

    /// Logging levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DiffConfig {
    /// Interpreter used to run the comparison tool
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Path to the comparison tool script
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,

    /// Render resolution passed to the tool
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Directory the tool writes images into, relative to the document
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Filename suffixes recognized as image artifacts in tool output
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Literal token marking insertion points in document text
    #[serde(default = "default_marker")]
    pub marker: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    /// Pause after a reaction completes before the next notification is accepted
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Fixed delay before the replication reaction probes the log for stability
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Stability poll budget
    #[serde(default = "default_stability_samples")]
    pub stability_samples: u32,

    /// Sleep between stability polls
    #[serde(default = "default_stability_interval_ms")]
    pub stability_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Copy attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff between copy attempts (grows linearly per attempt)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamingConfig {
    /// Extension of tracked source documents
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Extension of the typeset artifact
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,

    /// Extension of the build log
    #[serde(default = "default_log_extension")]
    pub log_extension: String,

    /// Suffix inserted before the artifact extension for the draft copy
    #[serde(default = "default_draft_suffix")]
    pub draft_suffix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_interpreter() -> String {
    "python3".to_string()
}
fn default_tool_path() -> PathBuf {
    PathBuf::from("compare_pdfs.py")
}
fn default_dpi() -> u32 {
    200
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("images")
}
fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}
fn default_marker() -> String {
    "%ANCHOR%".to_string()
}
fn default_cooldown_ms() -> u64 {
    1000
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_stability_samples() -> u32 {
    3
}
fn default_stability_interval_ms() -> u64 {
    500
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    500
}
fn default_source_extension() -> String {
    "tex".to_string()
}
fn default_artifact_extension() -> String {
    "pdf".to_string()
}
fn default_log_extension() -> String {
    "log".to_string()
}
fn default_draft_suffix() -> String {
    "_draft".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            diff: DiffConfig::default(),
            watch: WatchConfig::default(),
            sync: SyncConfig::default(),
            naming: NamingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            tool_path: default_tool_path(),
            dpi: default_dpi(),
            output_dir: default_output_dir(),
            image_extensions: default_image_extensions(),
            marker: default_marker(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            settle_ms: default_settle_ms(),
            stability_samples: default_stability_samples(),
            stability_interval_ms: default_stability_interval_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
            artifact_extension: default_artifact_extension(),
            log_extension: default_log_extension(),
            draft_suffix: default_draft_suffix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl WatchConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn stability_interval(&self) -> Duration {
        Duration::from_millis(self.stability_interval_ms)
    }
}

impl SyncConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".texwatch/settings.toml"));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // TEXWATCH_ prefixed vars; double underscore separates levels
            .merge(
                Env::prefixed("TEXWATCH_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Find the workspace config by walking ancestors for a .texwatch directory
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".texwatch");
            if config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Get the workspace root directory (where .texwatch is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            if ancestor.join(".texwatch").is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("TEXWATCH_")
                    .map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(
        &self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".texwatch/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}
