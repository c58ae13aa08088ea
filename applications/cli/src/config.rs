/// WaveVault configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wavevault_metadata::{IndexConfig, DEFAULT_AUDIO_EXTENSIONS};

/// Config file looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "wavevault.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VaultConfig {
    #[serde(default = "default_paths")]
    pub paths: PathSettings,

    #[serde(default = "default_scan")]
    pub scan: ScanSettings,

    #[serde(default = "default_classifier")]
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathSettings {
    /// Projects document (albums, tracks, inbox)
    #[serde(default = "default_projects_db")]
    pub projects_db: PathBuf,

    /// `SQLite` database holding the sample library index
    #[serde(default = "default_library_db_url")]
    pub library_db_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanSettings {
    /// Extractions in flight during a folder scan
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Metadata worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_classifier_program")]
    pub program: PathBuf,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
}

impl VaultConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `wavevault.toml` is read when
    /// present. Variables such as `VAULT_SCAN__WORKERS=4` override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (VAULT_<SECTION>__<KEY>)
        settings = settings.add_source(
            config::Environment::with_prefix("VAULT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.extensions")
                .with_list_parse_key("classifier.args")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.scan.concurrency == 0 {
            return Err(CliError::Config(
                "scan.concurrency must be at least 1".to_string(),
            ));
        }
        if self.scan.workers == 0 {
            return Err(CliError::Config("scan.workers must be at least 1".to_string()));
        }
        if self.scan.task_timeout_ms == 0 {
            return Err(CliError::Config(
                "scan.task_timeout_ms must be positive".to_string(),
            ));
        }
        if self.scan.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(CliError::Config(
                "scan.extensions must list at least one extension".to_string(),
            ));
        }
        if self.classifier.enabled && self.classifier.timeout_ms == 0 {
            return Err(CliError::Config(
                "classifier.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl ScanSettings {
    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// Indexer settings; extensions are normalised to lower case without a dot
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            extensions: self
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            concurrency: self.concurrency,
            ..IndexConfig::default()
        }
    }
}

impl ClassifierSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Default values
fn default_paths() -> PathSettings {
    PathSettings {
        projects_db: default_projects_db(),
        library_db_url: default_library_db_url(),
    }
}

fn default_projects_db() -> PathBuf {
    PathBuf::from("./data/projects_v2.json")
}

fn default_library_db_url() -> String {
    "sqlite://./data/wavevault.db".to_string()
}

fn default_scan() -> ScanSettings {
    ScanSettings {
        concurrency: default_concurrency(),
        workers: default_workers(),
        task_timeout_ms: default_task_timeout_ms(),
        extensions: default_extensions(),
    }
}

fn default_concurrency() -> usize {
    8
}

fn default_workers() -> usize {
    num_cpus::get().max(1)
}

fn default_task_timeout_ms() -> u64 {
    30_000
}

fn default_extensions() -> Vec<String> {
    DEFAULT_AUDIO_EXTENSIONS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_classifier() -> ClassifierSettings {
    ClassifierSettings {
        enabled: false,
        program: default_classifier_program(),
        args: Vec::new(),
        timeout_ms: default_classifier_timeout_ms(),
    }
}

fn default_classifier_program() -> PathBuf {
    PathBuf::from("classify_audio")
}

fn default_classifier_timeout_ms() -> u64 {
    5_000
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            paths: default_paths(),
            scan: default_scan(),
            classifier: default_classifier(),
        }
    }
}
