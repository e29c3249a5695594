use config::{Config, Environment, File};
use herald_event_bus::BusConfig;
use herald_runtime::RuntimeConfig;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

const ENV_PREFIX: &str = "HERALD";
const DEFAULT_CONFIG_FILE: &str = "herald";

/// Errors raised while reading configuration.
#[herald_derive::herald_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Everything herald reads at startup.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub logging: LoggingConfig,
    pub bus: BusConfig,
    pub dispatch: DispatchConfig,
}

/// Global subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name; prefixes rolling log files.
    pub name: String,
    /// Default level: `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub level: String,
    pub console: bool,
    /// Rolling log files are written here when set.
    pub directory: Option<PathBuf>,
    /// JSON file records. Ignored without `directory`.
    pub json: bool,
    /// Extra per-target directives, e.g. `herald_event_bus=trace`.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "herald".to_owned(),
            level: "info".to_owned(),
            console: true,
            directory: None,
            json: false,
            filter: None,
        }
    }
}

/// Background runtime used as a dispatch target for asynchronous deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub enabled: bool,
    /// `0` uses the available parallelism.
    pub worker_threads: usize,
    pub thread_name: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { enabled: false, worker_threads: 0, thread_name: "herald-dispatch".to_owned() }
    }
}

impl DispatchConfig {
    #[must_use]
    pub fn runtime_config(&self) -> RuntimeConfig {
        let config = RuntimeConfig::default().with_thread_name(self.thread_name.clone());
        if self.worker_threads == 0 { config } else { config.with_worker_threads(self.worker_threads) }
    }
}

/// Loads `T` from a configuration file with environment overrides on top.
///
/// The file is required; its format follows the extension (`.toml`, `.json`,
/// `.yaml`, ...), and without a path `herald.*` in the working directory is
/// used. Variables prefixed `HERALD__` override file values, with `__`
/// separating nested keys: `HERALD__BUS__COMPACTION_INTERVAL=64` sets
/// `bus.compaction_interval`.
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or unreadable, or if
/// the merged values do not deserialize into `T`.
///
/// # Example
/// ```rust,no_run
/// use herald::config::{HeraldConfig, load_config};
///
/// let config: HeraldConfig = load_config(Some("config/herald.toml")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());
    info!(path = %path.display(), "Loading configuration");

    Config::builder()
        .add_source(File::from(path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX).separator("__").convert_case(config::Case::Snake),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
