//! TOML-based configuration for the alert listener.
//!
//! The config file sits next to the executable and shares its base name, so
//! `wsjtx-alert` (or `wsjtx-alert.exe`) reads `wsjtx-alert.toml`.  A path given
//! on the command line takes precedence.
//!
//! ```toml
//! [server]
//! ip = "127.0.0.1"
//! port = 2237
//! log_level = "info"
//!
//! [prefixes]
//! callsign = ["KH6", "VK"]
//! gridsquare = ["DN", "BL"]
//!
//! [alert]
//! repeat = 5
//! reply_on_match = false
//!
//! [log]
//! file = true
//! # path = "/var/log/wsjtx-alert.log"
//! ```
//!
//! Log lines are appended to `<config stem>.log` beside the config file
//! unless `log.path` names another file or `log.file` is `false`.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  A missing file
//! yields [`AppConfig::default()`], which listens on the WSJT-X default UDP
//! port and has no prefixes (so never alerts).

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::rules::PrefixRules;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path of the running executable could not be determined.
    #[error("could not determine executable path: {0}")]
    NoExecutablePath(#[source] std::io::Error),

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `server.ip` is not an IP address.
    #[error("invalid listen address {0:?}")]
    InvalidAddress(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub prefixes: PrefixesConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where to listen for WSJT-X datagrams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind.  WSJT-X sends to 127.0.0.1 unless configured for
    /// multicast.
    #[serde(default = "default_ip")]
    pub ip: String,
    /// UDP port; must match WSJT-X's "UDP Server port number".
    #[serde(default = "default_port")]
    pub port: u16,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Prefix lists the alert rules match against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrefixesConfig {
    #[serde(default)]
    pub callsign: Vec<String>,
    #[serde(default)]
    pub gridsquare: Vec<String>,
}

/// What happens when a rule hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertConfig {
    /// Beeps per hit; `0` silences the bell but keeps the log line.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Send a REPLY back to WSJT-X when a callsign prefix hits.
    #[serde(default)]
    pub reply_on_match: bool,
}

/// Where log lines are kept besides the console.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Append log lines to a file.
    #[serde(default = "default_log_file")]
    pub file: bool,
    /// Explicit log file; `None` means `<config stem>.log`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl LogConfig {
    /// Log file to append to for a config loaded from `config_path`, if any.
    pub fn file_path(&self, config_path: &Path) -> Option<PathBuf> {
        if !self.file {
            return None;
        }
        Some(
            self.path
                .clone()
                .unwrap_or_else(|| log_path_for(config_path)),
        )
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    2237
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_repeat() -> u32 {
    5
}
fn default_log_file() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            repeat: default_repeat(),
            reply_on_match: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            path: None,
        }
    }
}

impl ServerConfig {
    /// Parses `ip` and `port` into a bindable address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if `ip` does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .ip
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(self.ip.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl From<&PrefixesConfig> for PrefixRules {
    fn from(cfg: &PrefixesConfig) -> Self {
        PrefixRules::new(cfg.callsign.iter().cloned(), cfg.gridsquare.iter().cloned())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves `<executable dir>/<executable stem>.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoExecutablePath`] if the executable path is unknown.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::NoExecutablePath)?;
    Ok(config_path_for(&exe))
}

/// Config path belonging to the executable at `exe`.
pub fn config_path_for(exe: &Path) -> PathBuf {
    exe.with_extension("toml")
}

/// Log path belonging to the executable or config file at `base`.
pub fn log_path_for(base: &Path) -> PathBuf {
    base.with_extension("log")
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::InvalidAddress`] if `server.ip` is not an IP address.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    cfg.server.socket_addr()?;
    Ok(cfg)
}

/// Loads `AppConfig` from `path`, writing a starter file of defaults first
/// when none exists.  The flag reports whether the file was created.
///
/// # Errors
///
/// As [`load_config`] and [`save_config`].
pub fn load_or_init_config(path: &Path) -> Result<(AppConfig, bool), ConfigError> {
    if path.exists() {
        return Ok((load_config(path)?, false));
    }
    let cfg = AppConfig::default();
    save_config(path, &cfg)?;
    Ok((cfg, true))
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
