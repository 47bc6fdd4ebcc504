//! Client Configuration
//!
//! Settings come from a TOML file when one is found, then environment
//! variables win over whatever the file says:
//!
//! | Variable            | Setting           |
//! |---------------------|-------------------|
//! | `NS_ADDR`           | `service.addr`    |
//! | `NEBULA_LOG_LEVEL`  | `logging.level`   |
//! | `NEBULA_LOG_FORMAT` | `logging.format`  |

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Service address used when nothing else is configured
pub const DEFAULT_ADDR: &str = "localhost:9190";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how to reach the query service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `host:port` or a full URL
    pub addr: String,

    /// Per-request timeout enforced by the channel
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    /// Base URL of the service, adding `http://` when no scheme is given
    pub fn base_url(&self) -> String {
        let addr = self.addr.trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{}", addr)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level directive for this crate (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Parse a config file, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise the first config found in
    /// [`Config::search_paths`], then apply environment overrides
    ///
    /// An explicit path must exist and parse. A discovered file that fails
    /// to load is skipped with a warning.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::discover(),
        };
        Ok(config.with_env_overrides())
    }

    fn discover() -> Self {
        for path in Self::search_paths().iter().filter(|p| p.exists()) {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => tracing::warn!("Skipping config: {}", e),
            }
        }
        Self::default()
    }

    /// Config file locations, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = dirs::config_dir()
            .map(|dir| dir.join("nebula").join("config.toml"))
            .into_iter()
            .collect();
        paths.push(PathBuf::from("/etc/nebula/config.toml"));
        paths.push(PathBuf::from("./config.toml"));
        paths
    }

    /// Overlay `NS_ADDR`, `NEBULA_LOG_LEVEL` and `NEBULA_LOG_FORMAT`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("NS_ADDR") {
            self.service.addr = addr;
        }
        if let Some(level) = var("NEBULA_LOG_LEVEL") {
            self.logging.level = level;
        }
        match var("NEBULA_LOG_FORMAT").map(|v| (LogFormat::parse(&v), v)) {
            Some((Some(format), _)) => self.logging.format = format,
            Some((None, v)) => tracing::warn!("Ignoring unknown NEBULA_LOG_FORMAT {:?}", v),
            None => {}
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Commented config file with every setting at its default
pub fn generate_default_config() -> String {
    format!(
        r#"# nebula-client configuration
#
# NS_ADDR, NEBULA_LOG_LEVEL and NEBULA_LOG_FORMAT override this file.

[service]
# host:port or URL of the query service
addr = "{addr}"
request_timeout_secs = 30

[logging]
level = "info"
# pretty or json
format = "pretty"
"#,
        addr = DEFAULT_ADDR
    )
}
