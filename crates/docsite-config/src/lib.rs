//! Configuration management for docsite.
//!
//! Parses `docsite.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Every value has a
//! default, so a missing config file yields a usable configuration rooted at
//! the current directory.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `docs.source_dir`
//! - `docs.output_dir`
//! - `diagrams.kroki_url`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docsite.toml";

/// Default diagram service host.
const DEFAULT_KROKI_URL: &str = "kroki.io";

/// Default output directory, relative to the config directory.
const DEFAULT_OUTPUT_DIR: &str = "build/docsite";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override documentation source directory.
    pub source_dir: Option<PathBuf>,
    /// Override build output directory.
    pub output_dir: Option<PathBuf>,
    /// Override diagram service URL or host.
    pub kroki_url: Option<String>,
    /// Override the wait-for-diagrams flag.
    pub wait_for_diagrams: Option<bool>,
    /// Override preview server host.
    pub host: Option<String>,
    /// Override preview server port.
    pub port: Option<u16>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preview server configuration.
    pub server: ServerConfig,
    /// Documentation paths (relative strings from TOML).
    docs: DocsConfigRaw,
    /// Diagram rendering configuration (raw).
    diagrams: DiagramsConfigRaw,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved diagrams configuration (set after loading).
    #[serde(skip)]
    pub diagrams_resolved: DiagramsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Preview server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// First port to try.
    pub port: u16,
    /// How many consecutive ports to try before giving up.
    pub max_port_attempts: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9000,
            max_port_attempts: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    shell_dir: Option<String>,
}

/// Resolved documentation paths.
#[derive(Debug, Default)]
pub struct DocsConfig {
    /// Source content root (contains `docsite.config.json`).
    pub source_dir: PathBuf,
    /// Build output root. Owned exclusively by the running build.
    pub output_dir: PathBuf,
    /// Directory replacing the embedded site shell, if configured.
    pub shell_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DiagramsConfigRaw {
    kroki_url: Option<String>,
    wait: Option<bool>,
    timeout_secs: Option<u64>,
}

/// Resolved diagram rendering configuration.
#[derive(Debug)]
pub struct DiagramsConfig {
    /// Diagram service host (`kroki.io`) or base URL (`http://localhost:8000`).
    pub kroki_url: String,
    /// Render diagrams before emitting the document instead of in the background.
    pub wait: bool,
    /// Per-request timeout. `None` means requests never time out.
    pub timeout: Option<Duration>,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: DEFAULT_KROKI_URL.to_owned(),
            wait: false,
            timeout: None,
        }
    }
}

impl DiagramsConfig {
    /// Base URL for diagram requests.
    ///
    /// A bare host is served over HTTPS; a value with a scheme is used as-is.
    /// Trailing slashes are removed.
    #[must_use]
    pub fn service_url(&self) -> String {
        let url = self.kroki_url.trim_end_matches('/');
        if url.contains("://") {
            url.to_owned()
        } else {
            format!("https://{url}")
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_HOST`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docsite.toml` in current directory and parents,
    /// falling back to defaults rooted at the current directory.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.docs_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams_resolved.kroki_url.clone_from(kroki_url);
        }
        if let Some(wait) = settings.wait_for_diagrams {
            self.diagrams_resolved.wait = wait;
        }
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            docs: DocsConfigRaw::default(),
            diagrams: DiagramsConfigRaw::default(),
            docs_resolved: DocsConfig {
                source_dir: base.to_path_buf(),
                output_dir: base.join(DEFAULT_OUTPUT_DIR),
                shell_dir: None,
            },
            diagrams_resolved: DiagramsConfig::default(),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called by [`Config::load`] after CLI settings are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        if self.server.max_port_attempts == 0 {
            return Err(ConfigError::Validation(
                "server.max_port_attempts must be at least 1".to_owned(),
            ));
        }

        let kroki_url = &self.diagrams_resolved.kroki_url;
        require_non_empty(kroki_url, "diagrams.kroki_url")?;
        if kroki_url.contains("://")
            && !kroki_url.starts_with("http://")
            && !kroki_url.starts_with("https://")
        {
            return Err(ConfigError::Validation(
                "diagrams.kroki_url must use http:// or https://".to_owned(),
            ));
        }
        if self.diagrams_resolved.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref dir) = self.docs.source_dir {
            self.docs.source_dir = Some(expand::expand_env(dir, "docs.source_dir")?);
        }
        if let Some(ref dir) = self.docs.output_dir {
            self.docs.output_dir = Some(expand::expand_env(dir, "docs.output_dir")?);
        }
        if let Some(ref url) = self.diagrams.kroki_url {
            self.diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory and fill defaults.
    fn resolve(&mut self, config_dir: &Path) {
        let resolve = |path: &str| {
            if path == "." {
                config_dir.to_path_buf()
            } else {
                config_dir.join(path)
            }
        };

        self.docs_resolved = DocsConfig {
            source_dir: resolve(self.docs.source_dir.as_deref().unwrap_or(".")),
            output_dir: resolve(self.docs.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR)),
            shell_dir: self.docs.shell_dir.as_deref().map(resolve),
        };

        self.diagrams_resolved = DiagramsConfig {
            kroki_url: self
                .diagrams
                .kroki_url
                .clone()
                .unwrap_or_else(|| DEFAULT_KROKI_URL.to_owned()),
            wait: self.diagrams.wait.unwrap_or(false),
            timeout: self.diagrams.timeout_secs.map(Duration::from_secs),
        };
    }
}
