//! Configuration loading and resolution
//!
//! A configuration is looked up in this order, first hit wins:
//! 1. Configuration passed in memory by the caller
//! 2. Explicit configuration file (skipped if it does not exist)
//! 3. `config.json` in the working directory
//! 4. `~/.braincube/config.json`
//!
//! Files ending in `.toml` are read as TOML, anything else as JSON.

use crate::path::{strip_domain, TENANT_PLACEHOLDER};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG: &str = "config.json";

/// Directory under the home directory holding the fallback configuration
pub const HOME_CONFIG_DIR: &str = ".braincube";

/// Combined connect + read timeout applied to every request
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connector configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectorConfig {
    /// Domain used to derive both base URLs (`test.com`)
    #[serde(default)]
    pub domain: Option<String>,

    /// Overrides the SSO base URL derived from `domain`
    #[serde(default)]
    pub sso_base_url: Option<String>,

    /// Overrides the API base URL derived from `domain`; may contain `{braincube-name}`
    #[serde(default)]
    pub braincube_base_url: Option<String>,

    /// Personal access token
    #[serde(default)]
    pub api_key: Option<String>,

    /// OAuth2 token exchanged for a session token at connect time
    #[serde(default)]
    pub oauth2_token: Option<String>,

    /// Verify TLS certificates
    #[serde(default = "default_verify")]
    pub verify: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Parameter store overrides (`page_size`, `parse_date`, `<Type>_name_key`...)
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
}

fn default_verify() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            domain: None,
            sso_base_url: None,
            braincube_base_url: None,
            api_key: None,
            oauth2_token: None,
            verify: default_verify(),
            timeout_secs: default_timeout_secs(),
            parameters: HashMap::new(),
        }
    }
}

impl ConnectorConfig {
    /// Configuration for a domain authenticated with an API key
    pub fn with_api_key(domain: &str, api_key: &str) -> Self {
        Self {
            domain: Some(domain.to_string()),
            api_key: Some(api_key.to_string()),
            ..Self::default()
        }
    }

    /// Base URL of the SSO server
    pub fn sso_base_url(&self) -> Result<String> {
        if let Some(url) = &self.sso_base_url {
            return Ok(url.clone());
        }
        self.domain
            .as_deref()
            .map(|domain| format!("https://{}", strip_domain(domain)))
            .ok_or_else(|| Error::Config("needs a domain or an sso_base_url".to_string()))
    }

    /// Base URL of the API server
    pub fn braincube_base_url(&self) -> Result<String> {
        if let Some(url) = &self.braincube_base_url {
            return Ok(url.clone());
        }
        self.domain
            .as_deref()
            .map(|domain| format!("https://api.{}", strip_domain(domain)))
            .ok_or_else(|| Error::Config("needs a domain or a braincube_base_url".to_string()))
    }

    /// Whether the API base URL carries the tenant placeholder
    pub fn has_tenant_placeholder(&self) -> bool {
        self.braincube_base_url
            .as_deref()
            .is_some_and(|url| url.contains(TENANT_PLACEHOLDER))
    }
}

/// Read a configuration file
pub fn read_config(path: &Path) -> Result<ConnectorConfig> {
    let content = std::fs::read_to_string(path)?;
    let is_toml = path.extension().is_some_and(|ext| ext == "toml");
    if is_toml {
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    } else {
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Locates the configuration following the documented precedence
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    default_file: PathBuf,
    home_file: Option<PathBuf>,
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self {
            default_file: PathBuf::from(DEFAULT_CONFIG),
            home_file: dirs::home_dir().map(|home| home.join(HOME_CONFIG_DIR).join(DEFAULT_CONFIG)),
        }
    }
}

impl ConfigLocator {
    /// Locator with explicit fallback locations
    pub fn new(default_file: PathBuf, home_file: Option<PathBuf>) -> Self {
        Self { default_file, home_file }
    }

    /// Pick the first usable configuration source
    pub fn resolve(
        &self,
        config: Option<ConnectorConfig>,
        config_file: Option<&Path>,
    ) -> Result<ConnectorConfig> {
        if let Some(config) = config {
            debug!("Using in-memory configuration");
            return Ok(config);
        }

        let candidates = config_file
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::iter::once(self.default_file.clone()))
            .chain(self.home_file.clone());

        for candidate in candidates {
            if candidate.exists() {
                debug!(path = %candidate.display(), "Using configuration file");
                return read_config(&candidate);
            }
        }

        Err(Error::ConfigurationNotFound)
    }
}
