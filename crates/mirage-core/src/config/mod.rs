//! Routing configuration.
//!
//! Loaded once at startup from YAML and passed to the resolver by
//! reference. Nothing in here changes after construction.
//!
//! ```yaml
//! tls_verification: true
//! upstream_proxy: corp-proxy:3128
//! pac_file: /etc/mirage/proxy.pac
//! pac_cache: true
//! pac_cache_max_entries: 1024
//! pac_cache_ttl_seconds: 300
//! ```

mod upstream;

pub use upstream::parse_upstream_proxy;

use crate::error::ConfigError;
use crate::upstream::{PacCacheConfig, PacScript};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Verify upstream TLS certificates.
    #[serde(default = "default_tls_verification")]
    pub tls_verification: bool,

    /// Static upstream proxy, `host:port` or a full URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_proxy: Option<String>,

    /// PAC script on disk. Mutually exclusive with `pac_script`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pac_file: Option<PathBuf>,

    /// Inline PAC script source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pac_script: Option<String>,

    /// Cache PAC decisions per destination host.
    #[serde(default)]
    pub pac_cache: bool,

    /// Hosts kept in the PAC cache before the least recently used is dropped.
    #[serde(default = "default_pac_cache_max_entries")]
    pub pac_cache_max_entries: usize,

    /// Seconds a cached PAC decision stays valid (0 = no expiration).
    #[serde(default = "default_pac_cache_ttl_seconds")]
    pub pac_cache_ttl_seconds: u64,
}

fn default_tls_verification() -> bool {
    true
}

fn default_pac_cache_max_entries() -> usize {
    1024
}

fn default_pac_cache_ttl_seconds() -> u64 {
    300
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            tls_verification: default_tls_verification(),
            upstream_proxy: None,
            pac_file: None,
            pac_script: None,
            pac_cache: false,
            pac_cache_max_entries: default_pac_cache_max_entries(),
            pac_cache_ttl_seconds: default_pac_cache_ttl_seconds(),
        }
    }
}

impl RoutingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents)?;
        info!(path = %path.display(), "Loaded routing configuration");
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: RoutingConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(address) = &self.upstream_proxy {
            parse_upstream_proxy(address)?;
        }

        if self.pac_file.is_some() && self.pac_script.is_some() {
            return Err(ConfigError::Invalid(
                "'pac_file' and 'pac_script' cannot both be set".to_string(),
            ));
        }

        if self
            .pac_script
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err(ConfigError::Invalid("'pac_script' is empty".to_string()));
        }

        Ok(())
    }

    pub fn pac_cache_config(&self) -> PacCacheConfig {
        PacCacheConfig {
            enabled: self.pac_cache,
            max_size: self.pac_cache_max_entries,
            ttl: Duration::from_secs(self.pac_cache_ttl_seconds),
        }
    }

    /// The configured PAC script, read from disk when given as a file.
    pub fn load_pac_script(&self) -> Result<Option<PacScript>, ConfigError> {
        if let Some(source) = &self.pac_script {
            return Ok(Some(PacScript::new(source.clone())));
        }

        let Some(path) = &self.pac_file else {
            return Ok(None);
        };
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::PacFile {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "Loaded PAC file");
        Ok(Some(PacScript::new(source)))
    }
}
