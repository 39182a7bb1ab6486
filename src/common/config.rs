//! # Configuration
//!
//! All deployment-time settings are collected into one immutable
//! [`CheckerConfig`] at startup and passed into the pipeline explicitly.
//!
//! Settings come from an optional TOML file overlaid by environment variables:
//!
//! | Variable                  | TOML key                      | Required |
//! |---------------------------|-------------------------------|----------|
//! | `CLASSIFICATION_API_KEY`  | `classification.api_key`      | yes      |
//! | `CLASSIFICATION_ENDPOINT` | `classification.endpoint`     | no       |
//! | `MATCH_ALLOWLIST`         | `matching.allow_list`         | yes      |
//! | `STORAGE_HOST`            | `storage.host`                | yes      |
//! | `MARMOT_LISTEN_ADDR`      | `server.listen_addr`          | no       |
//!
//! # Example TOML
//!
//! ```toml
//! [classification]
//! api_key = "AIza..."
//! timeout_secs = 30
//!
//! [matching]
//! allow_list = ["marmot", "groundhog"]
//!
//! [storage]
//! host = "localhost:11113"
//!
//! [server]
//! listen_addr = "0.0.0.0:2332"
//! max_upload_bytes = 20971520
//! ```

use anyhow::Result;
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use super::error::PipelineError;
use crate::processing::matcher::AllowList;

pub const ENV_API_KEY: &str = "CLASSIFICATION_API_KEY";
pub const ENV_ENDPOINT: &str = "CLASSIFICATION_ENDPOINT";
pub const ENV_ALLOWLIST: &str = "MATCH_ALLOWLIST";
pub const ENV_STORAGE_HOST: &str = "STORAGE_HOST";
pub const ENV_LISTEN_ADDR: &str = "MARMOT_LISTEN_ADDR";

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:2332";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

// ============================================================================
// FILE LAYER - every field optional, environment fills the gaps
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub classification: ClassificationSection,
    pub matching: MatchingSection,
    pub storage: StorageSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    pub allow_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub host: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen_addr: Option<String>,
    /// Directory for per-request temporary files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
}

// ============================================================================
// RESOLVED CONFIGURATION
// ============================================================================

/// Settings for the remote classification service.
#[derive(Clone)]
pub struct ClassificationSettings {
    pub api_key: String,
    pub endpoint: Url,
    pub timeout: Duration,
}

// The API key never goes to the logs.
impl fmt::Debug for ClassificationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Settings for the storage/indexing service.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Base URL, e.g. `http://localhost:11113/`
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

/// Complete, validated checker configuration.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub classification: ClassificationSettings,
    pub allow_list: AllowList,
    pub storage: StorageSettings,
    pub server: ServerSettings,
}

impl CheckerConfig {
    /// Load the optional TOML file at `path`, then apply the process environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => load_config::<FileConfig>(path)?,
            None => FileConfig::default(),
        };
        let config = Self::from_sources(file, |key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Resolve a configuration from a file layer and an environment lookup.
    ///
    /// Environment values win over file values. Missing required settings are
    /// reported as [`PipelineError::Config`].
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset, except for the allow-list where an
        // empty value is an empty list.
        let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

        let api_key = lookup(ENV_API_KEY)
            .or(file.classification.api_key)
            .ok_or_else(|| missing(ENV_API_KEY))?;

        let endpoint = lookup(ENV_ENDPOINT)
            .or(file.classification.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = Url::parse(&endpoint).map_err(|e| {
            PipelineError::Config(format!("invalid classification endpoint '{}': {}", endpoint, e))
        })?;

        let allow_list = match env(ENV_ALLOWLIST) {
            Some(raw) => AllowList::parse(&raw),
            None => file
                .matching
                .allow_list
                .map(AllowList::new)
                .ok_or_else(|| missing(ENV_ALLOWLIST))?,
        };

        let storage_host = lookup(ENV_STORAGE_HOST)
            .or(file.storage.host)
            .ok_or_else(|| missing(ENV_STORAGE_HOST))?;
        let base_url = storage_base_url(&storage_host)?;

        let listen_addr = lookup(ENV_LISTEN_ADDR)
            .or(file.server.listen_addr)
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        Ok(CheckerConfig {
            classification: ClassificationSettings {
                api_key,
                endpoint,
                timeout: Duration::from_secs(
                    file.classification.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                ),
            },
            allow_list,
            storage: StorageSettings {
                base_url,
                timeout: Duration::from_secs(
                    file.storage.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                ),
            },
            server: ServerSettings {
                listen_addr,
                temp_dir: file.server.temp_dir,
                max_upload_bytes: file
                    .server
                    .max_upload_bytes
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
        })
    }
}

fn missing(key: &str) -> PipelineError {
    PipelineError::Config(format!("please set the environment variable {}", key))
}

/// Turn `host:port` (or a full URL) into a base URL ending in `/`.
fn storage_base_url(host: &str) -> Result<Url, PipelineError> {
    let mut raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    if !raw.ends_with('/') {
        raw.push('/');
    }

    let url = Url::parse(&raw)
        .map_err(|e| PipelineError::Config(format!("invalid storage host '{}': {}", host, e)))?;
    if url.cannot_be_a_base() {
        return Err(PipelineError::Config(format!(
            "storage host '{}' cannot be used as a base URL",
            host
        )));
    }
    Ok(url)
}
