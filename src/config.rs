use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::GrabberError;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const DEFAULT_OUTPUT_DIR: &str = "fasta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const LOCAL_CONFIG_FILE: &str = "genbank-grabber.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: Option<String>,
    pub tool: Option<String>,
    pub email: Option<String>,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            tool: None,
            email: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: Endpoint,
    pub timeout: Duration,
    pub output_dir: Utf8PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, GrabberError> {
        let config = match path {
            Some(path) => Self::read(Path::new(path))?,
            None => match Self::discover() {
                Some(found) => Self::read(&found)?,
                None => Config::default(),
            },
        };
        let env_api_key = std::env::var("NCBI_API_KEY").ok();
        Self::resolve_config(config, env_api_key.as_deref())
    }

    pub fn resolve_config(
        config: Config,
        env_api_key: Option<&str>,
    ) -> Result<ResolvedConfig, GrabberError> {
        let base_url = config
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GrabberError::ConfigParse(format!(
                "base_url must be an http(s) URL: {base_url}"
            )));
        }

        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(GrabberError::ConfigParse(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        let api_key = env_api_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| non_blank(config.api_key));

        Ok(ResolvedConfig {
            endpoint: Endpoint {
                base_url,
                api_key,
                tool: non_blank(config.tool),
                email: non_blank(config.email),
            },
            timeout: Duration::from_secs(timeout_secs),
            output_dir: Utf8PathBuf::from(
                non_blank(config.output_dir).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
        })
    }

    fn read(path: &Path) -> Result<Config, GrabberError> {
        let content =
            fs::read_to_string(path).map_err(|_| GrabberError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| GrabberError::ConfigParse(err.to_string()))
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        user_config_path().filter(|path| path.is_file())
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join("genbank-grabber").join("config.json"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
