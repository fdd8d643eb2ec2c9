use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: SocketAddr,
    pub api_base: Option<String>,
    pub api_path: Option<String>,
    pub categories: Vec<String>,
    pub snapshot_dir: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub rules_dir: Option<PathBuf>,
    pub default_image: Option<String>,
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            http_addr: try_load("RIGCAT_HTTP_ADDR", "0.0.0.0:8080")?,
            api_base: optional("RIGCAT_API_BASE"),
            api_path: optional("RIGCAT_API_PATH"),
            categories: optional("RIGCAT_CATEGORIES")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
            snapshot_dir: optional("RIGCAT_SNAPSHOT_DIR").map(PathBuf::from),
            schema_dir: optional("RIGCAT_SCHEMA_DIR").map(PathBuf::from),
            rules_dir: optional("RIGCAT_RULES_DIR").map(PathBuf::from),
            default_image: optional("RIGCAT_DEFAULT_IMAGE"),
            fetch_timeout_secs: try_load("RIGCAT_FETCH_TIMEOUT_SECS", "10")?,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = optional(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key}: {e}")
    })
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
