//! Client configuration with environment-variable layering.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Url;
use tracing::warn;

use crate::error::{ApiError, ApiResult};

pub const ENV_API_URL: &str = "ENPLACE_API_URL";
pub const ENV_VAULT_DIR: &str = "ENPLACE_VAULT_DIR";
pub const ENV_TIMEOUT_MS: &str = "ENPLACE_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

static DEFAULT_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://localhost:5000/api/").expect("default base url"));

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root. Kept with a trailing slash so relative joins land under it.
    pub base_url: Url,
    /// Directory for the session vault; `None` keeps the session in memory.
    pub vault_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE.clone(),
            vault_dir: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn new(base: &str) -> ApiResult<Self> {
        let base_url = Url::parse(&ensure_trailing_slash(base))
            .map_err(|e| ApiError::transport(format!("invalid base url {}: {}", base, e)))?;
        Ok(Self { base_url, ..Self::default() })
    }

    /// Defaults overridden by `ENPLACE_API_URL`, `ENPLACE_VAULT_DIR` and
    /// `ENPLACE_TIMEOUT_MS` when set. Malformed values are ignored with a
    /// warning rather than failing startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(ENV_API_URL) {
            match Url::parse(&ensure_trailing_slash(&raw)) {
                Ok(url) => config.base_url = url,
                Err(e) => warn!("{} ignored ({}): {}", ENV_API_URL, raw, e),
            }
        }
        if let Ok(dir) = std::env::var(ENV_VAULT_DIR) {
            if !dir.is_empty() {
                config.vault_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(ms) = parse_ms_env(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_vault_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vault_dir = Some(dir.into());
        self
    }
}

fn ensure_trailing_slash(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

fn parse_ms_env(name: &str) -> Option<u64> {
    match std::env::var(name) {
        Ok(val) => match val.parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!("{} ignored (not a millisecond count): {}", name, val);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_segment_on_join() {
        let config = ClientConfig::new("http://localhost:5000/api").unwrap();
        let joined = config.base_url.join("recipes").unwrap();
        assert_eq!(joined.as_str(), "http://localhost:5000/api/recipes");
    }

    #[test]
    fn default_base_is_local_api() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "http://localhost:5000/api/");
        assert!(config.vault_dir.is_none());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        assert!(ClientConfig::new("not a url").is_err());
    }
}
