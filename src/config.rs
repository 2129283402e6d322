use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_LANGUAGE: &str = "es-ES";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub image_base: String,
    pub language: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads the process environment. `TMDB_API_KEY` is the only required
    /// variable.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .context("TMDB_API_KEY not set")?;
        let http_timeout = match env::var("CINEFAV_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("invalid CINEFAV_HTTP_TIMEOUT_SECS '{raw}'"))?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        Ok(Self {
            api_key,
            api_base: var_or("TMDB_BASE_URL", DEFAULT_API_BASE),
            image_base: var_or("TMDB_IMAGE_BASE_URL", DEFAULT_IMAGE_BASE),
            language: var_or("TMDB_LANGUAGE", DEFAULT_LANGUAGE),
            data_dir: env::var("CINEFAV_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".cinefav")),
            http_timeout,
        })
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            data_dir: PathBuf::from(".cinefav"),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
