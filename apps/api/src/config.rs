use std::str::FromStr;

use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which annotator backs the language pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NlpBackend {
    /// In-process heuristic tagger.
    Heuristic,
    /// External annotation service at the given URL.
    Remote { url: String },
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable is present but invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// JSONL entity-ruler patterns, loaded once at startup.
    pub skill_patterns_path: String,
    pub nlp_backend: NlpBackend,
    pub max_upload_bytes: usize,
    pub max_concurrent_extractions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            skill_patterns_path: "skills.jsonl".to_string(),
            nlp_backend: NlpBackend::Heuristic,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_concurrent_extractions: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        let nlp_backend = match optional_env("NLP_BACKEND").as_deref() {
            None | Some("heuristic") => NlpBackend::Heuristic,
            Some("remote") => NlpBackend::Remote {
                url: require_env("NLP_SERVICE_URL")?,
            },
            Some(other) => bail!("NLP_BACKEND must be 'heuristic' or 'remote', got '{other}'"),
        };

        let max_concurrent_extractions: usize =
            parse_env("MAX_CONCURRENT_EXTRACTIONS", defaults.max_concurrent_extractions)?;
        if max_concurrent_extractions == 0 {
            bail!("MAX_CONCURRENT_EXTRACTIONS must be at least 1");
        }

        Ok(Config {
            port: parse_env("PORT", defaults.port).context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or(defaults.rust_log),
            skill_patterns_path: optional_env("SKILL_PATTERNS_PATH")
                .unwrap_or(defaults.skill_patterns_path),
            nlp_backend,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_concurrent_extractions,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.nlp_backend, NlpBackend::Heuristic);
        assert_eq!(config.max_concurrent_extractions, 1);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u16 = parse_env("RESUME_API_TEST_SURELY_UNSET", 42).unwrap();
        assert_eq!(value, 42);
    }
}
