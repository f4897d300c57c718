use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODELS: &str = "llama-3.3-70b-versatile,llama-3.1-8b-instant,mixtral-8x7b-32768";
const API_KEY_VAR: &str = "GROQ_API_KEY";
const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY not found in environment variables. Please check your .env file.")]
    MissingCredential,
    #[error("GROQ_MODELS must name at least one model")]
    NoModels,
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub models: Vec<String>,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub log_max_files: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads the env file (if any) and reads the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        let env_file = std::env::var("ENV_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".env"));
        dotenvy::from_path(&env_file).ok();

        Self::from_source(&env_file, |key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to a direct read of
    /// `env_file` for the credential only.
    fn from_source<F>(env_file: &Path, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let groq_api_key = match var(API_KEY_VAR) {
            Some(key) => key,
            None => read_key_from_env_file(env_file, API_KEY_VAR)
                .ok_or(ConfigError::MissingCredential)?,
        };

        let groq_base_url = var("GROQ_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // An explicitly empty list is an error, not a request for the defaults.
        let models = parse_list(&lookup("GROQ_MODELS").unwrap_or_else(|| DEFAULT_MODELS.to_string()));
        if models.is_empty() {
            return Err(ConfigError::NoModels);
        }

        let timeout_secs = parse_or("GROQ_TIMEOUT_SECS", var("GROQ_TIMEOUT_SECS"), 60u64)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue { key: "GROQ_TIMEOUT_SECS", value: "0".to_string() });
        }
        let port = parse_or("PORT", var("PORT"), 5000u16)?;
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_dir = var("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs"));
        let log_max_files = var("LOG_MAX_FILES").unwrap_or_else(|| "7d".to_string());

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(v) => parse_list(&v),
            None => vec!["*".to_string()],
        };

        Ok(Config {
            groq_api_key,
            groq_base_url,
            models,
            request_timeout: Duration::from_secs(timeout_secs),
            host,
            port,
            log_level,
            log_dir,
            log_max_files,
            cors_origins,
        })
    }

    pub fn print(&self) {
        println!("Current configuration:");
        println!("  - HOST: {}", self.host);
        println!("  - PORT: {}", self.port);
        println!("  - GROQ_BASE_URL: {}", self.groq_base_url);
        println!("  - GROQ_API_KEY: {}", if self.groq_api_key.is_empty() { "not set" } else { "set" });
        println!("  - GROQ_MODELS: {}", self.models.join(", "));
        println!("  - GROQ_TIMEOUT_SECS: {}", self.request_timeout.as_secs());
        println!("  - LOG_LEVEL: {}", self.log_level);
        println!("  - LOG_DIR: {}", self.log_dir.display());
        println!("  - CORS_ORIGINS: {}", self.cors_origins.join(", "));
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, def: T) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.parse::<T>().map_err(|_| ConfigError::InvalidValue { key, value: v }),
        None => Ok(def),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Second chance for env files saved with a byte-order mark, which hides the
/// first key from the regular loader.
fn read_key_from_env_file(path: &Path, key: &str) -> Option<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            if path.exists() {
                eprintln!("Warning: Could not read {}: {err}", path.display());
            }
            return None;
        }
    };
    find_key(&raw, key)
}

fn find_key(raw: &str, key: &str) -> Option<String> {
    let content = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    dotenvy::from_read_iter(content.as_bytes())
        .filter_map(Result::ok)
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
