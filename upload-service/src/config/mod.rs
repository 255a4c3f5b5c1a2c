use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub storage: StorageConfig,
    pub public: PublicConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Parent of the `files` / `files_dev` directory.
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PublicConfig {
    /// Scheme and host prepended to every returned URL, e.g. `https://cdn.example.com`.
    pub url_host: String,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

/// Chosen once at startup from `PRODUCTION`; decides both the directory the
/// uploads land in and the path they are served under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Production,
    Development,
}

impl StorageMode {
    pub fn from_production_flag(flag: Option<&str>) -> Self {
        // Only the literal "true" switches to production.
        if flag == Some("true") {
            StorageMode::Production
        } else {
            StorageMode::Development
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            StorageMode::Production => "files",
            StorageMode::Development => "files_dev",
        }
    }

    pub fn route_prefix(self) -> &'static str {
        match self {
            StorageMode::Production => "/files",
            StorageMode::Development => "/files_dev",
        }
    }

    pub fn is_production(self) -> bool {
        self == StorageMode::Production
    }
}

impl StorageConfig {
    pub fn directory(&self) -> PathBuf {
        self.root.join(self.mode.dir_name())
    }
}

impl UploadConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let mode = StorageMode::from_production_flag(env::var("PRODUCTION").ok().as_deref());
        let is_prod = mode.is_production();
        let default_host = format!("http://localhost:{}", common_config.port);

        Ok(UploadConfig {
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("uploads"), is_prod)?,
            },
            storage: StorageConfig {
                mode,
                root: PathBuf::from(get_env("STORAGE_ROOT", Some("."), is_prod)?),
            },
            public: PublicConfig {
                url_host: get_env("URL_HOST", Some(&default_host), is_prod)?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(env::var("CORS_ALLOWED_ORIGINS").ok().as_deref()),
            },
            common: common_config,
        })
    }

    /// Public URL of a stored file: `<url_host>/<files|files_dev>/<filename>`.
    pub fn public_url(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public.url_host.trim_end_matches('/'),
            self.storage.mode.dir_name(),
            filename
        )
    }
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

const REQUIRED_IN_PRODUCTION: [&str; 2] = ["MONGODB_URI", "URL_HOST"];

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    resolve_env(key, env::var(key).ok(), default, is_prod)
}

fn resolve_env(
    key: &str,
    value: Option<String>,
    default: Option<&str>,
    is_prod: bool,
) -> Result<String, AppError> {
    match value {
        Some(val) => Ok(val),
        None => {
            if is_prod && REQUIRED_IN_PRODUCTION.contains(&key) {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}
