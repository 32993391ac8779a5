use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{Error, Result};
use crate::transform::BuilderMode;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use strum::{Display, EnumString};

pub const ENV_BUILDER_MODE: &str = "SUPAIMG_BUILDER_MODE";
pub const ENV_CACHE_CAPACITY: &str = "SUPAIMG_CACHE_CAPACITY";
pub const ENV_LOG_LEVEL: &str = "SUPAIMG_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "SUPAIMG_LOG_FORMAT";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_BUCKET: &str = "SUPABASE_BUCKET";
pub const ENV_SUPABASE_PUBLIC_BASE: &str = "SUPABASE_PUBLIC_BASE";
pub const ENV_KEYS: [&str; 7] = [
    ENV_BUILDER_MODE,
    ENV_CACHE_CAPACITY,
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
    ENV_SUPABASE_URL,
    ENV_SUPABASE_BUCKET,
    ENV_SUPABASE_PUBLIC_BASE,
];
pub const DEFAULT_SUPABASE_BUCKET: &str = "images-bucket";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Runtime configuration resolved from environment and optional config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub builder_mode: BuilderMode,
    pub cache_capacity: NonZeroUsize,
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: Option<StorageConfig>,
}

/// On-disk shape of `config.toml`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    pub builder_mode: Option<String>,
    pub cache_capacity: Option<usize>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_bucket: Option<String>,
    pub supabase_public_base: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigDoctor {
    pub builder_mode: BuilderMode,
    pub cache_capacity: usize,
    pub log_level: String,
    pub log_format: LogFormat,
    pub source: String,
    pub config_path: Option<String>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub url: String,
    pub bucket: String,
    pub public_base: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builder_mode: BuilderMode::default(),
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
            storage: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let file_config = config_path()
            .as_ref()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|contents| toml::from_str::<ConfigFile>(&contents))
            .transpose()?;

        Self::resolve(file_config.as_ref(), |key| std::env::var(key).ok())
    }

    /// Merge environment values over the config file over defaults.
    pub fn resolve(
        file_config: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |key: &str, from_file: Option<String>| {
            env(key)
                .filter(|v| !v.trim().is_empty())
                .or(from_file)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let builder_mode = lookup(
            ENV_BUILDER_MODE,
            file_config.and_then(|c| c.builder_mode.clone()),
        )
        .map(|raw| {
            BuilderMode::from_str(&raw.to_ascii_lowercase()).map_err(|_| {
                Error::InvalidConfig(format!(
                    "builder mode must be `passthrough` or `proxy`, got `{raw}`"
                ))
            })
        })
        .transpose()?
        .unwrap_or_default();

        let cache_capacity = lookup(
            ENV_CACHE_CAPACITY,
            file_config.and_then(|c| c.cache_capacity.map(|n| n.to_string())),
        )
        .map(|raw| {
            raw.parse::<usize>().map_err(|err| {
                Error::InvalidConfig(format!("{ENV_CACHE_CAPACITY} must be an integer: {err}"))
            })
        })
        .transpose()?
        .unwrap_or(DEFAULT_CACHE_CAPACITY);
        let cache_capacity = NonZeroUsize::new(cache_capacity).ok_or_else(|| {
            Error::InvalidConfig("cache capacity must be greater than zero".into())
        })?;

        let log_level = lookup(ENV_LOG_LEVEL, file_config.and_then(|c| c.log_level.clone()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let log_format = lookup(ENV_LOG_FORMAT, file_config.and_then(|c| c.log_format.clone()))
            .map(|raw| {
                LogFormat::from_str(&raw.to_ascii_lowercase()).map_err(|_| {
                    Error::InvalidConfig(format!(
                        "log format must be `compact` or `json`, got `{raw}`"
                    ))
                })
            })
            .transpose()?
            .unwrap_or_default();

        let storage = resolve_storage(file_config, &lookup);

        Ok(Self {
            builder_mode,
            cache_capacity,
            log_level,
            log_format,
            storage,
        })
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = config_path() else {
            return Err(Error::InvalidConfig(
                "unable to determine config directory".into(),
            ));
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(&self.to_file())
            .map_err(|err| Error::InvalidConfig(format!("failed to serialize config: {err}")))?;
        fs::write(&path, serialized)?;
        Ok(())
    }

    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            builder_mode: Some(self.builder_mode.to_string()),
            cache_capacity: Some(self.cache_capacity.get()),
            log_level: Some(self.log_level.clone()),
            log_format: Some(self.log_format.to_string()),
            supabase_url: self.storage.as_ref().map(|s| s.url.clone()),
            supabase_bucket: self.storage.as_ref().map(|s| s.bucket.clone()),
            supabase_public_base: self.storage.as_ref().and_then(|s| s.public_base.clone()),
        }
    }

    pub fn doctor(&self) -> ConfigDoctor {
        self.doctor_with(|key| std::env::var(key).ok())
    }

    /// Report the effective config; `env` is the same lookup `resolve` takes.
    pub fn doctor_with(&self, env: impl Fn(&str) -> Option<String>) -> ConfigDoctor {
        let from_env = ENV_KEYS
            .iter()
            .any(|key| env(key).is_some_and(|v| !v.trim().is_empty()));
        let source = if from_env {
            "environment".to_string()
        } else {
            "config file / defaults".to_string()
        };
        ConfigDoctor {
            builder_mode: self.builder_mode,
            cache_capacity: self.cache_capacity.get(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            source,
            config_path: config_path().map(|p| p.display().to_string()),
            storage: self.storage.clone(),
        }
    }
}

fn resolve_storage(
    file_config: Option<&ConfigFile>,
    lookup: &impl Fn(&str, Option<String>) -> Option<String>,
) -> Option<StorageConfig> {
    let url = lookup(
        ENV_SUPABASE_URL,
        file_config.and_then(|c| c.supabase_url.clone()),
    )?;
    let bucket = lookup(
        ENV_SUPABASE_BUCKET,
        file_config.and_then(|c| c.supabase_bucket.clone()),
    )
    .unwrap_or_else(|| DEFAULT_SUPABASE_BUCKET.to_string());
    let public_base = lookup(
        ENV_SUPABASE_PUBLIC_BASE,
        file_config.and_then(|c| c.supabase_public_base.clone()),
    );

    Some(StorageConfig {
        url,
        bucket,
        public_base,
    })
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("supaimg").join("config.toml"))
}
