use url::Url;

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Resolves storage object paths to their public URLs.
#[derive(Debug, Clone)]
pub struct StorageLocator {
    public_base: Url,
    bucket: String,
}

impl StorageLocator {
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let base_url = config
            .url
            .parse::<Url>()
            .map_err(|err| Error::InvalidConfig(format!("invalid SUPABASE_URL: {err}")))?;
        let public_base = config
            .public_base
            .as_ref()
            .map(|s| {
                s.parse::<Url>().map_err(|err| {
                    Error::InvalidConfig(format!("invalid SUPABASE_PUBLIC_BASE: {err}"))
                })
            })
            .transpose()?
            .unwrap_or(base_url);

        if config.bucket.trim().is_empty() {
            return Err(Error::InvalidConfig("storage bucket must not be empty".into()));
        }

        Ok(Self {
            public_base,
            bucket: config.bucket.clone(),
        })
    }

    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.public_base.as_str().trim_end_matches('/'),
            self.bucket,
            object_path.trim_start_matches('/')
        )
    }
}

/// Build a locator if storage configuration is present.
pub fn locator_from_config(config: &crate::config::Config) -> Result<Option<StorageLocator>> {
    match &config.storage {
        Some(cfg) => StorageLocator::from_config(cfg).map(Some),
        None => Ok(None),
    }
}

/// Like [`locator_from_config`], but missing storage configuration is an error.
pub fn require_locator(config: &crate::config::Config) -> Result<StorageLocator> {
    locator_from_config(config)?.ok_or_else(|| {
        Error::MissingStorageConfig(format!(
            "{} required to resolve object paths",
            crate::config::ENV_SUPABASE_URL
        ))
    })
}
