//! Image transformation URL building, responsive descriptors and a headless
//! display model for Supabase-hosted images.
//! This crate is consumed by the `supaimg` CLI.

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod srcset;
pub mod storage;
pub mod transform;

pub use crate::cache::{LruUrlCache, UrlCache};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::models::*;
pub use crate::transform::{BuilderMode, PassthroughBuilder, ProxyBuilder, UrlBuilder};

use std::sync::Arc;

/// Builder selected by `config.builder_mode`, backed by a cache of the
/// configured capacity.
pub fn builder_from_config(config: &Config) -> Arc<dyn UrlBuilder> {
    let cache: Arc<dyn UrlCache> = Arc::new(LruUrlCache::new(config.cache_capacity));
    transform::builder_for(config.builder_mode, cache)
}
