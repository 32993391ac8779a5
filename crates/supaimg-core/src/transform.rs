//! Transformation URL builders.
//!
//! `PassthroughBuilder` is the shipped behaviour and never rewrites a URL.
//! `ProxyBuilder` derives `<base>/transform?<params>` URLs for an image proxy
//! and memoizes them in an injected [`UrlCache`]. Both are fail-open: whatever
//! goes wrong, the caller gets a usable URL back.

use std::sync::Arc;

use serde_json::{Map, Value};
use strum::{Display, EnumString};
use url::{Url, form_urlencoded};

use crate::cache::{LruUrlCache, UrlCache, cache_key};
use crate::error::{Error, Result};
use crate::models::ImageTransformations;

pub const TRANSFORM_PATH: &str = "/transform";

/// Which builder variant to run.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BuilderMode {
    #[default]
    Passthrough,
    Proxy,
}

pub trait UrlBuilder: Send + Sync {
    /// Derive the URL to display for `source_url`. Never fails; on any
    /// internal error the source URL is returned unchanged.
    fn build(&self, source_url: &str, transformations: Option<&ImageTransformations>) -> Arc<str>;

    fn mode(&self) -> BuilderMode;
}

/// Returns the source URL untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughBuilder;

impl UrlBuilder for PassthroughBuilder {
    fn build(&self, source_url: &str, _transformations: Option<&ImageTransformations>) -> Arc<str> {
        Arc::from(source_url)
    }

    fn mode(&self) -> BuilderMode {
        BuilderMode::Passthrough
    }
}

/// Builds image-proxy URLs and memoizes them.
#[derive(Clone)]
pub struct ProxyBuilder {
    cache: Arc<dyn UrlCache>,
}

impl ProxyBuilder {
    pub fn new(cache: Arc<dyn UrlCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn UrlCache> {
        &self.cache
    }

    fn try_build(
        &self,
        source_url: &str,
        transformations: &ImageTransformations,
    ) -> Result<Arc<str>> {
        let key = cache_key(source_url, transformations)?;
        self.cache.get_or_try_insert_with(key, &mut || {
            let base = base_url(source_url);
            let params = query_params(transformations)?;
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &params {
                query.append_pair(name, value);
            }
            Ok(Arc::from(format!("{base}{TRANSFORM_PATH}?{}", query.finish())))
        })
    }
}

impl Default for ProxyBuilder {
    fn default() -> Self {
        Self::new(Arc::new(LruUrlCache::default()))
    }
}

impl UrlBuilder for ProxyBuilder {
    fn build(&self, source_url: &str, transformations: Option<&ImageTransformations>) -> Arc<str> {
        let Some(transformations) = transformations.filter(|t| !t.is_empty()) else {
            return Arc::from(source_url);
        };
        match self.try_build(source_url, transformations) {
            Ok(url) => url,
            Err(err) => {
                tracing::warn!(
                    source_url,
                    error = %err,
                    "failed to build transformed url, using source url"
                );
                Arc::from(source_url)
            }
        }
    }

    fn mode(&self) -> BuilderMode {
        BuilderMode::Proxy
    }
}

/// Builder for `mode`; the proxy variant memoizes into `cache`.
pub fn builder_for(mode: BuilderMode, cache: Arc<dyn UrlCache>) -> Arc<dyn UrlBuilder> {
    match mode {
        BuilderMode::Passthrough => Arc::new(PassthroughBuilder),
        BuilderMode::Proxy => Arc::new(ProxyBuilder::new(cache)),
    }
}

/// Source URL without query or fragment. Relative references are cut at the
/// first `?` or `#`.
fn base_url(source_url: &str) -> String {
    let base = match Url::parse(source_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => source_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    base.trim_end_matches('/').to_string()
}

/// Flatten the populated fields of a request into `(name, value)` pairs.
/// Nested groups become `group.field`; order follows declaration order.
pub fn query_params(transformations: &ImageTransformations) -> Result<Vec<(String, String)>> {
    let Value::Object(root) = serde_json::to_value(transformations)? else {
        return Err(Error::invalid_transformation("request did not serialize to an object"));
    };
    let mut params = Vec::new();
    flatten_into(&mut params, None, &root)?;
    Ok(params)
}

fn flatten_into(
    params: &mut Vec<(String, String)>,
    prefix: Option<&str>,
    object: &Map<String, Value>,
) -> Result<()> {
    for (field, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.clone(),
        };
        match value {
            Value::Object(group) => flatten_into(params, Some(&name), group)?,
            Value::String(s) => params.push((name, s.clone())),
            Value::Number(n) => params.push((name, n.to_string())),
            Value::Bool(b) => params.push((name, b.to_string())),
            Value::Null => {
                return Err(Error::invalid_transformation(format!(
                    "{name} has no representable value"
                )));
            }
            Value::Array(_) => {
                return Err(Error::invalid_transformation(format!(
                    "{name} is a list, which has no query form"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColorAdjustments, ImageFormat, PortraitEnhancements};

    #[test]
    fn base_drops_query_and_fragment() {
        assert_eq!(base_url("https://a.test/x.png?token=1&b=2"), "https://a.test/x.png");
        assert_eq!(base_url("https://a.test/x.png#top"), "https://a.test/x.png");
        assert_eq!(base_url("https://a.test/x.png?t=1#top"), "https://a.test/x.png");
        assert_eq!(base_url("https://a.test/x.png"), "https://a.test/x.png");
        assert_eq!(base_url("https://a.test"), "https://a.test");
    }

    #[test]
    fn relative_base_is_cut_at_query_or_fragment() {
        assert_eq!(base_url("img.png"), "img.png");
        assert_eq!(base_url("img.png#frag"), "img.png");
        assert_eq!(base_url("/media/img.png?v=2"), "/media/img.png");
    }

    #[test]
    fn flattens_groups_with_dotted_names() {
        let req = ImageTransformations {
            width: Some(640),
            format: Some(ImageFormat::Webp),
            color: Some(ColorAdjustments {
                exposure: Some(0.5),
                ..Default::default()
            }),
            portrait: Some(PortraitEnhancements {
                skin_smoothing: Some(20.0),
                catch_light: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let params = query_params(&req).unwrap();
        let expected = vec![
            ("width".to_string(), "640".to_string()),
            ("format".to_string(), "webp".to_string()),
            ("color.exposure".to_string(), "0.5".to_string()),
            ("portrait.skinSmoothing".to_string(), "20.0".to_string()),
            ("portrait.catchLight".to_string(), "true".to_string()),
        ];
        assert_eq!(params, expected);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let req = ImageTransformations {
            color: Some(ColorAdjustments {
                contrast: Some(f64::INFINITY),
                ..Default::default()
            }),
            ..Default::default()
        };
        let err = query_params(&req).unwrap_err();
        assert!(matches!(err, Error::InvalidTransformation(_)));
    }
}
