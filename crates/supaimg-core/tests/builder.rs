use std::sync::{Arc, Barrier};
use std::thread;

use supaimg_core::cache::{LruUrlCache, UrlCache, cache_key};
use supaimg_core::models::*;
use supaimg_core::transform::{
    BuilderMode, PassthroughBuilder, ProxyBuilder, UrlBuilder, builder_for,
};

const SOURCE: &str = "https://example.supabase.co/storage/v1/object/public/bucket/cat.jpg";

fn sample_request() -> ImageTransformations {
    ImageTransformations {
        width: Some(800),
        quality: Some(80),
        format: Some(ImageFormat::Webp),
        color: Some(ColorAdjustments {
            exposure: Some(0.25),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[test]
fn passthrough_returns_source_for_any_request() {
    let builder = PassthroughBuilder;
    assert_eq!(&*builder.build(SOURCE, None), SOURCE);
    assert_eq!(&*builder.build(SOURCE, Some(&sample_request())), SOURCE);
    assert_eq!(builder.mode(), BuilderMode::Passthrough);
}

#[test]
fn proxy_ignores_absent_and_empty_requests() {
    let builder = ProxyBuilder::default();
    assert_eq!(&*builder.build(SOURCE, None), SOURCE);
    assert_eq!(&*builder.build(SOURCE, Some(&ImageTransformations::default())), SOURCE);

    let empty_groups = ImageTransformations {
        color: Some(ColorAdjustments::default()),
        metadata: Some(MetadataDirectives::default()),
        ..Default::default()
    };
    assert_eq!(&*builder.build(SOURCE, Some(&empty_groups)), SOURCE);
    assert!(builder.cache().is_empty());
}

#[test]
fn proxy_builds_transform_url_without_original_query() {
    let builder = ProxyBuilder::default();
    let url = builder.build(&format!("{SOURCE}?token=abc"), Some(&sample_request()));
    assert_eq!(
        &*url,
        "https://example.supabase.co/storage/v1/object/public/bucket/cat.jpg/transform?width=800&quality=80&format=webp&color.exposure=0.25"
    );
}

#[test]
fn proxy_encodes_string_values() {
    let builder = ProxyBuilder::default();
    let req = ImageTransformations {
        metadata: Some(MetadataDirectives {
            preserve: Some(true),
            copyright: Some("© Jo & Co".into()),
            author: None,
        }),
        ..Default::default()
    };
    let url = builder.build("img.png", Some(&req));
    assert_eq!(
        &*url,
        "img.png/transform?metadata.preserve=true&metadata.copyright=%C2%A9+Jo+%26+Co"
    );
}

#[test]
fn repeated_requests_share_the_cached_url() {
    let builder = ProxyBuilder::default();
    let first = builder.build(SOURCE, Some(&sample_request()));
    let second = builder.build(SOURCE, Some(&sample_request().clone()));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(builder.cache().len(), 1);
}

#[test]
fn distinct_requests_get_distinct_keys() {
    let r1 = sample_request();
    let mut r2 = sample_request();
    r2.color = Some(ColorAdjustments {
        exposure: Some(0.3),
        ..Default::default()
    });
    assert_ne!(cache_key(SOURCE, &r1).unwrap(), cache_key(SOURCE, &r2).unwrap());

    let builder = ProxyBuilder::default();
    let a = builder.build(SOURCE, Some(&r1));
    let b = builder.build(SOURCE, Some(&r2));
    assert_ne!(a, b);
    assert_eq!(builder.cache().len(), 2);
}

#[test]
fn unrepresentable_values_fall_back_to_source() {
    let builder = ProxyBuilder::default();
    let req = ImageTransformations {
        width: Some(320),
        color: Some(ColorAdjustments {
            exposure: Some(f64::NAN),
            ..Default::default()
        }),
        ..Default::default()
    };
    assert_eq!(&*builder.build(SOURCE, Some(&req)), SOURCE);
    assert!(builder.cache().is_empty());
}

#[test]
fn bounded_cache_evicts_and_rebuilds() {
    let cache = Arc::new(LruUrlCache::new(std::num::NonZeroUsize::new(1).unwrap()));
    let builder = ProxyBuilder::new(cache.clone());
    let small = ImageTransformations {
        width: Some(100),
        ..Default::default()
    };
    let large = ImageTransformations {
        width: Some(1000),
        ..Default::default()
    };

    let first = builder.build(SOURCE, Some(&small));
    builder.build(SOURCE, Some(&large));
    assert_eq!(cache.len(), 1);

    let rebuilt = builder.build(SOURCE, Some(&small));
    assert_eq!(first, rebuilt);
    assert!(!Arc::ptr_eq(&first, &rebuilt));
}

#[test]
fn builder_for_selects_variant() {
    let cache: Arc<dyn UrlCache> = Arc::new(LruUrlCache::default());
    assert_eq!(
        builder_for(BuilderMode::Passthrough, cache.clone()).mode(),
        BuilderMode::Passthrough
    );
    assert_eq!(builder_for(BuilderMode::Proxy, cache).mode(), BuilderMode::Proxy);
}

#[test]
fn fragment_is_dropped_from_base() {
    let builder = ProxyBuilder::default();
    let req = ImageTransformations {
        width: Some(320),
        ..Default::default()
    };
    assert_eq!(
        &*builder.build("https://cdn.test/a.png#frag", Some(&req)),
        "https://cdn.test/a.png/transform?width=320"
    );
    assert_eq!(
        &*builder.build("img.png?v=1#frag", Some(&req)),
        "img.png/transform?width=320"
    );
}

#[test]
fn concurrent_first_calls_share_one_cached_url() {
    let builder = Arc::new(ProxyBuilder::default());
    for width in 1..=200 {
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let builder = Arc::clone(&builder);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let req = ImageTransformations {
                        width: Some(width),
                        ..Default::default()
                    };
                    barrier.wait();
                    builder.build("img.png", Some(&req))
                })
            })
            .collect();
        let urls: Vec<Arc<str>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let req = ImageTransformations {
            width: Some(width),
            ..Default::default()
        };
        let cached = builder.build("img.png", Some(&req));
        for url in &urls {
            assert!(Arc::ptr_eq(url, &cached), "width {width} returned a stale url");
        }
    }
}
