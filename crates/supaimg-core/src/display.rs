//! Headless model of the image display wrapper.
//!
//! The view starts in a loading state, waits for visibility when lazy, then
//! renders an image element whose source comes from the configured
//! [`UrlBuilder`]. A failed load swaps in the fallback image and clears the
//! spinner; the view never stays stuck loading.

use std::sync::Arc;

use serde::Serialize;

use crate::models::{ImageTransformations, ResponsiveBreakpoint};
use crate::srcset::{self, DEFAULT_SIZES};
use crate::transform::UrlBuilder;

pub const DEFAULT_ALT: &str = "Transformed image";
/// Distance before the viewport at which a lazy image becomes eligible to load.
pub const ROOT_MARGIN_PX: u32 = 50;

pub type WatchId = u64;

/// Source of visibility notifications (an intersection observer).
pub trait VisibilityObserver: Send + Sync {
    fn observe(&self, root_margin_px: u32) -> WatchId;
    fn disconnect(&self, id: WatchId);
}

/// A held subscription on a [`VisibilityObserver`].
///
/// Released exactly once, by whichever comes first: the first intersection
/// or view teardown.
pub struct VisibilityWatch {
    observer: Arc<dyn VisibilityObserver>,
    id: WatchId,
    released: bool,
}

impl VisibilityWatch {
    pub fn acquire(observer: Arc<dyn VisibilityObserver>, root_margin_px: u32) -> Self {
        let id = observer.observe(root_margin_px);
        Self {
            observer,
            id,
            released: false,
        }
    }

    pub fn id(&self) -> WatchId {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Disconnect from the observer. Returns false if already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.observer.disconnect(self.id);
        self.released = true;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageViewProps {
    pub image_url: String,
    pub transformations: Option<ImageTransformations>,
    pub responsive: Option<Vec<ResponsiveBreakpoint>>,
    pub fallback_image: Option<String>,
    pub alt: String,
    pub blur_hash: Option<String>,
    pub lazy: bool,
    pub preload: bool,
    pub class_name: String,
}

impl ImageViewProps {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            transformations: None,
            responsive: None,
            fallback_image: None,
            alt: DEFAULT_ALT.to_string(),
            blur_hash: None,
            lazy: true,
            preload: false,
            class_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImgElement {
    pub src: String,
    pub srcset: Option<String>,
    pub sizes: Option<String>,
    pub alt: String,
    pub class_name: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Render {
    /// No source image at all.
    EmptyPlaceholder,
    Frame {
        spinner: bool,
        image: Option<ImgElement>,
    },
}

pub struct ImageView {
    props: ImageViewProps,
    builder: Arc<dyn UrlBuilder>,
    in_view: bool,
    loading: bool,
    error: bool,
    watch: Option<VisibilityWatch>,
}

impl ImageView {
    pub fn new(props: ImageViewProps, builder: Arc<dyn UrlBuilder>) -> Self {
        let in_view = !props.lazy || props.preload;
        Self {
            props,
            builder,
            in_view,
            loading: true,
            error: false,
            watch: None,
        }
    }

    pub fn is_in_view(&self) -> bool {
        self.in_view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_error(&self) -> bool {
        self.error
    }

    pub fn is_watching(&self) -> bool {
        self.watch.as_ref().is_some_and(|w| !w.is_released())
    }

    /// Start waiting for visibility. Without an observer the view loads eagerly.
    pub fn mount(&mut self, observer: Option<Arc<dyn VisibilityObserver>>) {
        if self.in_view {
            return;
        }
        match observer {
            Some(observer) => {
                let watch = VisibilityWatch::acquire(observer, ROOT_MARGIN_PX);
                tracing::debug!(
                    watch = watch.id(),
                    image_url = %self.props.image_url,
                    "watching visibility"
                );
                self.watch = Some(watch);
            }
            None => {
                tracing::debug!(
                    image_url = %self.props.image_url,
                    "no visibility observer, loading eagerly"
                );
                self.in_view = true;
            }
        }
    }

    /// Only a held, unreleased watch can bring the view into view; late
    /// notifications after the first trigger or teardown are ignored.
    pub fn on_intersection(&mut self, is_intersecting: bool) {
        if !is_intersecting || self.in_view || !self.is_watching() {
            return;
        }
        self.in_view = true;
        if let Some(watch) = self.watch.as_mut() {
            watch.release();
        }
        tracing::debug!(image_url = %self.props.image_url, "image entered viewport");
    }

    pub fn on_load(&mut self) {
        self.loading = false;
    }

    pub fn on_error(&mut self) {
        tracing::debug!(
            image_url = %self.props.image_url,
            fallback = self.props.fallback_image.as_deref(),
            "image failed to load"
        );
        self.error = true;
        self.loading = false;
    }

    pub fn unmount(&mut self) {
        if let Some(mut watch) = self.watch.take() {
            watch.release();
        }
    }

    pub fn render(&self) -> Render {
        if self.props.image_url.is_empty() {
            return Render::EmptyPlaceholder;
        }
        let image = self.in_view.then(|| self.image_element());
        Render::Frame {
            spinner: self.loading,
            image,
        }
    }

    fn image_element(&self) -> ImgElement {
        let props = &self.props;
        let src = if self.error {
            props
                .fallback_image
                .as_deref()
                .filter(|f| !f.is_empty())
                .unwrap_or(&props.image_url)
                .to_string()
        } else {
            self.builder
                .build(&props.image_url, props.transformations.as_ref())
                .to_string()
        };
        let (srcset, sizes) = match &props.responsive {
            Some(breakpoints) => (
                Some(srcset::generate(self.builder.as_ref(), &props.image_url, breakpoints)),
                Some(DEFAULT_SIZES.to_string()),
            ),
            None => (None, None),
        };
        ImgElement {
            src,
            srcset,
            sizes,
            alt: props.alt.clone(),
            class_name: props.class_name.clone(),
            visible: !self.loading,
        }
    }
}
