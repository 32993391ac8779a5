//! Transformation request schema shared by the URL builders, the responsive
//! descriptor generator and the display model.
//!
//! Every field is optional: `None` means "no adjustment requested", never zero.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResizeMode {
    Cover,
    Contain,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Webp,
    Jpeg,
    Jpg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LightLeak {
    None,
    Warm,
    Cool,
    Vintage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilmType {
    None,
    Kodak,
    Fuji,
    Ilford,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PortraitLighting {
    Natural,
    Studio,
    Butterfly,
    Rembrandt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StyleName {
    None,
    Cinematic,
    Vintage,
    Noir,
    Futuristic,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorAdjustments {
    pub exposure: Option<f64>,
    pub contrast: Option<f64>,
    pub highlights: Option<f64>,
    pub shadows: Option<f64>,
    pub temperature: Option<f64>,
    pub tint: Option<f64>,
    pub vibrance: Option<f64>,
    pub saturation: Option<f64>,
    /// Dynamic-range boost.
    pub hdr: Option<f64>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailAdjustments {
    pub sharpness: Option<f64>,
    /// Noise reduction strength.
    pub noise: Option<f64>,
    pub clarity: Option<f64>,
    pub texture: Option<f64>,
    pub lens_correction: Option<bool>,
    /// Chromatic-aberration correction.
    pub chromatic: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeEffects {
    pub grain: Option<f64>,
    pub grain_size: Option<f64>,
    pub vignette: Option<f64>,
    pub light_leak: Option<LightLeak>,
    pub film_type: Option<FilmType>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortraitEnhancements {
    pub skin_tone: Option<f64>,
    pub skin_smoothing: Option<f64>,
    pub eye_brightness: Option<f64>,
    pub catch_light: Option<bool>,
    pub facial_structure: Option<f64>,
    pub portrait_lighting: Option<PortraitLighting>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleTransfer {
    pub style: Option<StyleName>,
    pub intensity: Option<f64>,
    pub preserve_color: Option<bool>,
    pub preserve_detail: Option<bool>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDirectives {
    /// Keep source metadata on the transformed output.
    pub preserve: Option<bool>,
    pub copyright: Option<String>,
    pub author: Option<String>,
}

/// A structured transformation request. Serialization order follows field
/// declaration order, which makes the JSON form usable as a cache key.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTransformations {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub resize: Option<ResizeMode>,
    pub quality: Option<u8>,
    pub format: Option<ImageFormat>,
    pub color: Option<ColorAdjustments>,
    pub detail: Option<DetailAdjustments>,
    pub effects: Option<CreativeEffects>,
    pub portrait: Option<PortraitEnhancements>,
    pub style: Option<StyleTransfer>,
    pub metadata: Option<MetadataDirectives>,
}

impl ImageTransformations {
    /// True when no leaf field is populated. A group that is present but
    /// itself empty (`color: {}`) does not count as a populated field.
    pub fn is_empty(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.resize.is_none()
            && self.quality.is_none()
            && self.format.is_none()
            && self.color.as_ref().is_none_or(|c| *c == ColorAdjustments::default())
            && self.detail.as_ref().is_none_or(|d| *d == DetailAdjustments::default())
            && self.effects.as_ref().is_none_or(|e| *e == CreativeEffects::default())
            && self
                .portrait
                .as_ref()
                .is_none_or(|p| *p == PortraitEnhancements::default())
            && self.style.as_ref().is_none_or(|s| *s == StyleTransfer::default())
            && self
                .metadata
                .as_ref()
                .is_none_or(|m| *m == MetadataDirectives::default())
    }

    /// Copy of this request with the output width replaced.
    pub fn with_width(&self, width: u32) -> Self {
        Self {
            width: Some(width),
            ..self.clone()
        }
    }
}

/// One candidate rendition for responsive image selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveBreakpoint {
    pub width: u32,
    #[serde(default)]
    pub transformations: ImageTransformations,
}

impl ResponsiveBreakpoint {
    pub fn new(width: u32, transformations: ImageTransformations) -> Self {
        Self {
            width,
            transformations,
        }
    }
}
