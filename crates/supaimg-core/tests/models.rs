use supaimg_core::models::*;

#[test]
fn transformations_parse_camel_case_json() {
    let raw = r#"{
        "width": 1200,
        "resize": "cover",
        "portrait": { "skinSmoothing": 30, "portraitLighting": "rembrandt", "catchLight": true },
        "effects": { "grainSize": 1.5, "filmType": "kodak", "lightLeak": "warm" },
        "style": { "style": "noir", "preserveDetail": true }
    }"#;
    let parsed: ImageTransformations = serde_json::from_str(raw).unwrap();
    assert_eq!(parsed.width, Some(1200));
    assert_eq!(parsed.resize, Some(ResizeMode::Cover));
    let portrait = parsed.portrait.as_ref().unwrap();
    assert_eq!(portrait.skin_smoothing, Some(30.0));
    assert_eq!(portrait.portrait_lighting, Some(PortraitLighting::Rembrandt));
    assert_eq!(parsed.effects.as_ref().unwrap().film_type, Some(FilmType::Kodak));
    assert_eq!(parsed.style.as_ref().unwrap().style, Some(StyleName::Noir));
    assert!(!parsed.is_empty());
}

#[test]
fn absent_fields_are_not_serialized() {
    let req = ImageTransformations {
        detail: Some(DetailAdjustments {
            lens_correction: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    };
    let json = serde_json::to_string(&req).unwrap();
    assert_eq!(json, r#"{"detail":{"lensCorrection":false}}"#);
}

#[test]
fn zero_is_a_populated_value() {
    let req = ImageTransformations {
        color: Some(ColorAdjustments {
            saturation: Some(0.0),
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(!req.is_empty());
    assert!(ImageTransformations::default().is_empty());
}

#[test]
fn with_width_overrides_only_width() {
    let base = ImageTransformations {
        width: Some(100),
        quality: Some(70),
        ..Default::default()
    };
    let wide = base.with_width(900);
    assert_eq!(wide.width, Some(900));
    assert_eq!(wide.quality, Some(70));
}

#[test]
fn breakpoint_transformations_default_when_missing() {
    let bp: ResponsiveBreakpoint = serde_json::from_str(r#"{"width":480}"#).unwrap();
    assert_eq!(bp.width, 480);
    assert!(bp.transformations.is_empty());
}
