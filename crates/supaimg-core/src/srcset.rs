use crate::models::ResponsiveBreakpoint;
use crate::transform::UrlBuilder;

/// Width-tagged candidate list (`"<url> <width>w, ..."`) for `srcset`.
/// Input order is preserved and widths are not validated.
pub fn generate(
    builder: &dyn UrlBuilder,
    source_url: &str,
    breakpoints: &[ResponsiveBreakpoint],
) -> String {
    breakpoints
        .iter()
        .map(|bp| {
            let url = builder.build(source_url, Some(&bp.transformations));
            format!("{url} {}w", bp.width)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `sizes` attribute paired with a generated descriptor.
pub const DEFAULT_SIZES: &str = "100vw";
