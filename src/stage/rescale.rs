//! Fit-to-container math.

use crate::types::ScaleTransform;

/// Compute the uniform scale and centering offsets that fit content of
/// `natural` size into `container`.
///
/// Returns `None` when either box is degenerate, leaving any previous
/// transform in place. The scale never exceeds 1.0 unless `allow_upscale`
/// is set; content smaller than its container is centered at natural size.
pub fn fit_to_container(
    container: (f32, f32),
    natural: (f32, f32),
    allow_upscale: bool,
) -> Option<ScaleTransform> {
    let (cw, ch) = container;
    let (nw, nh) = natural;
    if cw <= 0.0 || ch <= 0.0 || nw <= 0.0 || nh <= 0.0 {
        return None;
    }

    let mut scale = (cw / nw).min(ch / nh);
    if !allow_upscale {
        scale = scale.min(1.0);
    }

    Some(ScaleTransform {
        scale,
        offset_x: (cw - nw * scale) / 2.0,
        offset_y: (ch - nh * scale) / 2.0,
    })
}
