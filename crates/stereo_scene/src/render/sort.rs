//! Draw order of the per-eye render list

use std::cmp::Ordering;

use crate::scene::RenderData;

/// Ascending rendering order only
pub fn by_rendering_order(a: &RenderData, b: &RenderData) -> Ordering {
    a.rendering_order().cmp(&b.rendering_order())
}

/// Ascending rendering order, then farthest first inside a bucket
///
/// Camera distances are only meaningful when frustum culling ran this frame,
/// which is the only case this comparator is used in.
pub fn by_rendering_order_then_distance(a: &RenderData, b: &RenderData) -> Ordering {
    by_rendering_order(a, b).then_with(|| {
        b.camera_distance_squared()
            .total_cmp(&a.camera_distance_squared())
    })
}

/// Sort `list` in place for drawing; the sort is stable
pub fn sort_render_list(list: &mut [&RenderData], frustum_culling: bool) {
    if frustum_culling {
        list.sort_by(|a, b| by_rendering_order_then_distance(a, b));
    } else {
        list.sort_by(|a, b| by_rendering_order(a, b));
    }
}
