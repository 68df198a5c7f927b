use crate::geometry::{
    convex_hull, hull_to_orthogonal_boundary, merge_polygons, rectangle_to_polygon,
};
use arena_shared::protocol::{Polygon, Window};

/// Rebuild the arena boundary from scratch for the given windows.
///
/// Output depends only on the set of windows: the hull sorts its input, so
/// iteration order does not leak into the result.
pub fn recompute_boundary<'a>(windows: impl IntoIterator<Item = &'a Window>) -> Polygon {
    let merged = windows
        .into_iter()
        .map(rectangle_to_polygon)
        .fold(Polygon::default(), merge_polygons);

    let points = convex_hull(&merged.points);
    let lines = hull_to_orthogonal_boundary(&points);
    Polygon { points, lines }
}
