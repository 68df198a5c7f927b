//! Pure polygon helpers used to turn window rectangles into the arena boundary.

use arena_shared::protocol::{Line, Polygon, Window};
use arena_shared::vec2::{vec2, Vector2D};
use std::cmp::Ordering;

/// Corners of a window: top-left, top-right, bottom-right, bottom-left.
pub fn rectangle_to_polygon(window: &Window) -> Polygon {
    let right = window.x + window.width;
    let bottom = window.y + window.height;
    Polygon {
        points: vec![
            vec2(window.x, window.y),
            vec2(right, window.y),
            vec2(right, bottom),
            vec2(window.x, bottom),
        ],
        lines: Vec::new(),
    }
}

/// Concatenate point sequences. No deduplication, lines are dropped.
pub fn merge_polygons(mut a: Polygon, b: Polygon) -> Polygon {
    a.points.extend(b.points);
    a.lines.clear();
    a
}

/// True iff a -> b -> c turns clockwise. Collinear is not a turn.
pub fn is_clockwise_turn(a: Vector2D, b: Vector2D, c: Vector2D) -> bool {
    (b.y - a.y) * (c.x - b.x) > (b.x - a.x) * (c.y - b.y)
}

/// Monotone-chain convex hull. Fewer than 3 points are returned unchanged.
pub fn convex_hull(points: &[Vector2D]) -> Vec<Vector2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });

    let mut lower = monotone_chain(sorted.iter().copied());
    let mut upper = monotone_chain(sorted.iter().rev().copied());

    // The last point of each chain is the first point of the other one.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn monotone_chain(points: impl Iterator<Item = Vector2D>) -> Vec<Vector2D> {
    let mut chain: Vec<Vector2D> = Vec::new();
    for p in points {
        while chain.len() >= 2
            && !is_clockwise_turn(chain[chain.len() - 2], chain[chain.len() - 1], p)
        {
            chain.pop();
        }
        chain.push(p);
    }
    chain
}

/// Replace every hull edge by an axis-aligned L of two segments.
///
/// The dominant span of the edge is walked first: a mostly-horizontal edge
/// goes horizontal then vertical, anything else vertical then horizontal.
/// Zero-length segments (edges that are already axis-aligned) are not
/// emitted, so a plain rectangle yields exactly four lines.
pub fn hull_to_orthogonal_boundary(hull: &[Vector2D]) -> Vec<Line> {
    let mut lines = Vec::with_capacity(hull.len() * 2);
    for (i, &current) in hull.iter().enumerate() {
        let next = hull[(i + 1) % hull.len()];

        let vertical = (next.y - current.y).abs();
        let horizontal = (next.x - current.x).abs();

        let corner = if vertical < horizontal {
            vec2(next.x, current.y)
        } else {
            vec2(current.x, next.y)
        };

        for line in [Line::new(current, corner), Line::new(corner, next)] {
            if !line.is_degenerate() {
                lines.push(line);
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn window(x: f64, y: f64, width: f64, height: f64) -> Window {
        Window {
            id: 1,
            width,
            height,
            x,
            y,
        }
    }

    fn cross(o: Vector2D, a: Vector2D, b: Vector2D) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    /// Every point is on or to the inner side of every hull edge.
    fn encloses(hull: &[Vector2D], p: Vector2D) -> bool {
        (0..hull.len()).all(|i| {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            cross(a, b, p) <= 1e-9
        })
    }

    fn random_windows(rng: &mut ChaCha8Rng, n: usize) -> Vec<Window> {
        (0..n)
            .map(|_| {
                window(
                    rng.gen_range(-2000..2000) as f64,
                    rng.gen_range(-2000..2000) as f64,
                    rng.gen_range(1..1500) as f64,
                    rng.gen_range(1..1500) as f64,
                )
            })
            .collect()
    }

    fn corners(windows: &[Window]) -> Vec<Vector2D> {
        windows
            .iter()
            .map(rectangle_to_polygon)
            .fold(Polygon::default(), merge_polygons)
            .points
    }

    #[test]
    fn rectangle_corners_in_fixed_winding() {
        let poly = rectangle_to_polygon(&window(10.0, 20.0, 100.0, 50.0));
        assert_eq!(
            poly.points,
            vec![
                vec2(10.0, 20.0),
                vec2(110.0, 20.0),
                vec2(110.0, 70.0),
                vec2(10.0, 70.0),
            ]
        );
        assert!(poly.lines.is_empty());
    }

    #[test]
    fn merge_concatenates_without_dedup() {
        let a = rectangle_to_polygon(&window(0.0, 0.0, 10.0, 10.0));
        let merged = merge_polygons(a.clone(), a);
        assert_eq!(merged.points.len(), 8);
        assert_eq!(merged.points[0], merged.points[4]);
    }

    #[test]
    fn clockwise_turn_predicate() {
        // Down the left edge, then right along the bottom (y grows downwards)
        assert!(is_clockwise_turn(
            vec2(0.0, 0.0),
            vec2(0.0, 100.0),
            vec2(100.0, 100.0)
        ));
        assert!(!is_clockwise_turn(
            vec2(0.0, 0.0),
            vec2(0.0, 100.0),
            vec2(-100.0, 100.0)
        ));
        // Collinear triples are not a turn
        assert!(!is_clockwise_turn(
            vec2(0.0, 0.0),
            vec2(1.0, 1.0),
            vec2(2.0, 2.0)
        ));
    }

    #[test]
    fn hull_of_single_rectangle_is_its_corners() {
        let hull = convex_hull(&corners(&[window(0.0, 0.0, 100.0, 100.0)]));
        assert_eq!(
            hull,
            vec![
                vec2(0.0, 0.0),
                vec2(0.0, 100.0),
                vec2(100.0, 100.0),
                vec2(100.0, 0.0),
            ]
        );
    }

    #[test]
    fn hull_drops_interior_and_collinear_points() {
        let hull = convex_hull(&[
            vec2(0.0, 0.0),
            vec2(5.0, 0.0),
            vec2(10.0, 0.0),
            vec2(5.0, 5.0),
            vec2(10.0, 10.0),
            vec2(0.0, 10.0),
        ]);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&vec2(5.0, 0.0)));
        assert!(!hull.contains(&vec2(5.0, 5.0)));
    }

    #[test]
    fn hull_of_few_points_is_input() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[vec2(1.0, 2.0)]), vec![vec2(1.0, 2.0)]);
        let two = [vec2(1.0, 2.0), vec2(3.0, 4.0)];
        assert_eq!(convex_hull(&two), two.to_vec());
    }

    #[test]
    fn hull_of_repeated_point_does_not_panic() {
        let hull = convex_hull(&[vec2(3.0, 3.0); 5]);
        assert!(hull.iter().all(|p| *p == vec2(3.0, 3.0)));
        assert!(hull_to_orthogonal_boundary(&hull).is_empty());
    }

    #[test]
    fn hull_of_zero_area_window_is_a_segment() {
        let hull = convex_hull(&corners(&[window(0.0, 0.0, 0.0, 100.0)]));
        assert_eq!(hull, vec![vec2(0.0, 0.0), vec2(0.0, 100.0)]);
    }

    #[test]
    fn hull_is_strictly_convex_and_encloses_all_corners() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for round in 0..200 {
            let windows = random_windows(&mut rng, 1 + round % 6);
            let points = corners(&windows);
            let hull = convex_hull(&points);

            assert!(hull.len() >= 3, "round {}: hull too small", round);
            for i in 0..hull.len() {
                let a = hull[i];
                let b = hull[(i + 1) % hull.len()];
                let c = hull[(i + 2) % hull.len()];
                assert!(
                    cross(a, b, c) < 0.0,
                    "round {}: {:?} {:?} {:?} not a strict turn",
                    round,
                    a,
                    b,
                    c
                );
            }
            for p in &points {
                assert!(encloses(&hull, *p), "round {}: {:?} outside hull", round, p);
            }
        }
    }

    #[test]
    fn rectangle_boundary_is_four_lines() {
        let hull = convex_hull(&corners(&[window(0.0, 0.0, 100.0, 100.0)]));
        let lines = hull_to_orthogonal_boundary(&hull);
        assert_eq!(
            lines,
            vec![
                Line::new(vec2(0.0, 0.0), vec2(0.0, 100.0)),
                Line::new(vec2(0.0, 100.0), vec2(100.0, 100.0)),
                Line::new(vec2(100.0, 100.0), vec2(100.0, 0.0)),
                Line::new(vec2(100.0, 0.0), vec2(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn diagonal_edge_prefers_dominant_span() {
        // Mostly horizontal: corner at (next.x, current.y)
        let lines = hull_to_orthogonal_boundary(&[vec2(0.0, 0.0), vec2(100.0, 10.0)]);
        assert_eq!(lines[0], Line::new(vec2(0.0, 0.0), vec2(100.0, 0.0)));
        assert_eq!(lines[1], Line::new(vec2(100.0, 0.0), vec2(100.0, 10.0)));

        // Mostly vertical: corner at (current.x, next.y)
        let lines = hull_to_orthogonal_boundary(&[vec2(0.0, 0.0), vec2(10.0, 100.0)]);
        assert_eq!(lines[0], Line::new(vec2(0.0, 0.0), vec2(0.0, 100.0)));
        assert_eq!(lines[1], Line::new(vec2(0.0, 100.0), vec2(10.0, 100.0)));
    }

    #[test]
    fn equal_spans_go_vertical_first() {
        let lines = hull_to_orthogonal_boundary(&[vec2(0.0, 0.0), vec2(50.0, 50.0)]);
        assert_eq!(lines[0], Line::new(vec2(0.0, 0.0), vec2(0.0, 50.0)));
    }

    #[test]
    fn boundary_lines_are_axis_aligned_and_chained() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for round in 0..200 {
            let windows = random_windows(&mut rng, 1 + round % 5);
            let lines = hull_to_orthogonal_boundary(&convex_hull(&corners(&windows)));

            assert!(!lines.is_empty());
            for (k, line) in lines.iter().enumerate() {
                assert!(
                    line.from.x == line.to.x || line.from.y == line.to.y,
                    "round {}: line {} not axis-aligned: {:?}",
                    round,
                    k,
                    line
                );
                let next = lines[(k + 1) % lines.len()];
                assert_eq!(line.to, next.from, "round {}: chain broken at {}", round, k);
            }
        }
    }
}
