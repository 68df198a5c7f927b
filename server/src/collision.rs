//! Ball-vs-boundary and ball-vs-ball overlap resolution.
//!
//! This is a visual approximation, not a rigid-body solver. Boundary hits flip
//! a single velocity axis (the boundary is axis-aligned by construction), and
//! ball hits redirect each ball along the separation line at its own speed.

use arena_shared::protocol::{Ball, Line};
use arena_shared::vec2::{angle_between, distance, dot, length, length_sq, Vector2D};

/// Push `ball` out of `line` and bounce it. Returns true on contact.
pub fn collide_ball_line(ball: &mut Ball, line: &Line) -> bool {
    let segment = line.to - line.from;
    let segment_len_sq = length_sq(segment);
    if segment_len_sq == 0.0 {
        return false;
    }

    // Closest point on the finite segment
    let t = (dot(segment, ball.position - line.from) / segment_len_sq).clamp(0.0, 1.0);
    let closest = line.from + segment * t;

    let dist = distance(closest, ball.position);
    if dist >= ball.radius {
        return false;
    }

    let overlap = ball.radius - dist;
    let toward = angle_between(ball.position, closest);
    ball.position -= Vector2D::from_angle(toward) * overlap;

    let degrees = angle_between(ball.position, closest)
        .to_degrees()
        .abs()
        .round();
    if degrees == 90.0 || degrees == 270.0 {
        ball.velocity.y = -ball.velocity.y;
    } else {
        ball.velocity.x = -ball.velocity.x;
    }
    true
}

/// Separate two overlapping balls and swap their headings along the
/// center line. Each keeps its own speed. Returns true on contact.
pub fn collide_balls(a: &mut Ball, b: &mut Ball) -> bool {
    let dist = distance(a.position, b.position);
    let overlap = a.radius + b.radius - dist;
    if overlap <= 0.0 {
        return false;
    }

    // Direction from b to a
    let dir = Vector2D::from_angle(angle_between(b.position, a.position));
    let speed_a = length(a.velocity);
    let speed_b = length(b.velocity);

    a.position += dir * (overlap / 2.0);
    b.position -= dir * (overlap / 2.0);

    a.velocity = dir * speed_a;
    b.velocity = -dir * speed_b;
    true
}
