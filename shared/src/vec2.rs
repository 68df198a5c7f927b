//! 2D vector in the shared window plane.
//! Screen convention: x grows to the right, y grows downwards.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../public/generated/")]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub const ZERO: Vector2D = Vector2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` (0 = +x, PI/2 = +y).
    pub fn from_angle(radians: f64) -> Self {
        Self::new(radians.cos(), radians.sin())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Shorthand constructor
pub fn vec2(x: f64, y: f64) -> Vector2D {
    Vector2D::new(x, y)
}

/// Dot product
pub fn dot(a: Vector2D, b: Vector2D) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Squared length, avoids the sqrt when only comparing
pub fn length_sq(v: Vector2D) -> f64 {
    v.x * v.x + v.y * v.y
}

/// Vector length
pub fn length(v: Vector2D) -> f64 {
    length_sq(v).sqrt()
}

/// Euclidean distance between two points
pub fn distance(a: Vector2D, b: Vector2D) -> f64 {
    length(a - b)
}

/// Angle of the vector from `from` to `to` (atan2 of the deltas).
pub fn angle_between(from: Vector2D, to: Vector2D) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

impl Add for Vector2D {
    type Output = Vector2D;

    fn add(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector2D {
    type Output = Vector2D;

    fn sub(self, rhs: Vector2D) -> Vector2D {
        Vector2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Vector2D {
    fn add_assign(&mut self, rhs: Vector2D) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2D {
    fn sub_assign(&mut self, rhs: Vector2D) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vector2D {
    type Output = Vector2D;

    fn mul(self, s: f64) -> Vector2D {
        Vector2D::new(self.x * s, self.y * s)
    }
}

impl Neg for Vector2D {
    type Output = Vector2D;

    fn neg(self) -> Vector2D {
        Vector2D::new(-self.x, -self.y)
    }
}
