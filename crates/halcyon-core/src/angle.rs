use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::Vector2;

/// Wrap a value in radians into (-pi, pi].
pub fn wrap_angle(angle: f64) -> f64 {
    let mut angle = angle % (2.0 * PI);
    if angle <= -PI {
        angle += 2.0 * PI;
    } else if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

/// An angle in radians, always in (-pi, pi]. Arithmetic on this type wraps, so
/// the shortest-path difference between two headings is simply `a - b`.
#[derive(Debug, Clone, Copy, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn from_radians(radians: f64) -> Self {
        Angle(wrap_angle(radians))
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// The counter-clockwise angle of the vector from `a` to `b`.
    pub fn between_points(a: Vector2, b: Vector2) -> Self {
        Self::from_radians((b.y - a.y).atan2(b.x - a.x))
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }

    /// Rotate a vector by this angle.
    pub fn rotate_vector(&self, v: &Vector2) -> Vector2 {
        nalgebra::Rotation2::new(self.0) * v
    }

    /// The inverse rotation (* -1).
    pub fn inv(&self) -> Self {
        Angle(-self.0)
    }

    pub fn abs(&self) -> f64 {
        self.0.abs()
    }
}

impl std::ops::Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Angle::from_radians(self.0 + other.0)
    }
}

impl std::ops::Sub for Angle {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Angle::from_radians(self.0 - other.0)
    }
}

impl std::ops::Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Angle(-self.0)
    }
}

impl std::ops::Mul<Vector2> for Angle {
    type Output = Vector2;

    fn mul(self, v: Vector2) -> Vector2 {
        self.rotate_vector(&v)
    }
}

impl Default for Angle {
    fn default() -> Self {
        Angle(0.0)
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        const TOLERANCE: f64 = 1e-5;
        let diff = (self.0 - other.0).abs();
        !(TOLERANCE..=(2.0 * PI - TOLERANCE)).contains(&diff)
    }
}

impl std::fmt::Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} rad", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert_eq!(wrap_angle(5.0 * PI), PI);
    }

    #[test]
    fn test_shortest_path_difference() {
        let a = Angle::from_degrees(180.0);
        let b = Angle::from_degrees(-179.0);
        assert_relative_eq!((a - b).degrees(), -1.0, epsilon = 1e-5);

        let a = Angle::from_degrees(-180.0);
        let b = Angle::from_degrees(180.0);
        assert_relative_eq!((a - b).degrees(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_between_points() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(1.0, 1.0);
        assert_eq!(Angle::between_points(a, b).degrees(), 45.0);
        assert_eq!(Angle::between_points(b, a).degrees(), -135.0);
    }

    #[test]
    fn test_rotate_vector() {
        let r = Angle::from_degrees(90.0) * Vector2::new(1.0, 0.0);
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-10);
    }
}
