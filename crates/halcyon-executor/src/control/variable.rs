use std::ops::{Add, Mul, Sub};

use halcyon_core::Vector2;

/// A trait for types a PID controller can operate on: scalars for
/// orientation, 2D vectors for translation.
pub trait Variable:
    Copy + Add<Self, Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    /// The zero value for this type.
    fn zero() -> Self;

    /// The magnitude of this variable. Always non-negative.
    fn magnitude(self) -> f64;

    /// Scale the variable down so its magnitude does not exceed `max`.
    fn cap_magnitude(self, max: f64) -> Self {
        let magnitude = self.magnitude();
        if magnitude > max {
            self * (max / magnitude)
        } else {
            self
        }
    }
}

impl Variable for f64 {
    fn zero() -> Self {
        0.0
    }

    fn magnitude(self) -> f64 {
        self.abs()
    }
}

impl Variable for Vector2 {
    fn zero() -> Self {
        Vector2::zeros()
    }

    fn magnitude(self) -> f64 {
        self.norm()
    }
}
