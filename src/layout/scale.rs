//! Fixed-point conversion between physical lengths and solver integers

/// Largest magnitude a scaled length may take
///
/// Model coefficients stay small, so every expression built from lengths in
/// this range is far from `i64` overflow.
pub const MAX_SCALED: i64 = 1 << 40;

/// Multiplier applied to every physical length before it reaches the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale(i64);

impl Scale {
    /// Factors below 1 are raised to 1
    pub fn new(factor: i64) -> Self {
        Self(factor.max(1))
    }

    pub fn factor(self) -> i64 {
        self.0
    }

    /// Physical length to the nearest solver integer
    ///
    /// `None` for non-finite values and for results beyond [`MAX_SCALED`].
    pub fn to_scaled(self, value: f64) -> Option<i64> {
        let scaled = (value * self.0 as f64).round();
        if scaled.is_finite() && scaled.abs() <= MAX_SCALED as f64 {
            Some(scaled as i64)
        } else {
            None
        }
    }

    /// Solver integer back to physical units
    pub fn from_scaled(self, value: i64) -> f64 {
        value as f64 / self.0 as f64
    }

    /// Smallest representable length
    pub fn resolution(self) -> f64 {
        1.0 / self.0 as f64
    }

    /// Largest physical length that still scales
    pub fn max_length(self) -> f64 {
        MAX_SCALED as f64 / self.0 as f64
    }
}
