//! Logarithmic axis mapping shared by the analysis loop and the label
//! overlay, so marks land exactly on the rows/columns they describe.

/// Exponential mapping between pixel positions and values in `[min, max]`.
#[derive(Clone, Copy, Debug)]
pub struct LogScale {
    min: f32,
    max: f32,
}

impl LogScale {
    pub fn new(min: f32, max: f32) -> Self {
        assert!(min > 0.0 && max > min, "LogScale bounds must be 0 < min < max");
        Self { min, max }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Value at pixel `pos` of an axis `extent` pixels long.
    /// `pos == 0` maps to `min`; `pos == extent` maps to `max`.
    pub fn value_at(&self, pos: usize, extent: usize) -> f32 {
        ((pos as f32) * (self.max / self.min).ln() / extent as f32).exp() * self.min
    }

    /// Pixel position of `value` on an axis `extent` pixels long (inverse
    /// of `value_at`, truncated to an integer pixel).
    pub fn position_of(&self, value: f32, extent: usize) -> usize {
        (extent as f32 * (value / self.min).ln() / (self.max / self.min).ln()) as usize
    }
}
