use crate::{ErrorKind, Result};
use std::cmp::Ordering;

/// Closed interval `[low, high]` of an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    pub low: f64,  // inclusive
    pub high: f64, // inclusive
}
impl Limits {
    /// Makes a new `Limits` instance.
    ///
    /// # Errors
    ///
    /// If `low` or `high` is not finite, or `low >= high`,
    /// this function returns an `ErrorKind::InvalidConfig` error.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        track_assert!(low.is_finite(), ErrorKind::InvalidConfig; low, high);
        track_assert!(high.is_finite(), ErrorKind::InvalidConfig; low, high);
        track_assert_eq!(
            low.partial_cmp(&high),
            Some(Ordering::Less),
            ErrorKind::InvalidConfig; low, high
        );
        Ok(Self { low, high })
    }

    pub fn contains(&self, x: f64) -> bool {
        self.low <= x && x <= self.high
    }

    pub fn is_positive(&self) -> bool {
        self.low > 0.0
    }
}
