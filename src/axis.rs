//! Discretized parameter and stimulus axes.
use crate::range::Limits;
use crate::{ErrorKind, Result};
use ndarray::{Array1, ArrayView1};
use statrs::distribution::{Beta, Continuous, ContinuousCDF, Gamma, Normal};
use std::fmt;
use std::str::FromStr;

// Tolerance against floating point rounding when deciding whether `high` is reached.
const GRID_TOLERANCE: f64 = 1.0e-9;

/// How the points of an axis are spread between its limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Spacing {
    /// `low, low + step, low + 2*step, ...`
    ///
    /// The walk stops at the first point that is not below `high`. If `step` does not divide
    /// `high - low`, the last point therefore lies beyond `high` (by less than `step`).
    Linear,

    /// `low, low * step, low * step^2, ...`
    Logarithmic,
}
impl Spacing {
    fn enumerate(self, limits: Limits, step: f64) -> Vec<f64> {
        match self {
            Spacing::Linear => {
                let n = ((limits.high - limits.low) / step - GRID_TOLERANCE).ceil() as usize + 1;
                (0..n).map(|i| limits.low + step * i as f64).collect()
            }
            Spacing::Logarithmic => {
                let ratio = (limits.high / limits.low).ln() / step.ln();
                let n = (ratio + GRID_TOLERANCE).floor() as usize + 1;
                (0..n).map(|i| limits.low * step.powi(i as i32)).collect()
            }
        }
    }
}
impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Spacing::Linear => write!(f, "linear"),
            Spacing::Logarithmic => write!(f, "logarithmic"),
        }
    }
}
impl FromStr for Spacing {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Spacing::Linear),
            "logarithmic" | "log" => Ok(Spacing::Logarithmic),
            _ => track_panic!(ErrorKind::InvalidConfig, "Unknown spacing: {:?}", s),
        }
    }
}

/// Prior distribution of a parameter axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prior {
    /// Every grid point has the same weight.
    Uniform,

    /// Normal density with the given mean and standard deviation.
    ///
    /// On a logarithmically spaced axis the weight of a point `x` is
    /// `exp(normal_pdf(ln(x), ln(mean), std))`.
    Normal { mean: f64, std: f64 },

    /// Gamma density (shape/rate parameterization).
    Gamma { shape: f64, rate: f64 },

    /// Beta distribution.
    ///
    /// Each grid point is weighted by the probability mass of its cell (the interval between the
    /// midpoints to its neighbours, clipped to `[0, 1]`) rather than by the density. This keeps
    /// the weight of a lapse rate of `0` finite and positive whatever `alpha` is.
    Beta { alpha: f64, beta: f64 },
}
impl Prior {
    /// Makes a prior from the raw `(dist, mu, std)` option triple of an experiment file.
    ///
    /// `gamma` and `beta` priors are parameterized by the method of moments.
    ///
    /// # Errors
    ///
    /// If `dist` is unknown or the moments are invalid for the distribution,
    /// an `ErrorKind::InvalidConfig` error is returned.
    pub fn from_parts(dist: &str, mu: f64, std: f64) -> Result<Self> {
        let prior = match dist.to_ascii_lowercase().as_str() {
            "uniform" => Prior::Uniform,
            "normal" | "gaussian" => Prior::Normal { mean: mu, std },
            "gamma" => {
                track_assert!(mu > 0.0 && std > 0.0, ErrorKind::InvalidConfig; dist, mu, std);
                Prior::Gamma {
                    shape: (mu / std).powi(2),
                    rate: mu / (std * std),
                }
            }
            "beta" => {
                track_assert!(0.0 < mu && mu < 1.0, ErrorKind::InvalidConfig; dist, mu, std);
                let common = mu * (1.0 - mu) / (std * std) - 1.0;
                track_assert!(common > 0.0, ErrorKind::InvalidConfig; dist, mu, std);
                Prior::Beta {
                    alpha: mu * common,
                    beta: (1.0 - mu) * common,
                }
            }
            _ => track_panic!(ErrorKind::InvalidConfig, "Unknown distribution: {:?}", dist),
        };
        track!(prior.validate())?;
        Ok(prior)
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Prior::Uniform => {}
            Prior::Normal { mean, std } => {
                track_assert!(mean.is_finite(), ErrorKind::InvalidConfig; mean, std);
                track_assert!(std.is_finite() && std > 0.0, ErrorKind::InvalidConfig; mean, std);
            }
            Prior::Gamma { shape, rate } => {
                track_assert!(shape.is_finite() && shape > 0.0, ErrorKind::InvalidConfig; shape, rate);
                track_assert!(rate.is_finite() && rate > 0.0, ErrorKind::InvalidConfig; shape, rate);
            }
            Prior::Beta { alpha, beta } => {
                track_assert!(alpha.is_finite() && alpha > 0.0, ErrorKind::InvalidConfig; alpha, beta);
                track_assert!(beta.is_finite() && beta > 0.0, ErrorKind::InvalidConfig; alpha, beta);
            }
        }
        Ok(())
    }

    fn weights(&self, points: &[f64], spacing: Spacing) -> Result<Vec<f64>> {
        let weights = match *self {
            Prior::Uniform => vec![1.0; points.len()],
            Prior::Normal { mean, std } if spacing == Spacing::Logarithmic => {
                track_assert!(mean > 0.0, ErrorKind::InvalidConfig; mean);
                let d = track!(Normal::new(mean.ln(), std).map_err(crate::Error::from))?;
                points.iter().map(|x| d.pdf(x.ln()).exp()).collect()
            }
            Prior::Normal { mean, std } => {
                let d = track!(Normal::new(mean, std).map_err(crate::Error::from))?;
                points.iter().map(|&x| d.pdf(x)).collect()
            }
            Prior::Gamma { shape, rate } => {
                let d = track!(Gamma::new(shape, rate).map_err(crate::Error::from))?;
                points.iter().map(|&x| d.pdf(x)).collect()
            }
            Prior::Beta { alpha, beta } => {
                let d = track!(Beta::new(alpha, beta).map_err(crate::Error::from))?;
                cells(points)
                    .into_iter()
                    .map(|(a, b)| d.cdf(b.min(1.0).max(0.0)) - d.cdf(a.min(1.0).max(0.0)))
                    .collect()
            }
        };
        Ok(weights)
    }
}
// Intervals around each point, bounded by the midpoints to the neighbouring points.
fn cells(points: &[f64]) -> Vec<(f64, f64)> {
    if points.len() < 2 {
        return points.iter().map(|_| (0.0, 1.0)).collect();
    }
    let n = points.len();
    let mids = points
        .windows(2)
        .map(|w| (w[0] + w[1]) / 2.0)
        .collect::<Vec<_>>();
    (0..n)
        .map(|i| {
            let lower = if i == 0 {
                points[0] - (mids[0] - points[0])
            } else {
                mids[i - 1]
            };
            let upper = if i == n - 1 {
                points[i] + (points[i] - mids[i - 1])
            } else {
                mids[i]
            };
            (lower, upper)
        })
        .collect()
}

impl Default for Prior {
    fn default() -> Self {
        Prior::Uniform
    }
}

/// Discretization settings of an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisSpec {
    pub limits: Limits,
    pub step: f64,
    pub spacing: Spacing,
}
impl AxisSpec {
    /// Makes a new `AxisSpec` instance.
    ///
    /// For `Spacing::Logarithmic`, `step` is the ratio between consecutive points.
    ///
    /// # Errors
    ///
    /// If one of the following conditions is satisfied, an `ErrorKind::InvalidConfig` error is returned:
    ///
    /// - `low >= high` or a limit is not finite
    /// - `step` is not a positive finite number
    /// - logarithmic spacing with `low <= 0` or `step <= 1`
    pub fn new(low: f64, high: f64, step: f64, spacing: Spacing) -> Result<Self> {
        let limits = track!(Limits::new(low, high))?;
        track_assert!(step.is_finite() && step > 0.0, ErrorKind::InvalidConfig; step);
        if spacing == Spacing::Logarithmic {
            track_assert!(limits.is_positive(), ErrorKind::InvalidConfig; low, high, spacing);
            track_assert!(step > 1.0, ErrorKind::InvalidConfig; step, spacing);
        }
        Ok(Self {
            limits,
            step,
            spacing,
        })
    }

    /// Returns the grid points in the natural (untransformed) domain.
    pub fn points(&self) -> Vec<f64> {
        self.spacing.enumerate(self.limits, self.step)
    }
}

/// One of the three estimated parameters: its discretization and prior.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterAxis {
    pub spec: AxisSpec,
    pub prior: Prior,
}
impl ParameterAxis {
    /// Makes a linearly spaced axis with a uniform prior.
    pub fn linear(low: f64, high: f64, step: f64) -> Result<Self> {
        let spec = track!(AxisSpec::new(low, high, step, Spacing::Linear))?;
        Ok(Self::from(spec))
    }

    /// Makes a logarithmically spaced axis with a uniform prior.
    pub fn logarithmic(low: f64, high: f64, ratio: f64) -> Result<Self> {
        let spec = track!(AxisSpec::new(low, high, ratio, Spacing::Logarithmic))?;
        Ok(Self::from(spec))
    }

    /// Replaces the prior of this axis.
    pub fn with_prior(mut self, prior: Prior) -> Result<Self> {
        track!(prior.validate())?;
        if let (Prior::Normal { mean, .. }, Spacing::Logarithmic) = (prior, self.spec.spacing) {
            track_assert!(mean > 0.0, ErrorKind::InvalidConfig; mean);
        }
        self.prior = prior;
        Ok(self)
    }

    /// Evaluates the (unnormalized) prior weight of each grid point.
    pub fn prior_weights(&self) -> Result<Array1<f64>> {
        let points = self.spec.points();
        let weights = track!(self.prior.weights(&points, self.spec.spacing))?;
        track_assert!(
            weights.iter().all(|w| w.is_finite() && *w >= 0.0),
            ErrorKind::InvalidConfig,
            "Prior {:?} is not finite on {:?}",
            self.prior,
            self.spec
        );
        Ok(Array1::from(weights))
    }
}
impl From<AxisSpec> for ParameterAxis {
    fn from(spec: AxisSpec) -> Self {
        Self {
            spec,
            prior: Prior::Uniform,
        }
    }
}

/// The materialized points of an axis.
///
/// When the axis lives on a logarithmic stimulus scale the stored values are the natural
/// logarithms of the enumerated points.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    values: Array1<f64>,
    log_transformed: bool,
}
impl ParameterGrid {
    /// Builds the grid of `spec`, optionally taking the natural logarithm of every point.
    ///
    /// # Errors
    ///
    /// If `log_transform` is `true` and a point is not positive,
    /// an `ErrorKind::InvalidConfig` error is returned.
    pub fn build(spec: &AxisSpec, log_transform: bool) -> Result<Self> {
        let points = spec.points();
        track_assert!(!points.is_empty(), ErrorKind::InvalidConfig; spec);
        let values = if log_transform {
            track_assert!(spec.limits.is_positive(), ErrorKind::InvalidConfig; spec);
            points.into_iter().map(f64::ln).collect()
        } else {
            points
        };
        Ok(Self {
            values: Array1::from(values),
            log_transformed: log_transform,
        })
    }

    /// Returns the internal values of the grid.
    pub fn values(&self) -> ArrayView1<f64> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_log_transformed(&self) -> bool {
        self.log_transformed
    }

    /// Converts an internal value to the natural domain.
    pub fn to_natural(&self, value: f64) -> f64 {
        if self.log_transformed {
            value.exp()
        } else {
            value
        }
    }

    /// Converts a natural value to the internal domain.
    pub fn to_internal(&self, value: f64) -> f64 {
        if self.log_transformed {
            value.ln()
        } else {
            value
        }
    }
}
