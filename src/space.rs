//! The discretized parameter space and its joint prior.
use crate::axis::{AxisSpec, ParameterAxis, ParameterGrid};
use crate::float::MIN_NORMALIZER;
use crate::{ErrorKind, Result};
use ndarray::{Array3, ArrayD, ArrayView3, Axis};
use std::fmt;
use std::str::FromStr;

/// Scale on which stimuli are compared with thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StimulusScale {
    Linear,

    /// Stimuli and thresholds are log-transformed before evaluating the psychometric function.
    Logarithmic,
}
impl StimulusScale {
    pub fn is_logarithmic(self) -> bool {
        self == StimulusScale::Logarithmic
    }
}
impl Default for StimulusScale {
    fn default() -> Self {
        StimulusScale::Linear
    }
}
impl fmt::Display for StimulusScale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StimulusScale::Linear => write!(f, "linear"),
            StimulusScale::Logarithmic => write!(f, "logarithmic"),
        }
    }
}
impl FromStr for StimulusScale {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(StimulusScale::Linear),
            "logarithmic" | "log" => Ok(StimulusScale::Logarithmic),
            _ => track_panic!(ErrorKind::InvalidConfig, "Unknown stimulus scale: {:?}", s),
        }
    }
}

/// One of the estimated parameter axes of the joint distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamAxis {
    Threshold,
    Slope,
    Lapse,
}
impl ParamAxis {
    pub const ALL: [ParamAxis; 3] = [ParamAxis::Threshold, ParamAxis::Slope, ParamAxis::Lapse];

    /// Position of this axis in a `(threshold, slope, lapse)` block.
    pub fn index(self) -> usize {
        match self {
            ParamAxis::Threshold => 0,
            ParamAxis::Slope => 1,
            ParamAxis::Lapse => 2,
        }
    }
}
impl FromStr for ParamAxis {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" | "alpha" => Ok(ParamAxis::Threshold),
            "slope" | "beta" => Ok(ParamAxis::Slope),
            "lapse" | "lambda" => Ok(ParamAxis::Lapse),
            _ => track_panic!(ErrorKind::InvalidConfig, "Unknown parameter axis: {:?}", s),
        }
    }
}

/// Set of parameter axes summed out before computing entropies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marginalization {
    axes: [bool; 3],
}
impl Marginalization {
    /// No marginalization: entropies are taken over the full joint distribution.
    pub fn none() -> Self {
        Self::default()
    }

    /// Marginalizes out the given axes.
    pub fn over<I>(axes: I) -> Self
    where
        I: IntoIterator<Item = ParamAxis>,
    {
        let mut this = Self::none();
        for axis in axes {
            this.axes[axis.index()] = true;
        }
        this
    }

    pub fn contains(&self, axis: ParamAxis) -> bool {
        self.axes[axis.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.axes.iter().all(|&x| !x)
    }

    pub fn is_total(&self) -> bool {
        self.axes.iter().all(|&x| x)
    }

    /// Returns the marginalized axes in ascending order.
    pub fn axes(&self) -> Vec<ParamAxis> {
        ParamAxis::ALL
            .iter()
            .copied()
            .filter(|&a| self.contains(a))
            .collect()
    }

    /// Sums `block` over the marginalized axes.
    pub fn apply(&self, block: ArrayView3<f64>) -> ArrayD<f64> {
        let mut block = block.into_dyn().to_owned();
        for axis in self.axes().into_iter().rev() {
            block = block.sum_axis(Axis(axis.index()));
        }
        block
    }
}

/// The grids of all axes together with the normalized joint prior over `(threshold, slope, lapse)`.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    stimulus: ParameterGrid,
    threshold: ParameterGrid,
    slope: ParameterGrid,
    lapse: ParameterGrid,
    prior: Array3<f64>,
}
impl ParameterSpace {
    /// Builds the grids and the joint prior.
    ///
    /// Under `StimulusScale::Logarithmic` the stimulus and threshold grids hold natural logarithms.
    ///
    /// # Errors
    ///
    /// Returns an `ErrorKind::InvalidConfig` error if a grid cannot be built,
    /// if a lapse point lies outside of `[0, 1)`, or if the joint prior has no mass.
    pub fn build(
        stimulus: &AxisSpec,
        threshold: &ParameterAxis,
        slope: &ParameterAxis,
        lapse: &ParameterAxis,
        scale: StimulusScale,
    ) -> Result<Self> {
        let log = scale.is_logarithmic();
        let stimulus_grid = track!(ParameterGrid::build(stimulus, log); scale)?;
        let threshold_grid = track!(ParameterGrid::build(&threshold.spec, log); scale)?;
        let slope_grid = track!(ParameterGrid::build(&slope.spec, false))?;
        let lapse_grid = track!(ParameterGrid::build(&lapse.spec, false))?;
        track_assert!(
            lapse_grid.values().iter().all(|&l| 0.0 <= l && l < 1.0),
            ErrorKind::InvalidConfig; lapse.spec
        );

        let pt = track!(threshold.prior_weights())?;
        let ps = track!(slope.prior_weights())?;
        let pl = track!(lapse.prior_weights())?;
        let mut prior = Array3::from_shape_fn((pt.len(), ps.len(), pl.len()), |(j, k, l)| {
            pt[j] * ps[k] * pl[l]
        });
        let total = prior.sum();
        track_assert!(
            total.is_finite() && total > MIN_NORMALIZER,
            ErrorKind::InvalidConfig,
            "The joint prior has no usable mass: total={}",
            total
        );
        prior /= total;

        Ok(Self {
            stimulus: stimulus_grid,
            threshold: threshold_grid,
            slope: slope_grid,
            lapse: lapse_grid,
            prior,
        })
    }

    pub fn stimulus(&self) -> &ParameterGrid {
        &self.stimulus
    }

    pub fn threshold(&self) -> &ParameterGrid {
        &self.threshold
    }

    pub fn slope(&self) -> &ParameterGrid {
        &self.slope
    }

    pub fn lapse(&self) -> &ParameterGrid {
        &self.lapse
    }

    /// Returns the grid of the given parameter axis.
    pub fn grid(&self, axis: ParamAxis) -> &ParameterGrid {
        match axis {
            ParamAxis::Threshold => &self.threshold,
            ParamAxis::Slope => &self.slope,
            ParamAxis::Lapse => &self.lapse,
        }
    }

    /// Returns the normalized joint prior, indexed by `(threshold, slope, lapse)`.
    pub fn prior(&self) -> ArrayView3<f64> {
        self.prior.view()
    }

    /// Returns the shape `(stimuli, thresholds, slopes, lapses)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (
            self.stimulus.len(),
            self.threshold.len(),
            self.slope.len(),
            self.lapse.len(),
        )
    }
}
