use super::{PsiEngine, PsiOptions};
use crate::axis::{AxisSpec, ParameterAxis, Prior, Spacing};
use crate::psychometric::PsychometricFamily;
use crate::space::{Marginalization, ParamAxis, StimulusScale};
use crate::Result;

/// Raw options of one axis, as written in an experiment file.
///
/// `dist`, `mu` and `std` are ignored for the stimulus axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisOptions {
    pub limits: (f64, f64),
    pub step: f64,
    pub spacing: String,
    pub dist: String,
    pub mu: f64,
    pub std: f64,
}
impl AxisOptions {
    /// Makes a new `AxisOptions` instance with a uniform prior.
    pub fn new(low: f64, high: f64, step: f64, spacing: &str) -> Self {
        Self {
            limits: (low, high),
            step,
            spacing: spacing.to_owned(),
            dist: "uniform".to_owned(),
            mu: 0.0,
            std: 1.0,
        }
    }

    pub fn prior(mut self, dist: &str, mu: f64, std: f64) -> Self {
        self.dist = dist.to_owned();
        self.mu = mu;
        self.std = std;
        self
    }

    pub fn to_axis_spec(&self) -> Result<AxisSpec> {
        let spacing = track!(self.spacing.parse::<Spacing>())?;
        track!(AxisSpec::new(self.limits.0, self.limits.1, self.step, spacing))
    }

    pub fn to_parameter_axis(&self) -> Result<ParameterAxis> {
        let spec = track!(self.to_axis_spec())?;
        let prior = track!(Prior::from_parts(&self.dist, self.mu, self.std))?;
        track!(ParameterAxis::from(spec).with_prior(prior))
    }
}

/// String-tagged configuration of a PSI track.
///
/// Every tag is validated by `PsiConfig::to_options` before anything is built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsiConfig {
    /// `"logistic"`, `"gaussian"`, `"weibull"` or `"gumbel"`.
    pub model: String,

    /// `"linear"` or `"logarithmic"`.
    pub stimulus_scale: String,
    pub guess_rate: f64,
    pub stimulus: AxisOptions,
    pub threshold: AxisOptions,
    pub slope: AxisOptions,
    pub lapse: AxisOptions,

    /// Names of the parameter axes to be marginalized out (`"threshold"`, `"slope"`, `"lapse"`).
    #[cfg_attr(feature = "serde", serde(default))]
    pub marginalize: Vec<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub first_stimulus: Option<f64>,
}
impl PsiConfig {
    /// Converts this configuration to `PsiOptions`.
    ///
    /// # Errors
    ///
    /// Unknown tags and malformed axes yield `ErrorKind::InvalidConfig` errors.
    pub fn to_options(&self) -> Result<PsiOptions> {
        let family = track!(self.model.parse::<PsychometricFamily>())?;
        let scale = track!(self.stimulus_scale.parse::<StimulusScale>())?;
        let marginalized = self
            .marginalize
            .iter()
            .map(|axis| track!(axis.parse::<ParamAxis>()))
            .collect::<Result<Vec<_>>>()?;

        let stimulus = track!(self.stimulus.to_axis_spec(); "stimulus")?;
        let threshold = track!(self.threshold.to_parameter_axis(); "threshold")?;
        let slope = track!(self.slope.to_parameter_axis(); "slope")?;
        let lapse = track!(self.lapse.to_parameter_axis(); "lapse")?;

        let mut options = PsiOptions::new(family, stimulus, threshold, slope, lapse)
            .stimulus_scale(scale);
        options = track!(options.guess_rate(self.guess_rate))?;
        options = track!(options.marginalize(Marginalization::over(marginalized)))?;
        if let Some(x) = self.first_stimulus {
            options = track!(options.first_stimulus(x))?;
        }
        Ok(options)
    }

    /// Builds a new `PsiEngine` instance.
    pub fn finish(&self) -> Result<PsiEngine> {
        let options = track!(self.to_options())?;
        track!(options.finish())
    }
}
