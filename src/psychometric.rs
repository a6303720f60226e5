//! Psychometric functions.
//!
//! Every family shares the form
//! `p = guess + (1 - guess - lapse) * F((stimulus - threshold) * slope)`
//! and differs only in the sigmoid `F`.
use crate::{ErrorKind, Result};
use statrs::function::erf::erfc;
use std::f64::consts::{LN_10, SQRT_2};
use std::fmt;
use std::str::FromStr;

/// Psychometric function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PsychometricFamily {
    /// Logistic CDF: `1 / (1 + exp(-z))`.
    Logistic,

    /// Standard normal CDF.
    Gaussian,

    /// Weibull CDF in log coordinates: `1 - exp(-exp(z))`.
    Weibull,

    /// Gumbel (log10-Weibull) CDF: `1 - exp(-10^z)`.
    Gumbel,
}
impl PsychometricFamily {
    /// All supported families.
    pub const ALL: [Self; 4] = [Self::Logistic, Self::Gaussian, Self::Weibull, Self::Gumbel];

    /// Evaluates the sigmoid `F(z)` of this family.
    ///
    /// The result always lies within `[0, 1]`, even for infinite `z`.
    pub fn sigmoid(self, z: f64) -> f64 {
        match self {
            Self::Logistic => {
                if z >= 0.0 {
                    1.0 / (1.0 + (-z).exp())
                } else {
                    let e = z.exp();
                    e / (1.0 + e)
                }
            }
            Self::Gaussian => 0.5 * erfc(-z / SQRT_2),
            Self::Weibull => -(-z.exp()).exp_m1(),
            Self::Gumbel => -(-(z * LN_10).exp()).exp_m1(),
        }
    }

    /// Probability of a correct response to `stimulus` under `params`.
    pub fn probability_correct(self, stimulus: f64, params: &PsychometricParams) -> f64 {
        let z = (stimulus - params.threshold) * params.slope;
        let f = if z.is_nan() { 0.5 } else { self.sigmoid(z) };
        let p = params.guess + (1.0 - params.guess - params.lapse) * f;
        p.max(params.guess).min(1.0 - params.lapse)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Logistic => "logistic",
            Self::Gaussian => "gaussian",
            Self::Weibull => "weibull",
            Self::Gumbel => "gumbel",
        }
    }
}
impl fmt::Display for PsychometricFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for PsychometricFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "logistic" => Ok(Self::Logistic),
            "gaussian" | "normal" => Ok(Self::Gaussian),
            "weibull" => Ok(Self::Weibull),
            "gumbel" => Ok(Self::Gumbel),
            _ => track_panic!(ErrorKind::InvalidConfig, "Unknown psychometric family: {:?}", s),
        }
    }
}

/// Parameters of a psychometric function.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PsychometricParams {
    pub threshold: f64,
    pub slope: f64,
    pub guess: f64,
    pub lapse: f64,
}
impl PsychometricParams {
    /// Makes a new `PsychometricParams` instance.
    ///
    /// # Errors
    ///
    /// If one of the following conditions is satisfied, an `ErrorKind::InvalidConfig` error is returned:
    ///
    /// - a parameter is not finite
    /// - `guess` or `lapse` is outside of `[0, 1)`
    /// - `guess + lapse >= 1`
    pub fn new(threshold: f64, slope: f64, guess: f64, lapse: f64) -> Result<Self> {
        track_assert!(threshold.is_finite(), ErrorKind::InvalidConfig; threshold);
        track_assert!(slope.is_finite(), ErrorKind::InvalidConfig; slope);
        track_assert!(0.0 <= guess && guess < 1.0, ErrorKind::InvalidConfig; guess);
        track_assert!(0.0 <= lapse && lapse < 1.0, ErrorKind::InvalidConfig; lapse);
        track_assert!(guess + lapse < 1.0, ErrorKind::InvalidConfig; guess, lapse);
        Ok(Self {
            threshold,
            slope,
            guess,
            lapse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackable::result::TestResult;

    #[test]
    fn bounds_hold_for_all_families() -> TestResult {
        let params = track!(PsychometricParams::new(0.5, 3.0, 0.5, 0.05))?;
        for &family in PsychometricFamily::ALL.iter() {
            for i in -200..=200 {
                let x = i as f64 * 0.1;
                let p = family.probability_correct(x, &params);
                assert!(params.guess <= p && p <= 1.0 - params.lapse, "{} {} {}", family, x, p);
            }
        }
        Ok(())
    }

    #[test]
    fn extremes_saturate() -> TestResult {
        let params = track!(PsychometricParams::new(0.0, 2.0, 0.25, 0.1))?;
        for &family in PsychometricFamily::ALL.iter() {
            let low = family.probability_correct(-1e6, &params);
            let high = family.probability_correct(1e6, &params);
            assert!((low - 0.25).abs() < 1e-9, "{}: {}", family, low);
            assert!((high - 0.9).abs() < 1e-9, "{}: {}", family, high);

            let low = family.probability_correct(std::f64::NEG_INFINITY, &params);
            let high = family.probability_correct(std::f64::INFINITY, &params);
            assert!((low - 0.25).abs() < 1e-12, "{}: {}", family, low);
            assert!((high - 0.9).abs() < 1e-12, "{}: {}", family, high);
        }
        Ok(())
    }

    #[test]
    fn sigmoids_are_monotonic() {
        for &family in PsychometricFamily::ALL.iter() {
            let mut prev = family.sigmoid(-50.0);
            for i in -499..=500 {
                let curr = family.sigmoid(i as f64 * 0.1);
                assert!(prev <= curr, "{}", family);
                prev = curr;
            }
        }
    }

    #[test]
    fn midpoints() {
        assert!((PsychometricFamily::Logistic.sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((PsychometricFamily::Gaussian.sigmoid(0.0) - 0.5).abs() < 1e-12);
        let weibull = 1.0 - (-1.0f64).exp();
        assert!((PsychometricFamily::Weibull.sigmoid(0.0) - weibull).abs() < 1e-12);
        assert!((PsychometricFamily::Gumbel.sigmoid(0.0) - weibull).abs() < 1e-12);
    }

    #[test]
    fn family_from_str_works() -> TestResult {
        assert_eq!(
            track!("Logistic".parse::<PsychometricFamily>())?,
            PsychometricFamily::Logistic
        );
        assert_eq!(
            track!("gumbel".parse::<PsychometricFamily>())?,
            PsychometricFamily::Gumbel
        );
        let e = "probit".parse::<PsychometricFamily>().err();
        assert_eq!(e.map(|e| e.kind().clone()), Some(ErrorKind::InvalidConfig));
        Ok(())
    }

    #[test]
    fn invalid_params() {
        assert!(PsychometricParams::new(0.0, 1.0, 0.6, 0.4).is_err());
        assert!(PsychometricParams::new(0.0, 1.0, -0.1, 0.0).is_err());
        assert!(PsychometricParams::new(std::f64::NAN, 1.0, 0.5, 0.0).is_err());
    }
}
