//! Bayesian adaptive estimation of psychometric functions.
//!
//! This crate implements the PSI method: a grid-based Bayesian filter over the threshold,
//! slope and lapse rate of a psychometric function, which presents on each trial the stimulus
//! that minimizes the expected entropy of the posterior.
//!
//! # Examples
//!
//! ```
//! use psitrack::axis::{AxisSpec, ParameterAxis, Spacing};
//! use psitrack::psi::PsiOptions;
//! use psitrack::{PsychometricFamily, Response};
//!
//! # fn main() -> psitrack::Result<()> {
//! let stimulus = AxisSpec::new(-10.0, 10.0, 1.0, Spacing::Linear)?;
//! let threshold = ParameterAxis::linear(-10.0, 10.0, 1.0)?;
//! let slope = ParameterAxis::logarithmic(0.1, 10.0, 10f64.powf(0.25))?;
//! let lapse = ParameterAxis::linear(0.0, 0.1, 0.05)?;
//! let mut engine =
//!     PsiOptions::new(PsychometricFamily::Logistic, stimulus, threshold, slope, lapse).finish()?;
//!
//! let x = engine.next_stimulus();
//! let response = if x > 0.0 { Response::Correct } else { Response::Incorrect };
//! engine.update(response)?;
//! assert_eq!(engine.history().count(), 1);
//! # Ok(())
//! # }
//! ```
#[macro_use]
extern crate trackable;

pub use self::error::{Error, ErrorKind};
pub use self::procedure::AdaptiveProcedure;
pub use self::psychometric::{PsychometricFamily, PsychometricParams};
pub use self::trial::{Estimate, IdGen, Response, SerialIdGenerator, Trial, TrialId, TrialRecord};

pub mod axis;
pub mod psi;
pub mod psychometric;
pub mod range;
pub mod space;
pub mod trial;

mod error;
mod float;
mod procedure;

/// This crate specific `Result` type.
pub type Result<T> = std::result::Result<T, Error>;
