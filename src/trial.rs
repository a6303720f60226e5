//! Trials, responses and the per-trial history.
use crate::{ErrorKind, Result};
use std::convert::TryFrom;

/// Binary response of an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response {
    Incorrect,
    Correct,
}
impl Response {
    /// Converts a raw outcome (`0` = incorrect, `1` = correct).
    ///
    /// # Errors
    ///
    /// Any other value yields an `ErrorKind::InvalidInput` error.
    pub fn from_outcome(outcome: u8) -> Result<Self> {
        match outcome {
            0 => Ok(Response::Incorrect),
            1 => Ok(Response::Correct),
            _ => track_panic!(ErrorKind::InvalidInput, "Outcome must be 0 or 1: {}", outcome),
        }
    }

    pub fn outcome(self) -> u8 {
        match self {
            Response::Incorrect => 0,
            Response::Correct => 1,
        }
    }

    pub fn is_correct(self) -> bool {
        self == Response::Correct
    }
}
impl From<bool> for Response {
    fn from(correct: bool) -> Self {
        if correct {
            Response::Correct
        } else {
            Response::Incorrect
        }
    }
}
impl TryFrom<u8> for Response {
    type Error = crate::Error;

    fn try_from(outcome: u8) -> Result<Self> {
        track!(Self::from_outcome(outcome))
    }
}

/// Point estimate of the psychometric function parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimate {
    pub threshold: f64,
    pub slope: f64,
    pub guess: f64,
    pub lapse: f64,
}

/// History entry of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialRecord {
    /// Stimulus as presented to the observer.
    pub stimulus: f64,
    pub response: Response,

    /// Posterior-mean estimate right after this trial.
    pub estimate: Estimate,
}

/// Trial identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialId(u64);
impl TrialId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A trial handed out by an adaptive procedure.
///
/// `V` is `()` while the trial is pending and `Response` once it has been answered.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial<V = ()> {
    pub id: TrialId,
    pub stimulus: f64,
    pub response: V,
}
impl Trial<()> {
    /// Makes a new pending trial.
    pub fn new<G: IdGen>(idg: &mut G, stimulus: f64) -> Result<Self> {
        let id = track!(idg.generate())?;
        Ok(Self {
            id,
            stimulus,
            response: (),
        })
    }

    /// Attaches the observed response to this trial.
    pub fn answer(self, response: Response) -> Trial<Response> {
        Trial {
            id: self.id,
            stimulus: self.stimulus,
            response,
        }
    }
}

/// Trial ID generator.
pub trait IdGen {
    fn generate(&mut self) -> Result<TrialId>;
}

/// An implementation of `IdGen` that generates serial identifiers starting from zero.
#[derive(Debug, Default)]
pub struct SerialIdGenerator {
    next_id: u64,
}
impl SerialIdGenerator {
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }
}
impl IdGen for SerialIdGenerator {
    fn generate(&mut self) -> Result<TrialId> {
        let id = self.next_id;
        self.next_id += 1;
        Ok(TrialId::new(id))
    }
}
