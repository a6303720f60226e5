//! Adaptive procedures.
use crate::trial::{IdGen, Response, Trial};
use crate::Result;

/// Adaptive psychophysical procedure.
///
/// A trial runner alternates between `ask` and `tell`.
/// Several procedures can be driven in an interleaved fashion, each owning its own state.
pub trait AdaptiveProcedure {
    /// Asks the next trial to be presented.
    ///
    /// The observed response should be told to this procedure.
    ///
    /// # Errors
    ///
    /// Implementations may return an `ErrorKind::InvalidInput` error
    /// if the previously asked trial has not been told yet.
    fn ask<G: IdGen>(&mut self, idg: &mut G) -> Result<Trial>;

    /// Tells the response of an asked trial to this procedure.
    ///
    /// # Errors
    ///
    /// Implementations may return an `ErrorKind::InvalidInput` error
    /// if the trial is unknown to (or has not been asked by) this procedure.
    fn tell(&mut self, trial: Trial<Response>) -> Result<()>;
}
