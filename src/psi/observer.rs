use crate::psychometric::{PsychometricFamily, PsychometricParams};
use crate::space::StimulusScale;
use crate::trial::Response;
use crate::{ErrorKind, Result};
use rand::Rng;

/// Simulated observer whose responses follow a known psychometric function.
///
/// Under `StimulusScale::Logarithmic` both the presented stimulus and the true threshold are
/// log-transformed before the function is evaluated, just like in the estimation engine.
#[derive(Debug, Clone)]
pub struct VirtualObserver {
    family: PsychometricFamily,
    params: PsychometricParams,
    scale: StimulusScale,
}
impl VirtualObserver {
    /// Makes a new `VirtualObserver` instance.
    ///
    /// # Errors
    ///
    /// If `scale` is logarithmic and the threshold is not positive,
    /// an `ErrorKind::InvalidConfig` error is returned.
    pub fn new(
        family: PsychometricFamily,
        params: PsychometricParams,
        scale: StimulusScale,
    ) -> Result<Self> {
        if scale.is_logarithmic() {
            track_assert!(params.threshold > 0.0, ErrorKind::InvalidConfig; params);
        }
        Ok(Self {
            family,
            params,
            scale,
        })
    }

    /// Returns the probability that this observer responds correctly to `stimulus`.
    pub fn probability_correct(&self, stimulus: f64) -> f64 {
        if self.scale.is_logarithmic() {
            let params = PsychometricParams {
                threshold: self.params.threshold.ln(),
                ..self.params
            };
            self.family.probability_correct(stimulus.ln(), &params)
        } else {
            self.family.probability_correct(stimulus, &self.params)
        }
    }

    /// Draws a response to `stimulus`.
    pub fn respond<R: Rng + ?Sized>(&self, rng: &mut R, stimulus: f64) -> Response {
        let p = self.probability_correct(stimulus);
        Response::from(rng.gen::<f64>() < p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use trackable::result::TestResult;

    #[test]
    fn respond_follows_the_psychometric_function() -> TestResult {
        let params = track!(PsychometricParams::new(0.0, 2.0, 0.5, 0.0))?;
        let observer = track!(VirtualObserver::new(
            PsychometricFamily::Logistic,
            params,
            StimulusScale::Linear
        ))?;
        let mut rng = StdRng::seed_from_u64(7);

        let correct = (0..2000)
            .filter(|_| observer.respond(&mut rng, 0.0).is_correct())
            .count();
        assert!((1350..=1650).contains(&correct), "correct={}", correct);

        let correct = (0..200)
            .filter(|_| observer.respond(&mut rng, 20.0).is_correct())
            .count();
        assert_eq!(correct, 200);
        Ok(())
    }

    #[test]
    fn logarithmic_observer() -> TestResult {
        let params = track!(PsychometricParams::new(10.0, 3.0, 0.5, 0.0))?;
        let observer = track!(VirtualObserver::new(
            PsychometricFamily::Gaussian,
            params,
            StimulusScale::Logarithmic
        ))?;
        assert!((observer.probability_correct(10.0) - 0.75).abs() < 1e-12);
        assert!(observer.probability_correct(100.0) > 0.99);

        let params = track!(PsychometricParams::new(-1.0, 3.0, 0.5, 0.0))?;
        assert!(VirtualObserver::new(
            PsychometricFamily::Gaussian,
            params,
            StimulusScale::Logarithmic
        )
        .is_err());
        Ok(())
    }
}
