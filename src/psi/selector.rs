use super::posterior::{JointPosterior, LikelihoodTable};
use crate::float::{self, MIN_NORMALIZER};
use crate::space::Marginalization;
use crate::{ErrorKind, Result};
use ndarray::{Array1, Array4, ArrayView3, Axis};
use tracing::trace;

/// Result of a stimulus selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Index of the selected stimulus candidate.
    pub index: usize,

    /// Expected posterior entropy for every stimulus candidate.
    pub expected_entropies: Array1<f64>,
}

/// Computes the expected posterior entropy of testing each stimulus candidate next.
///
/// # Errors
///
/// If the predictive probability of a response is not finite,
/// an `ErrorKind::NumericalDegeneracy` error is returned.
pub fn expected_entropies(
    posterior: &JointPosterior,
    likelihood: &LikelihoodTable,
    marginalization: &Marginalization,
) -> Result<Array1<f64>> {
    let posterior = posterior.as_array();
    let likelihood = likelihood.as_array();
    track_assert_eq!(posterior.dim(), likelihood.dim(), ErrorKind::Bug);

    let raw_correct: Array4<f64> = &posterior * &likelihood;
    let raw_incorrect: Array4<f64> = &posterior * &likelihood.mapv(|p| 1.0 - p);
    let scaler_correct = sum_blocks(&raw_correct);
    let scaler_incorrect = sum_blocks(&raw_incorrect);
    track_assert!(
        scaler_correct
            .iter()
            .chain(scaler_incorrect.iter())
            .all(|s| s.is_finite()),
        ErrorKind::NumericalDegeneracy
    );

    let entropies = raw_correct
        .axis_iter(Axis(0))
        .zip(raw_incorrect.axis_iter(Axis(0)))
        .zip(scaler_correct.iter().zip(scaler_incorrect.iter()))
        .enumerate()
        .map(|(i, ((correct, incorrect), (&sc, &si)))| {
            if sc <= MIN_NORMALIZER || si <= MIN_NORMALIZER {
                trace!(
                    "Response with no predictive mass is skipped: candidate={}, p_correct={}, p_incorrect={}",
                    i,
                    sc,
                    si
                );
            }
            hypothetical_entropy(correct, sc, marginalization) * sc
                + hypothetical_entropy(incorrect, si, marginalization) * si
        })
        .collect::<Vec<_>>();
    Ok(Array1::from(entropies))
}

/// Selects the stimulus candidate with the smallest expected entropy.
///
/// Ties are resolved to the lowest index.
pub fn select(
    posterior: &JointPosterior,
    likelihood: &LikelihoodTable,
    marginalization: &Marginalization,
) -> Result<Selection> {
    let expected_entropies = track!(expected_entropies(posterior, likelihood, marginalization))?;
    let index = track_assert_some!(
        float::argmin(expected_entropies.iter().copied()),
        ErrorKind::NumericalDegeneracy; expected_entropies
    );
    Ok(Selection {
        index,
        expected_entropies,
    })
}

fn sum_blocks(xs: &Array4<f64>) -> Array1<f64> {
    xs.sum_axis(Axis(3)).sum_axis(Axis(2)).sum_axis(Axis(1))
}

// Entropy of the posterior that would follow a hypothetical response whose unnormalized
// posterior is `raw`. An impossible response contributes nothing.
fn hypothetical_entropy(
    raw: ArrayView3<f64>,
    scaler: f64,
    marginalization: &Marginalization,
) -> f64 {
    if scaler <= MIN_NORMALIZER {
        return 0.0;
    }
    let normalized = &raw / scaler;
    let distribution = marginalization.apply(normalized.view());
    float::entropy(distribution.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisSpec, ParameterAxis, Spacing};
    use crate::psychometric::PsychometricFamily;
    use crate::space::{ParamAxis, ParameterSpace, StimulusScale};
    use crate::trial::Response;
    use trackable::result::TestResult;

    fn setup() -> Result<(ParameterSpace, LikelihoodTable, JointPosterior)> {
        let stimulus = track!(AxisSpec::new(-5.0, 5.0, 1.0, Spacing::Linear))?;
        let threshold = track!(ParameterAxis::linear(-4.0, 4.0, 0.5))?;
        let slope = track!(ParameterAxis::logarithmic(0.25, 4.0, 2.0))?;
        let lapse = track!(ParameterAxis::linear(0.0, 0.1, 0.05))?;
        let space = track!(ParameterSpace::build(
            &stimulus,
            &threshold,
            &slope,
            &lapse,
            StimulusScale::Linear
        ))?;
        let likelihood = LikelihoodTable::build(&space, PsychometricFamily::Logistic, 0.5);
        let posterior = JointPosterior::replicate(space.prior(), space.stimulus().len());
        Ok((space, likelihood, posterior))
    }

    #[test]
    fn selected_stimulus_minimizes_expected_entropy() -> TestResult {
        let (space, likelihood, mut posterior) = track!(setup())?;
        let none = Marginalization::none();
        for &(k, r) in &[(5, true), (3, false), (7, true), (6, true)] {
            track!(posterior.update(&likelihood, k, Response::from(r)))?;
            let selection = track!(select(&posterior, &likelihood, &none))?;
            assert_eq!(selection.expected_entropies.len(), space.stimulus().len());
            let best = selection.expected_entropies[selection.index];
            for (i, &e) in selection.expected_entropies.iter().enumerate() {
                assert!(best <= e);
                if i < selection.index {
                    assert!(best < e);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn uniform_prior_prefers_central_stimuli() -> TestResult {
        let (space, likelihood, posterior) = track!(setup())?;
        let selection = track!(select(&posterior, &likelihood, &Marginalization::none()))?;
        let x = space.stimulus().values()[selection.index];
        assert!(x.abs() < 5.0, "x={}", x);
        Ok(())
    }

    #[test]
    fn expected_entropy_does_not_exceed_current_entropy() -> TestResult {
        let (_, likelihood, posterior) = track!(setup())?;
        let current = float::entropy(posterior.slice().iter());
        let entropies = track!(expected_entropies(
            &posterior,
            &likelihood,
            &Marginalization::none()
        ))?;
        for &e in entropies.iter() {
            assert!(e <= current + 1e-9, "{} > {}", e, current);
        }
        Ok(())
    }

    #[test]
    fn impossible_response_contributes_nothing() -> TestResult {
        let (_, likelihood, posterior) = track!(setup())?;
        let none = Marginalization::none();
        let zeros = ndarray::Array3::<f64>::zeros(posterior.slice().dim());
        assert_eq!(hypothetical_entropy(zeros.view(), 0.0, &none), 0.0);

        // A certain response: every hypothesis answers correctly at the first candidate.
        let mut table = likelihood.as_array().to_owned();
        table.index_axis_mut(Axis(0), 0).fill(1.0);
        let likelihood = LikelihoodTable::from_array(table);
        let entropies = track!(expected_entropies(&posterior, &likelihood, &none))?;
        let current = float::entropy(posterior.slice().iter());
        assert!(entropies.iter().all(|e| e.is_finite()));
        assert!((entropies[0] - current).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn marginalization_changes_entropies() -> TestResult {
        let (_, likelihood, posterior) = track!(setup())?;
        let full = track!(expected_entropies(
            &posterior,
            &likelihood,
            &Marginalization::none()
        ))?;
        let marginal = track!(expected_entropies(
            &posterior,
            &likelihood,
            &Marginalization::over(vec![ParamAxis::Slope])
        ))?;
        assert_eq!(full.len(), marginal.len());
        assert_ne!(full, marginal);

        // Summing out an axis can only remove entropy.
        for (f, m) in full.iter().zip(marginal.iter()) {
            assert!(m <= f);
        }
        Ok(())
    }
}
