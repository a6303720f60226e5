use crate::float::MIN_NORMALIZER;
use crate::psychometric::{PsychometricFamily, PsychometricParams};
use crate::space::{ParamAxis, ParameterSpace};
use crate::trial::Response;
use crate::{ErrorKind, Result};
use ndarray::{Array1, Array3, Array4, ArrayView1, ArrayView3, ArrayView4, Axis};

/// Probability of a correct response for every `(stimulus, threshold, slope, lapse)` cell.
#[derive(Debug, Clone)]
pub struct LikelihoodTable {
    table: Array4<f64>,
}
impl LikelihoodTable {
    pub fn build(space: &ParameterSpace, family: PsychometricFamily, guess: f64) -> Self {
        let xs = space.stimulus().values();
        let ts = space.threshold().values();
        let bs = space.slope().values();
        let ls = space.lapse().values();
        let table = Array4::from_shape_fn(space.shape(), |(i, j, k, l)| {
            let params = PsychometricParams {
                threshold: ts[j],
                slope: bs[k],
                guess,
                lapse: ls[l],
            };
            family.probability_correct(xs[i], &params)
        });
        Self { table }
    }

    #[cfg(test)]
    pub fn from_array(table: Array4<f64>) -> Self {
        Self { table }
    }

    /// Returns the `(threshold, slope, lapse)` block of the `i`-th stimulus candidate.
    pub fn slice(&self, i: usize) -> ArrayView3<f64> {
        self.table.index_axis(Axis(0), i)
    }

    pub fn as_array(&self) -> ArrayView4<f64> {
        self.table.view()
    }
}

/// Joint posterior over `(threshold, slope, lapse)`, replicated along the stimulus axis.
#[derive(Debug, Clone)]
pub struct JointPosterior {
    table: Array4<f64>,
}
impl JointPosterior {
    /// Replicates the normalized `prior` block for each of `stimuli` candidates.
    pub fn replicate(prior: ArrayView3<f64>, stimuli: usize) -> Self {
        let (t, s, l) = prior.dim();
        let table = Array4::from_shape_fn((stimuli, t, s, l), |(_, j, k, m)| prior[[j, k, m]]);
        Self { table }
    }

    /// Returns the stimulus-independent posterior block.
    pub fn slice(&self) -> ArrayView3<f64> {
        self.table.index_axis(Axis(0), 0)
    }

    pub fn as_array(&self) -> ArrayView4<f64> {
        self.table.view()
    }

    /// Bayes update with the response to the `k`-th stimulus candidate.
    ///
    /// On error, `self` is left untouched.
    ///
    /// # Errors
    ///
    /// If the response has (numerically) zero probability under the current posterior,
    /// an `ErrorKind::NumericalDegeneracy` error is returned.
    pub fn update(
        &mut self,
        likelihood: &LikelihoodTable,
        k: usize,
        response: Response,
    ) -> Result<()> {
        track_assert!(k < self.table.len_of(Axis(0)), ErrorKind::Bug; k);

        let posterior = self.slice();
        let lk = likelihood.slice(k);
        let mut tmp: Array3<f64> = match response {
            Response::Correct => &posterior * &lk,
            Response::Incorrect => &posterior * &lk.mapv(|p| 1.0 - p),
        };
        let evidence = tmp.sum();
        track_assert!(
            evidence.is_finite() && evidence > MIN_NORMALIZER,
            ErrorKind::NumericalDegeneracy,
            "No posterior mass left after the response: evidence={}, k={}, response={:?}",
            evidence,
            k,
            response
        );
        tmp /= evidence;

        for mut block in self.table.axis_iter_mut(Axis(0)) {
            block.assign(&tmp);
        }
        Ok(())
    }

    /// Returns the marginal posterior of `axis`.
    pub fn marginal(&self, axis: ParamAxis) -> Array1<f64> {
        let posterior = self.slice();
        match axis {
            ParamAxis::Threshold => posterior.sum_axis(Axis(2)).sum_axis(Axis(1)),
            ParamAxis::Slope => posterior.sum_axis(Axis(2)).sum_axis(Axis(0)),
            ParamAxis::Lapse => posterior.sum_axis(Axis(1)).sum_axis(Axis(0)),
        }
    }

    /// Returns the posterior mean of `axis` given its grid values.
    pub fn mean(&self, axis: ParamAxis, values: ArrayView1<f64>) -> f64 {
        self.marginal(axis).dot(&values)
    }
}
