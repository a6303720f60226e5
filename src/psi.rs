//! PSI method: entropy-minimizing Bayesian adaptive estimation.
//!
//! # References
//!
//! - Leonid L. Kontsevich and Christopher W. Tyler (1999), Vision Research, 39(16):2729-2737.
//!   "Bayesian adaptive estimation of psychometric slope and threshold"
//! - Nicolaas Prins (2013), Journal of Vision, 13(7):3.
//!   "The psi-marginal adaptive method: How to give nuisance parameters the attention they deserve (no more, no less)"
use self::posterior::{JointPosterior, LikelihoodTable};
use self::selector::Selection;
use crate::axis::{AxisSpec, ParameterAxis};
use crate::float;
use crate::procedure::AdaptiveProcedure;
use crate::psychometric::PsychometricFamily;
use crate::space::{Marginalization, ParamAxis, ParameterSpace, StimulusScale};
use crate::trial::{Estimate, IdGen, Response, Trial, TrialId, TrialRecord};
use crate::{ErrorKind, Result};
use ndarray::{Array1, ArrayView1, ArrayView4};
use std::slice;
use tracing::{debug, trace};

pub use self::config::{AxisOptions, PsiConfig};
pub use self::observer::VirtualObserver;

mod config;
mod observer;
mod posterior;
mod selector;

/// Options of `PsiEngine`.
#[derive(Debug, Clone)]
pub struct PsiOptions {
    family: PsychometricFamily,
    stimulus: AxisSpec,
    threshold: ParameterAxis,
    slope: ParameterAxis,
    lapse: ParameterAxis,
    guess_rate: f64,
    stimulus_scale: StimulusScale,
    marginalization: Marginalization,
    first_stimulus: Option<f64>,
}
impl PsiOptions {
    /// Makes a new `PsiOptions` instance.
    ///
    /// The defaults are a guess rate of `0.5` (two-alternative forced choice),
    /// the linear stimulus scale, no marginalization and an automatically selected first stimulus.
    pub fn new(
        family: PsychometricFamily,
        stimulus: AxisSpec,
        threshold: ParameterAxis,
        slope: ParameterAxis,
        lapse: ParameterAxis,
    ) -> Self {
        Self {
            family,
            stimulus,
            threshold,
            slope,
            lapse,
            guess_rate: 0.5,
            stimulus_scale: StimulusScale::Linear,
            marginalization: Marginalization::none(),
            first_stimulus: None,
        }
    }

    /// Sets the fixed guess rate.
    ///
    /// # Errors
    ///
    /// If `rate` is outside of `[0, 1)`, an `ErrorKind::InvalidConfig` error is returned.
    pub fn guess_rate(mut self, rate: f64) -> Result<Self> {
        track_assert!(0.0 <= rate && rate < 1.0, ErrorKind::InvalidConfig; rate);
        self.guess_rate = rate;
        Ok(self)
    }

    pub fn stimulus_scale(mut self, scale: StimulusScale) -> Self {
        self.stimulus_scale = scale;
        self
    }

    /// Sets the parameter axes to be marginalized out when selecting stimuli.
    ///
    /// # Errors
    ///
    /// Marginalizing out every parameter axis yields an `ErrorKind::InvalidConfig` error.
    pub fn marginalize(mut self, marginalization: Marginalization) -> Result<Self> {
        track_assert!(
            !marginalization.is_total(),
            ErrorKind::InvalidConfig,
            "At least one parameter axis must remain after marginalization"
        );
        self.marginalization = marginalization;
        Ok(self)
    }

    /// Presents `stimulus` on the first trial instead of selecting it from the prior.
    pub fn first_stimulus(mut self, stimulus: f64) -> Result<Self> {
        track_assert!(stimulus.is_finite(), ErrorKind::InvalidConfig; stimulus);
        self.first_stimulus = Some(stimulus);
        Ok(self)
    }

    /// Builds a new `PsiEngine` instance.
    ///
    /// # Errors
    ///
    /// Any invalid combination of options yields an `ErrorKind::InvalidConfig` error.
    pub fn finish(&self) -> Result<PsiEngine> {
        let max_lapse = self.lapse.spec.points().into_iter().fold(0.0, f64::max);
        track_assert!(
            self.guess_rate + max_lapse < 1.0,
            ErrorKind::InvalidConfig,
            "guess_rate + lapse must be less than 1: guess_rate={}, max_lapse={}",
            self.guess_rate,
            max_lapse
        );
        if let (Some(x), StimulusScale::Logarithmic) = (self.first_stimulus, self.stimulus_scale) {
            track_assert!(x > 0.0, ErrorKind::InvalidConfig; x);
        }

        let space = track!(ParameterSpace::build(
            &self.stimulus,
            &self.threshold,
            &self.slope,
            &self.lapse,
            self.stimulus_scale
        ))?;
        let (stimuli, thresholds, slopes, lapses) = space.shape();
        debug!(
            "Building PSI engine: family={}, scale={}, stimuli={}, thresholds={}, slopes={}, lapses={}",
            self.family, self.stimulus_scale, stimuli, thresholds, slopes, lapses
        );

        let likelihood = LikelihoodTable::build(&space, self.family, self.guess_rate);
        let posterior = JointPosterior::replicate(space.prior(), stimuli);
        let mut engine = PsiEngine {
            family: self.family,
            guess_rate: self.guess_rate,
            stimulus_scale: self.stimulus_scale,
            marginalization: self.marginalization,
            space,
            likelihood,
            posterior,
            history: Vec::new(),
            next_stimulus: 0.0,
            expected_entropies: None,
            pending: None,
        };
        if let Some(x) = self.first_stimulus {
            engine.next_stimulus = x;
        } else {
            let selection = track!(engine.select(&engine.posterior))?;
            engine.apply_selection(selection);
        }
        Ok(engine)
    }
}

/// Estimation engine of the PSI method.
///
/// Each instance tracks one adaptive track; interleaved tracks use independent instances.
#[derive(Debug, Clone)]
pub struct PsiEngine {
    family: PsychometricFamily,
    guess_rate: f64,
    stimulus_scale: StimulusScale,
    marginalization: Marginalization,
    space: ParameterSpace,
    likelihood: LikelihoodTable,
    posterior: JointPosterior,
    history: Vec<TrialRecord>,
    next_stimulus: f64,
    expected_entropies: Option<Array1<f64>>,
    pending: Option<TrialId>,
}
impl PsiEngine {
    /// Makes a new `PsiEngine` instance from the given options.
    pub fn new(options: &PsiOptions) -> Result<Self> {
        track!(options.finish())
    }

    /// Returns the stimulus to be presented next (in the linear domain).
    pub fn next_stimulus(&self) -> f64 {
        self.next_stimulus
    }

    /// Updates the posterior with the response to the recommended stimulus.
    pub fn update(&mut self, response: Response) -> Result<()> {
        let stimulus = self.next_stimulus;
        track!(self.update_at(stimulus, response))
    }

    /// Updates the posterior with a raw outcome (`0` = incorrect, `1` = correct).
    pub fn update_with_outcome(&mut self, outcome: u8) -> Result<()> {
        let response = track!(Response::from_outcome(outcome))?;
        track!(self.update(response))
    }

    /// Updates the posterior with the response to `stimulus`.
    ///
    /// The stimulus is matched against the nearest stimulus candidate.
    /// If this method fails, the state of the engine does not change.
    ///
    /// # Errors
    ///
    /// - `ErrorKind::InvalidInput`: `stimulus` is not finite (or not positive on the logarithmic scale),
    ///   or a trial handed out by `ask` is still waiting for `tell`
    /// - `ErrorKind::NumericalDegeneracy`: the response is impossible under the current posterior
    pub fn update_at(&mut self, stimulus: f64, response: Response) -> Result<()> {
        track_assert!(
            self.pending.is_none(),
            ErrorKind::InvalidInput,
            "The asked trial must be answered by `tell`: {:?}",
            self.pending
        );
        track!(self.apply_response(stimulus, response))
    }

    fn apply_response(&mut self, stimulus: f64, response: Response) -> Result<()> {
        track_assert!(stimulus.is_finite(), ErrorKind::InvalidInput; stimulus);
        if self.stimulus_scale.is_logarithmic() {
            track_assert!(stimulus > 0.0, ErrorKind::InvalidInput; stimulus);
        }

        let grid = self.space.stimulus();
        let target = grid.to_internal(stimulus);
        let k = track_assert_some!(
            float::nearest(grid.values().iter(), target),
            ErrorKind::Bug; stimulus
        );

        let mut posterior = self.posterior.clone();
        track!(posterior.update(&self.likelihood, k, response); stimulus, k)?;
        let selection = track!(self.select(&posterior))?;

        self.posterior = posterior;
        let estimate = self.estimate();
        debug!(
            "PSI trial #{}: stimulus={}, response={:?}, threshold={}, slope={}, lapse={}",
            self.history.len(),
            stimulus,
            response,
            estimate.threshold,
            estimate.slope,
            estimate.lapse
        );
        self.history.push(TrialRecord {
            stimulus,
            response,
            estimate,
        });
        self.apply_selection(selection);
        Ok(())
    }

    /// Returns the posterior-mean estimate of the current posterior.
    ///
    /// Before the first trial, this is the prior mean.
    pub fn estimate(&self) -> Estimate {
        let threshold = self.posterior_mean(ParamAxis::Threshold);
        let threshold = if self.stimulus_scale.is_logarithmic() {
            threshold.exp()
        } else {
            threshold
        };
        Estimate {
            threshold,
            slope: self.posterior_mean(ParamAxis::Slope),
            guess: self.guess_rate,
            lapse: self.posterior_mean(ParamAxis::Lapse),
        }
    }

    /// Returns the history of trials in trial order.
    pub fn history(&self) -> slice::Iter<TrialRecord> {
        self.history.iter()
    }

    pub fn trial_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the marginal posterior of `axis` (aligned with `self.space().grid(axis)`).
    pub fn marginal(&self, axis: ParamAxis) -> Array1<f64> {
        self.posterior.marginal(axis)
    }

    /// Returns the expected entropies computed by the latest stimulus selection.
    ///
    /// `None` if no selection has been made yet (i.e., the first stimulus was given explicitly).
    pub fn expected_entropies(&self) -> Option<ArrayView1<f64>> {
        self.expected_entropies.as_ref().map(|e| e.view())
    }

    /// Returns the joint posterior, indexed by `(stimulus, threshold, slope, lapse)`.
    pub fn posterior(&self) -> ArrayView4<f64> {
        self.posterior.as_array()
    }

    /// Returns the likelihood table, indexed by `(stimulus, threshold, slope, lapse)`.
    pub fn likelihood(&self) -> ArrayView4<f64> {
        self.likelihood.as_array()
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn family(&self) -> PsychometricFamily {
        self.family
    }

    pub fn guess_rate(&self) -> f64 {
        self.guess_rate
    }

    pub fn stimulus_scale(&self) -> StimulusScale {
        self.stimulus_scale
    }

    pub fn marginalization(&self) -> &Marginalization {
        &self.marginalization
    }

    fn posterior_mean(&self, axis: ParamAxis) -> f64 {
        self.posterior.mean(axis, self.space.grid(axis).values())
    }

    fn select(&self, posterior: &JointPosterior) -> Result<Selection> {
        track!(selector::select(
            posterior,
            &self.likelihood,
            &self.marginalization
        ))
    }

    fn apply_selection(&mut self, selection: Selection) {
        let grid = self.space.stimulus();
        self.next_stimulus = grid.to_natural(grid.values()[selection.index]);
        trace!(
            "PSI selection: stimulus={}, expected_entropy={}",
            self.next_stimulus,
            selection.expected_entropies[selection.index]
        );
        self.expected_entropies = Some(selection.expected_entropies);
    }
}
impl AdaptiveProcedure for PsiEngine {
    fn ask<G: IdGen>(&mut self, idg: &mut G) -> Result<Trial> {
        track_assert!(
            self.pending.is_none(),
            ErrorKind::InvalidInput,
            "The previous trial has not been answered: {:?}",
            self.pending
        );
        let trial = track!(Trial::new(idg, self.next_stimulus))?;
        self.pending = Some(trial.id);
        Ok(trial)
    }

    fn tell(&mut self, trial: Trial<Response>) -> Result<()> {
        track_assert_eq!(self.pending, Some(trial.id), ErrorKind::InvalidInput);
        track!(self.apply_response(trial.stimulus, trial.response))?;
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Prior, Spacing};
    use crate::psychometric::PsychometricParams;
    use crate::trial::SerialIdGenerator;
    use ndarray::Axis;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use trackable::result::TestResult;

    fn options() -> Result<PsiOptions> {
        let stimulus = track!(AxisSpec::new(-5.0, 5.0, 1.0, Spacing::Linear))?;
        let threshold = track!(ParameterAxis::linear(-5.0, 5.0, 0.5))?;
        let slope = track!(ParameterAxis::logarithmic(0.25, 8.0, 2.0))?;
        let lapse = track!(ParameterAxis::linear(0.0, 0.1, 0.05))?;
        Ok(PsiOptions::new(
            PsychometricFamily::Logistic,
            stimulus,
            threshold,
            slope,
            lapse,
        ))
    }

    #[test]
    fn first_stimulus_is_selected_from_the_prior() -> TestResult {
        let engine = track!(track!(options())?.finish())?;
        let entropies = engine.expected_entropies().expect("selected from the prior");
        assert_eq!(entropies.len(), 11);

        let i = float::argmin(entropies.iter().copied()).expect("non-empty");
        assert_eq!(engine.next_stimulus(), engine.space().stimulus().values()[i]);
        assert_eq!(engine.trial_count(), 0);
        assert!(engine.estimate().threshold.abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn explicit_first_stimulus() -> TestResult {
        let engine = track!(track!(track!(options())?.first_stimulus(3.3))?.finish())?;
        assert_eq!(engine.next_stimulus(), 3.3);
        assert!(engine.expected_entropies().is_none());
        Ok(())
    }

    #[test]
    fn update_invariants() -> TestResult {
        let mut engine = track!(track!(options())?.finish())?;
        let params = track!(PsychometricParams::new(1.0, 2.0, 0.5, 0.0))?;
        let observer = track!(VirtualObserver::new(
            PsychometricFamily::Logistic,
            params,
            StimulusScale::Linear
        ))?;
        let mut rng = StdRng::seed_from_u64(0);

        for t in 0..20 {
            let x = engine.next_stimulus();
            let response = observer.respond(&mut rng, x);
            track!(engine.update(response))?;
            assert_eq!(engine.trial_count(), t + 1);

            let posterior = engine.posterior();
            let first = posterior.index_axis(Axis(0), 0).to_owned();
            for block in posterior.axis_iter(Axis(0)) {
                assert!((block.sum() - 1.0).abs() < 1e-9);
                assert_eq!(block, first);
            }

            let entropies = engine.expected_entropies().expect("selected after update");
            let chosen = engine.space().stimulus().to_internal(engine.next_stimulus());
            let i = float::nearest(engine.space().stimulus().values().iter(), chosen)
                .expect("non-empty");
            assert!(entropies.iter().all(|&e| entropies[i] <= e));
        }

        let history = engine.history().collect::<Vec<_>>();
        assert_eq!(history.len(), 20);
        assert_eq!(history[19].estimate, engine.estimate());
        assert!(history.iter().all(|r| r.estimate.guess == 0.5));

        // The history can be iterated again from the beginning.
        assert_eq!(engine.history().count(), 20);
        Ok(())
    }

    #[test]
    fn invalid_outcome_is_rejected() -> TestResult {
        let mut engine = track!(track!(options())?.finish())?;
        let e = engine.update_with_outcome(2).err();
        assert_eq!(e.map(|e| e.kind().clone()), Some(ErrorKind::InvalidInput));
        assert_eq!(engine.trial_count(), 0);

        track!(engine.update_with_outcome(1))?;
        assert_eq!(engine.trial_count(), 1);
        assert_eq!(
            engine.history().next().map(|r| r.response),
            Some(Response::Correct)
        );
        Ok(())
    }

    #[test]
    fn update_at_uses_the_nearest_candidate() -> TestResult {
        let mut a = track!(track!(options())?.finish())?;
        let mut b = a.clone();
        track!(a.update_at(2.4, Response::Incorrect))?;
        track!(b.update_at(2.0, Response::Incorrect))?;
        assert_eq!(a.posterior(), b.posterior());
        assert_eq!(a.history().next().map(|r| r.stimulus), Some(2.4));

        assert!(a.update_at(std::f64::NAN, Response::Correct).is_err());
        assert_eq!(a.trial_count(), 1);
        Ok(())
    }

    #[test]
    fn ask_and_tell() -> TestResult {
        let mut engine = track!(track!(options())?.finish())?;
        let mut idg = SerialIdGenerator::new();

        let trial = track!(engine.ask(&mut idg))?;
        assert_eq!(trial.stimulus, engine.next_stimulus());
        assert!(engine.ask(&mut idg).is_err());

        let mut stale = trial.clone().answer(Response::Correct);
        stale.id = TrialId::new(100);
        assert!(engine.tell(stale).is_err());

        track!(engine.tell(trial.answer(Response::Correct)))?;
        assert_eq!(engine.trial_count(), 1);

        let trial = track!(engine.ask(&mut idg))?;
        assert_eq!(trial.id.get(), 1);
        Ok(())
    }

    #[test]
    fn direct_update_is_rejected_while_a_trial_is_pending() -> TestResult {
        let mut engine = track!(track!(options())?.finish())?;
        let mut idg = SerialIdGenerator::new();
        let trial = track!(engine.ask(&mut idg))?;

        let e = engine.update(Response::Correct).err();
        assert_eq!(e.map(|e| e.kind().clone()), Some(ErrorKind::InvalidInput));
        assert!(engine.update_at(1.0, Response::Correct).is_err());
        assert_eq!(engine.trial_count(), 0);

        track!(engine.tell(trial.answer(Response::Correct)))?;
        assert_eq!(engine.trial_count(), 1);
        track!(engine.update(Response::Incorrect))?;
        assert_eq!(engine.trial_count(), 2);
        Ok(())
    }

    #[test]
    fn invalid_options() -> TestResult {
        let options = track!(options())?;
        assert!(options.clone().guess_rate(1.0).is_err());
        assert!(options
            .clone()
            .marginalize(Marginalization::over(ParamAxis::ALL.iter().copied()))
            .is_err());
        assert!(options.clone().first_stimulus(std::f64::INFINITY).is_err());

        let lapse = track!(ParameterAxis::linear(0.0, 0.6, 0.1))?;
        let options = PsiOptions { lapse, ..options };
        let e = track!(options.guess_rate(0.5))?.finish().err();
        assert_eq!(e.map(|e| e.kind().clone()), Some(ErrorKind::InvalidConfig));
        Ok(())
    }

    #[test]
    fn normal_prior_pulls_the_initial_estimate() -> TestResult {
        let options = track!(options())?;
        let threshold = track!(options.threshold.with_prior(Prior::Normal {
            mean: 2.0,
            std: 1.0
        }))?;
        let engine = track!(PsiOptions { threshold, ..options }.finish())?;
        assert!((engine.estimate().threshold - 2.0).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn independent_interleaved_tracks() -> TestResult {
        let options = track!(options())?;
        let mut tracks = vec![track!(options.finish())?, track!(options.finish())?];
        let mut idg = SerialIdGenerator::new();

        for i in 0..6 {
            for (j, engine) in tracks.iter_mut().enumerate() {
                let trial = track!(engine.ask(&mut idg))?;
                let response = Response::from((i + j) % 2 == 0);
                track!(engine.tell(trial.answer(response)))?;
            }
        }
        assert_eq!(tracks[0].trial_count(), 6);
        assert_eq!(tracks[1].trial_count(), 6);
        assert_ne!(tracks[0].estimate(), tracks[1].estimate());
        Ok(())
    }
}
