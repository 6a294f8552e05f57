//! When to stop sampling.

use plda_types::{PlateauCriterion, SamplerSettings};
use serde::Serialize;

use crate::error::SamplerError;

/// Why a sampling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    MaxSweeps,
    LikelihoodPlateau,
    ChangeRatePlateau,
    /// Stop requested through the run's [`crate::StopHandle`]
    Cancelled,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::MaxSweeps => write!(f, "max sweeps"),
            TerminationReason::LikelihoodPlateau => write!(f, "likelihood plateau"),
            TerminationReason::ChangeRatePlateau => write!(f, "change-rate plateau"),
            TerminationReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Sweep budget plus an optional plateau test.
///
/// Plateau tests only look at sweeps after `burn_in`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergencePolicy {
    pub max_sweeps: usize,
    pub burn_in: usize,
    pub plateau: Option<PlateauCriterion>,
}

impl ConvergencePolicy {
    /// Exactly `sweeps` sweeps, no early stop.
    pub fn fixed(sweeps: usize) -> Self {
        Self {
            max_sweeps: sweeps,
            burn_in: 0,
            plateau: None,
        }
    }

    /// True when the plateau test needs the log-likelihood of every sweep.
    pub fn tracks_likelihood(&self) -> bool {
        matches!(self.plateau, Some(PlateauCriterion::Likelihood { .. }))
    }

    /// Main sampling phase as configured.
    pub fn from_settings(settings: &SamplerSettings) -> Self {
        Self {
            max_sweeps: settings.max_sweeps,
            burn_in: settings.burn_in,
            plateau: settings.plateau,
        }
    }

    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.max_sweeps == 0 {
            return Err(SamplerError::InvalidArgument(
                "max_sweeps must be > 0".to_string(),
            ));
        }
        match self.plateau {
            Some(PlateauCriterion::Likelihood { window, tolerance }) => {
                if window == 0 || !(tolerance >= 0.0) {
                    return Err(SamplerError::InvalidArgument(format!(
                        "likelihood plateau needs window > 0 and tolerance >= 0, got {} and {}",
                        window, tolerance
                    )));
                }
            }
            Some(PlateauCriterion::ChangeRate { window, threshold }) => {
                if window == 0 || !(threshold >= 0.0) {
                    return Err(SamplerError::InvalidArgument(format!(
                        "change-rate plateau needs window > 0 and threshold >= 0, got {} and {}",
                        window, threshold
                    )));
                }
            }
            None => {}
        }
        Ok(())
    }
}

/// Per-sweep diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRecord {
    /// 1-based sweep number within the run
    pub sweep: usize,
    /// Only computed when the policy tracks the likelihood
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_likelihood: Option<f64>,
    /// Fraction of tokens whose topic changed
    pub change_rate: f64,
}

/// Outcome of a sampling run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub sweeps: usize,
    pub reason: TerminationReason,
    pub log_likelihood: f64,
    pub change_rate: f64,
    pub history: Vec<SweepRecord>,
}

/// Applies a [`ConvergencePolicy`] to the sweep history of one run.
#[derive(Debug)]
pub(crate) struct ConvergenceTracker<'p> {
    policy: &'p ConvergencePolicy,
    history: Vec<SweepRecord>,
}

impl<'p> ConvergenceTracker<'p> {
    pub(crate) fn new(policy: &'p ConvergencePolicy) -> Self {
        Self {
            policy,
            history: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, record: SweepRecord) {
        self.history.push(record);
    }

    pub(crate) fn history(&self) -> &[SweepRecord] {
        &self.history
    }

    pub(crate) fn into_history(self) -> Vec<SweepRecord> {
        self.history
    }

    /// Reason to stop after the latest recorded sweep, if any.
    pub(crate) fn check(&self) -> Option<TerminationReason> {
        let sweeps = self.history.len();
        let sampled = self.history.get(self.policy.burn_in.min(sweeps)..).unwrap_or(&[]);

        match self.policy.plateau {
            Some(PlateauCriterion::Likelihood { window, tolerance }) if sampled.len() > window => {
                let old = sampled[sampled.len() - 1 - window].log_likelihood;
                let new = sampled[sampled.len() - 1].log_likelihood;
                if let (Some(old), Some(new)) = (old, new) {
                    let relative = (new - old).abs() / old.abs().max(f64::MIN_POSITIVE);
                    if relative < tolerance {
                        return Some(TerminationReason::LikelihoodPlateau);
                    }
                }
            }
            Some(PlateauCriterion::ChangeRate { window, threshold }) if sampled.len() >= window => {
                if sampled[sampled.len() - window..]
                    .iter()
                    .all(|r| r.change_rate < threshold)
                {
                    return Some(TerminationReason::ChangeRatePlateau);
                }
            }
            _ => {}
        }

        if sweeps >= self.policy.max_sweeps {
            return Some(TerminationReason::MaxSweeps);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sweep: usize, log_likelihood: f64, change_rate: f64) -> SweepRecord {
        SweepRecord {
            sweep,
            log_likelihood: Some(log_likelihood),
            change_rate,
        }
    }

    #[test]
    fn test_fixed_policy_runs_to_budget() {
        let policy = ConvergencePolicy::fixed(3);
        let mut tracker = ConvergenceTracker::new(&policy);

        tracker.record(record(1, -100.0, 0.0));
        tracker.record(record(2, -100.0, 0.0));
        assert_eq!(tracker.check(), None);
        tracker.record(record(3, -100.0, 0.0));
        assert_eq!(tracker.check(), Some(TerminationReason::MaxSweeps));
    }

    #[test]
    fn test_likelihood_plateau_after_burn_in() {
        let policy = ConvergencePolicy {
            max_sweeps: 100,
            burn_in: 2,
            plateau: Some(PlateauCriterion::Likelihood {
                window: 2,
                tolerance: 1e-3,
            }),
        };
        let mut tracker = ConvergenceTracker::new(&policy);

        // Flat during burn-in does not count
        for sweep in 1..=3 {
            tracker.record(record(sweep, -500.0, 0.5));
            assert_eq!(tracker.check(), None);
        }
        tracker.record(record(4, -500.01, 0.5));
        assert_eq!(tracker.check(), None);
        tracker.record(record(5, -500.02, 0.5));
        assert_eq!(tracker.check(), Some(TerminationReason::LikelihoodPlateau));
    }

    #[test]
    fn test_likelihood_still_moving() {
        let policy = ConvergencePolicy {
            max_sweeps: 10,
            burn_in: 0,
            plateau: Some(PlateauCriterion::Likelihood {
                window: 1,
                tolerance: 1e-4,
            }),
        };
        let mut tracker = ConvergenceTracker::new(&policy);
        tracker.record(record(1, -900.0, 0.5));
        tracker.record(record(2, -800.0, 0.5));
        assert_eq!(tracker.check(), None);
    }

    #[test]
    fn test_change_rate_plateau_needs_full_window() {
        let policy = ConvergencePolicy {
            max_sweeps: 100,
            burn_in: 0,
            plateau: Some(PlateauCriterion::ChangeRate {
                window: 3,
                threshold: 0.1,
            }),
        };
        let mut tracker = ConvergenceTracker::new(&policy);

        tracker.record(record(1, -1.0, 0.05));
        tracker.record(record(2, -1.0, 0.2));
        tracker.record(record(3, -1.0, 0.05));
        tracker.record(record(4, -1.0, 0.05));
        assert_eq!(tracker.check(), None);
        tracker.record(record(5, -1.0, 0.01));
        assert_eq!(tracker.check(), Some(TerminationReason::ChangeRatePlateau));
        assert_eq!(tracker.history().len(), 5);
    }

    #[test]
    fn test_validate() {
        assert!(ConvergencePolicy::fixed(0).validate().is_err());
        assert!(ConvergencePolicy::fixed(1).validate().is_ok());

        let policy = ConvergencePolicy {
            max_sweeps: 5,
            burn_in: 0,
            plateau: Some(PlateauCriterion::ChangeRate {
                window: 0,
                threshold: 0.1,
            }),
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_tracks_likelihood_only_for_likelihood_plateau() {
        assert!(!ConvergencePolicy::fixed(5).tracks_likelihood());

        let mut policy = ConvergencePolicy {
            max_sweeps: 5,
            burn_in: 0,
            plateau: Some(PlateauCriterion::ChangeRate {
                window: 2,
                threshold: 0.1,
            }),
        };
        assert!(!policy.tracks_likelihood());

        policy.plateau = Some(PlateauCriterion::Likelihood {
            window: 2,
            tolerance: 1e-3,
        });
        assert!(policy.tracks_likelihood());
    }

    #[test]
    fn test_from_settings() {
        let settings = SamplerSettings::default();
        let policy = ConvergencePolicy::from_settings(&settings);
        assert_eq!(policy.max_sweeps, settings.max_sweeps);
        assert_eq!(policy.burn_in, settings.burn_in);
        assert_eq!(policy.plateau, settings.plateau);
    }
}
