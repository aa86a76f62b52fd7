//! Post-run reporting: the summary record and the cumulative win-rate curve.

use std::fmt;
use std::iter::FusedIterator;

use bandit_core::BanditResult;
use serde::Serialize;

use crate::experiment::ExperimentOutcome;

/// Cumulative win rate after each trial: `sum(rewards[..=i]) / (i + 1)`.
///
/// Borrowed from one run's rewards; yields exactly one value per trial.
#[derive(Debug, Clone)]
pub struct WinRateCurve<'a> {
    rewards: std::slice::Iter<'a, u8>,
    cumulative: u64,
    trials: u64,
}

impl<'a> WinRateCurve<'a> {
    pub fn new(rewards: &'a [u8]) -> Self {
        Self {
            rewards: rewards.iter(),
            cumulative: 0,
            trials: 0,
        }
    }
}

impl Iterator for WinRateCurve<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let reward = self.rewards.next()?;
        self.cumulative += u64::from(*reward);
        self.trials += 1;
        Some(self.cumulative as f64 / self.trials as f64)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rewards.size_hint()
    }
}

impl ExactSizeIterator for WinRateCurve<'_> {}

impl FusedIterator for WinRateCurve<'_> {}

#[derive(Debug, Clone, Serialize)]
pub struct ArmSummary {
    pub index: usize,
    pub true_probability: f64,
    pub estimate: f64,
    pub sample_count: u64,
}

/// Everything reported at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub optimal_arm_index: usize,
    pub arms: Vec<ArmSummary>,
    pub num_trials: usize,
    pub epsilon: f64,
    pub total_reward: u64,
    /// `None` when no trials ran.
    pub win_rate: Option<f64>,
    pub explore_count: u64,
    pub exploit_count: u64,
    pub optimal_selection_count: u64,
    pub expected_regret: f64,
}

impl ExperimentSummary {
    pub fn from_outcome(outcome: &ExperimentOutcome) -> Self {
        let arms = outcome
            .arms()
            .iter()
            .enumerate()
            .map(|(index, arm)| ArmSummary {
                index,
                true_probability: arm.true_probability(),
                estimate: arm.estimate(),
                sample_count: arm.sample_count(),
            })
            .collect();

        Self {
            optimal_arm_index: outcome.optimal_arm_index(),
            arms,
            num_trials: outcome.num_trials(),
            epsilon: outcome.epsilon(),
            total_reward: outcome.total_reward(),
            win_rate: outcome.win_rate(),
            explore_count: outcome.explore_count(),
            exploit_count: outcome.exploit_count(),
            optimal_selection_count: outcome.optimal_selection_count(),
            expected_regret: outcome.expected_regret(),
        }
    }

    pub fn to_json(&self) -> BanditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "optimal arm: {}", self.optimal_arm_index)?;
        for arm in &self.arms {
            writeln!(
                f,
                "arm {} mean estimate: {:.4} (pulled {} times)",
                arm.index, arm.estimate, arm.sample_count
            )?;
        }
        writeln!(f, "total reward earned: {}", self.total_reward)?;
        match self.win_rate {
            Some(rate) => writeln!(f, "overall win rate: {rate:.4}")?,
            None => writeln!(f, "overall win rate: no trials run")?,
        }
        writeln!(f, "times explored: {}", self.explore_count)?;
        writeln!(f, "times exploited: {}", self.exploit_count)?;
        writeln!(
            f,
            "times selected optimal arm: {}",
            self.optimal_selection_count
        )?;
        write!(f, "expected regret: {:.2}", self.expected_regret)
    }
}
