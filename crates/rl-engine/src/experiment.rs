//! Epsilon-greedy trial loop over a fixed set of Bernoulli arms.

use bandit_core::{BanditResult, ExperimentConfig};
use rand::Rng;
use serde::Serialize;
use tracing::{info, trace};

use crate::arm::Arm;
use crate::summary::{ExperimentSummary, WinRateCurve};

/// Which branch of the policy picked the arm for a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Explore,
    Exploit,
}

/// Record of one completed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub index: usize,
    pub decision: Decision,
    pub arm: usize,
    pub outcome: u8,
    /// Whether `arm` is the true-optimal arm. Diagnostic only.
    pub optimal: bool,
}

/// Index of the largest value, lowest index on ties. `None` when empty.
pub fn argmax<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.into_iter().enumerate() {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// A run in progress. Build with [`Experiment::new`], drive with
/// [`Experiment::step`] or [`Experiment::run`].
#[derive(Debug, Clone)]
pub struct Experiment {
    arms: Vec<Arm>,
    epsilon: f64,
    num_trials: usize,
    optimal_arm: usize,
    rewards: Vec<u8>,
    explore_count: u64,
    exploit_count: u64,
    optimal_selection_count: u64,
}

impl Experiment {
    /// Validate `config` and set up one arm per configured probability.
    pub fn new(config: &ExperimentConfig) -> BanditResult<Self> {
        let num_trials = config.validate()?;
        let arms: Vec<Arm> = config
            .arm_probabilities
            .iter()
            .copied()
            .map(Arm::new)
            .collect();
        // validate() guarantees at least one arm
        let optimal_arm = argmax(arms.iter().map(Arm::true_probability)).unwrap_or(0);

        info!(
            arms = arms.len(),
            num_trials,
            epsilon = config.epsilon,
            optimal_arm,
            "Experiment initialized"
        );

        Ok(Self {
            arms,
            epsilon: config.epsilon,
            num_trials,
            optimal_arm,
            rewards: Vec::with_capacity(num_trials),
            explore_count: 0,
            exploit_count: 0,
            optimal_selection_count: 0,
        })
    }

    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn optimal_arm_index(&self) -> usize {
        self.optimal_arm
    }

    pub fn num_trials(&self) -> usize {
        self.num_trials
    }

    pub fn trials_run(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_finished(&self) -> bool {
        self.rewards.len() >= self.num_trials
    }

    /// Run the next trial. Returns `None` once all trials have run.
    ///
    /// Random draws happen in a fixed order: the epsilon test, the arm index
    /// (exploration only), then the pull.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Trial> {
        if self.is_finished() {
            return None;
        }
        let index = self.rewards.len();

        let (decision, arm) = if rng.gen::<f64>() < self.epsilon {
            self.explore_count += 1;
            (Decision::Explore, rng.gen_range(0..self.arms.len()))
        } else {
            self.exploit_count += 1;
            let best = argmax(self.arms.iter().map(Arm::estimate)).unwrap_or(0);
            (Decision::Exploit, best)
        };

        let optimal = arm == self.optimal_arm;
        if optimal {
            self.optimal_selection_count += 1;
        }

        let outcome = self.arms[arm].pull(rng);
        self.rewards.push(outcome);
        self.arms[arm].update(outcome);

        trace!(trial = index, ?decision, arm, outcome, "Trial complete");

        Some(Trial {
            index,
            decision,
            arm,
            outcome,
            optimal,
        })
    }

    /// Run every remaining trial and hand back the finished run.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> ExperimentOutcome {
        while self.step(rng).is_some() {}

        let outcome = ExperimentOutcome {
            arms: self.arms,
            epsilon: self.epsilon,
            optimal_arm: self.optimal_arm,
            rewards: self.rewards,
            explore_count: self.explore_count,
            exploit_count: self.exploit_count,
            optimal_selection_count: self.optimal_selection_count,
        };

        info!(
            num_trials = outcome.num_trials(),
            total_reward = outcome.total_reward(),
            explored = outcome.explore_count,
            exploited = outcome.exploit_count,
            optimal_selections = outcome.optimal_selection_count,
            "Experiment complete"
        );

        outcome
    }
}

/// A finished run: final arm state, per-trial rewards and counters.
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    arms: Vec<Arm>,
    epsilon: f64,
    optimal_arm: usize,
    rewards: Vec<u8>,
    explore_count: u64,
    exploit_count: u64,
    optimal_selection_count: u64,
}

impl ExperimentOutcome {
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn optimal_arm_index(&self) -> usize {
        self.optimal_arm
    }

    /// True win rate of the optimal arm; the reference line for the curve.
    pub fn best_true_probability(&self) -> f64 {
        self.arms[self.optimal_arm].true_probability()
    }

    /// Outcome of each trial in order, each 0 or 1.
    pub fn rewards(&self) -> &[u8] {
        &self.rewards
    }

    pub fn num_trials(&self) -> usize {
        self.rewards.len()
    }

    pub fn total_reward(&self) -> u64 {
        self.rewards.iter().map(|&r| u64::from(r)).sum()
    }

    /// Overall win rate, or `None` when no trials ran.
    pub fn win_rate(&self) -> Option<f64> {
        match self.num_trials() {
            0 => None,
            n => Some(self.total_reward() as f64 / n as f64),
        }
    }

    pub fn explore_count(&self) -> u64 {
        self.explore_count
    }

    pub fn exploit_count(&self) -> u64 {
        self.exploit_count
    }

    pub fn optimal_selection_count(&self) -> u64 {
        self.optimal_selection_count
    }

    /// Expected reward lost against always pulling the optimal arm, given
    /// how often each arm was actually chosen.
    pub fn expected_regret(&self) -> f64 {
        let best = self.best_true_probability() * self.num_trials() as f64;
        let earned: f64 = self
            .arms
            .iter()
            .map(|arm| arm.sample_count() as f64 * arm.true_probability())
            .sum();
        best - earned
    }

    /// Running win rate after each trial.
    pub fn win_rate_curve(&self) -> WinRateCurve<'_> {
        WinRateCurve::new(&self.rewards)
    }

    pub fn summary(&self) -> ExperimentSummary {
        ExperimentSummary::from_outcome(self)
    }
}
