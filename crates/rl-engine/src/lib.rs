//! Epsilon-greedy multi-armed bandit simulation: Bernoulli arms with running
//! win-rate estimates, the explore/exploit trial loop, and the end-of-run
//! summary with its cumulative win-rate curve.

pub mod arm;
pub mod experiment;
pub mod summary;

pub use arm::Arm;
pub use experiment::{argmax, Decision, Experiment, ExperimentOutcome, Trial};
pub use summary::{ArmSummary, ExperimentSummary, WinRateCurve};
