//! Shared configuration and error types for the epsilon-greedy bandit
//! simulation.

pub mod config;
pub mod error;

pub use self::config::{AppConfig, ExperimentConfig, ReportConfig};
pub use self::error::{BanditError, BanditResult};
