use std::fmt;
use std::path::Path;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{BanditError, BanditResult};

/// Root application configuration. Loaded from an optional TOML file layered
/// under environment variables with the prefix `EPSILON_GREEDY__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

// ─── Experiment Config ──────────────────────────────────────────────────
/// Parameters of one epsilon-greedy run.
///
/// `num_trials` is signed so that a negative count coming from a file or the
/// environment is rejected by [`ExperimentConfig::validate`] with a readable
/// message instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default = "default_num_trials")]
    pub num_trials: i64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(
        default = "default_arm_probabilities",
        deserialize_with = "deserialize_probabilities"
    )]
    pub arm_probabilities: Vec<f64>,
    /// Seed for the random source; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_num_trials() -> i64 {
    10_000
}
fn default_epsilon() -> f64 {
    0.1
}
fn default_arm_probabilities() -> Vec<f64> {
    vec![0.2, 0.5, 0.75]
}

/// Accept either a list of probabilities or a single bare number.
///
/// The environment source parses a value without a list separator as a
/// scalar, so a one-arm setting arrives as `0.5` rather than `[0.5]`.
fn deserialize_probabilities<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ProbabilitiesVisitor;

    impl<'de> Visitor<'de> for ProbabilitiesVisitor {
        type Value = Vec<f64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a probability or a list of probabilities")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(vec![value])
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(vec![value as f64])
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(vec![value as f64])
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .trim()
                .parse::<f64>()
                .map(|p| vec![p])
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut probabilities = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(p) = seq.next_element::<f64>()? {
                probabilities.push(p);
            }
            Ok(probabilities)
        }
    }

    deserializer.deserialize_any(ProbabilitiesVisitor)
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_trials: default_num_trials(),
            epsilon: default_epsilon(),
            arm_probabilities: default_arm_probabilities(),
            seed: None,
        }
    }
}

impl ExperimentConfig {
    /// Check every parameter and return the trial count as a `usize`.
    ///
    /// Out-of-range values are reported, never clamped.
    pub fn validate(&self) -> BanditResult<usize> {
        if self.arm_probabilities.is_empty() {
            return Err(BanditError::config(
                "arm_probabilities must contain at least one arm",
            ));
        }
        for (index, p) in self.arm_probabilities.iter().enumerate() {
            if !(0.0..=1.0).contains(p) {
                return Err(BanditError::config(format!(
                    "arm_probabilities[{index}] = {p} is outside [0, 1]"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BanditError::config(format!(
                "epsilon = {} is outside [0, 1]",
                self.epsilon
            )));
        }
        usize::try_from(self.num_trials).map_err(|_| {
            BanditError::config(format!(
                "num_trials = {} must be non-negative",
                self.num_trials
            ))
        })
    }
}

// ─── Report Config ──────────────────────────────────────────────────────
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Print the summary as JSON instead of text.
    #[serde(default)]
    pub json: bool,
    /// Draw the cumulative win-rate chart after the summary.
    #[serde(default)]
    pub plot: bool,
    #[serde(default = "default_plot_width")]
    pub plot_width: usize,
    #[serde(default = "default_plot_height")]
    pub plot_height: usize,
}

fn default_plot_width() -> usize {
    72
}
fn default_plot_height() -> usize {
    16
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json: false,
            plot: false,
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file, then environment
    /// variables (which take precedence).
    pub fn load(path: Option<&Path>) -> BanditResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading config file");
            builder = builder.add_source(config::File::from(path));
        }
        let config = builder.add_source(Self::environment()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a TOML document, ignoring the environment.
    pub fn from_toml_str(contents: &str) -> BanditResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("EPSILON_GREEDY")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("experiment.arm_probabilities")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn config_with(num_trials: i64, epsilon: f64, arms: Vec<f64>) -> ExperimentConfig {
        ExperimentConfig {
            num_trials,
            epsilon,
            arm_probabilities: arms,
            seed: Some(7),
        }
    }

    #[test]
    fn test_defaults_match_canonical_run() {
        let config = AppConfig::default();
        assert_eq!(config.experiment.num_trials, 10_000);
        assert_eq!(config.experiment.epsilon, 0.1);
        assert_eq!(config.experiment.arm_probabilities, vec![0.2, 0.5, 0.75]);
        assert!(config.experiment.seed.is_none());
        assert!(!config.report.json);
        assert!(!config.report.plot);
    }

    #[test]
    fn test_validate_accepts_boundaries() {
        let config = config_with(0, 1.0, vec![0.0, 1.0]);
        assert_eq!(config.validate().unwrap(), 0);

        let config = config_with(1000, 0.0, vec![0.5]);
        assert_eq!(config.validate().unwrap(), 1000);
    }

    #[test]
    fn test_validate_rejects_empty_arms() {
        let err = config_with(10, 0.1, vec![]).validate().unwrap_err();
        assert!(matches!(err, BanditError::Config(_)));
        assert!(err.to_string().contains("at least one arm"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_probability() {
        let err = config_with(10, 0.1, vec![0.2, 1.5]).validate().unwrap_err();
        assert!(err.to_string().contains("arm_probabilities[1]"));

        let err = config_with(10, 0.1, vec![-0.1]).validate().unwrap_err();
        assert!(err.to_string().contains("arm_probabilities[0]"));

        let err = config_with(10, 0.1, vec![f64::NAN]).validate().unwrap_err();
        assert!(matches!(err, BanditError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_epsilon() {
        let err = config_with(10, 1.01, vec![0.5]).validate().unwrap_err();
        assert!(err.to_string().contains("epsilon"));

        let err = config_with(10, -0.5, vec![0.5]).validate().unwrap_err();
        assert!(err.to_string().contains("epsilon"));
    }

    #[test]
    fn test_validate_rejects_negative_trials() {
        let err = config_with(-5, 0.1, vec![0.5]).validate().unwrap_err();
        assert!(err.to_string().contains("num_trials = -5"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = AppConfig::from_toml_str(
            r#"
            [experiment]
            num_trials = 500
            epsilon = 0.05
            arm_probabilities = [0.1, 0.9]
            seed = 42

            [report]
            plot = true
            "#,
        )
        .unwrap();

        assert_eq!(config.experiment.num_trials, 500);
        assert_eq!(config.experiment.epsilon, 0.05);
        assert_eq!(config.experiment.arm_probabilities, vec![0.1, 0.9]);
        assert_eq!(config.experiment.seed, Some(42));
        assert!(config.report.plot);
        assert_eq!(config.report.plot_width, 72);
    }

    #[test]
    fn test_from_toml_str_partial_uses_defaults() {
        let config = AppConfig::from_toml_str("[experiment]\nepsilon = 0.2\n")
            .unwrap();
        assert_eq!(config.experiment.epsilon, 0.2);
        assert_eq!(config.experiment.num_trials, 10_000);
        assert_eq!(config.experiment.arm_probabilities, vec![0.2, 0.5, 0.75]);
    }

    /// Sets environment variables for one test and removes them on drop.
    struct EnvGuard {
        keys: Vec<&'static str>,
    }

    impl EnvGuard {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self {
                keys: vars.iter().map(|(key, _)| *key).collect(),
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for key in &self.keys {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_single_bare_probability_in_toml() {
        let config = AppConfig::from_toml_str("[experiment]\narm_probabilities = 0.5\n")
            .unwrap();
        assert_eq!(config.experiment.arm_probabilities, vec![0.5]);
    }

    #[test]
    #[serial]
    fn test_load_from_environment() {
        let _env = EnvGuard::set(&[
            ("EPSILON_GREEDY__EXPERIMENT__NUM_TRIALS", "250"),
            ("EPSILON_GREEDY__EXPERIMENT__EPSILON", "0.25"),
            ("EPSILON_GREEDY__EXPERIMENT__ARM_PROBABILITIES", "0.1,0.9"),
            ("EPSILON_GREEDY__EXPERIMENT__SEED", "9"),
        ]);

        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.experiment.num_trials, 250);
        assert_eq!(config.experiment.epsilon, 0.25);
        assert_eq!(config.experiment.arm_probabilities, vec![0.1, 0.9]);
        assert_eq!(config.experiment.seed, Some(9));
    }

    #[test]
    #[serial]
    fn test_load_single_arm_from_environment() {
        let _env = EnvGuard::set(&[(
            "EPSILON_GREEDY__EXPERIMENT__ARM_PROBABILITIES",
            "0.5",
        )]);

        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.experiment.arm_probabilities, vec![0.5]);
        assert_eq!(config.experiment.validate().unwrap(), 10_000);
    }

    #[test]
    #[serial]
    fn test_load_whole_number_arm_from_environment() {
        let _env = EnvGuard::set(&[(
            "EPSILON_GREEDY__EXPERIMENT__ARM_PROBABILITIES",
            "1",
        )]);

        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.experiment.arm_probabilities, vec![1.0]);
    }

    #[test]
    #[serial]
    fn test_negative_trials_from_environment_reach_validation() {
        let _env = EnvGuard::set(&[("EPSILON_GREEDY__EXPERIMENT__NUM_TRIALS", "-3")]);

        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.experiment.num_trials, -3);
        let err = config.experiment.validate().unwrap_err();
        assert!(matches!(err, BanditError::Config(_)));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[experiment]
num_trials = 100
epsilon = 0.3
arm_probabilities = [0.4, 0.6]

[report]
json = true
"#,
        )
        .unwrap();
        file.flush().unwrap();

        let _env = EnvGuard::set(&[
            ("EPSILON_GREEDY__EXPERIMENT__NUM_TRIALS", "2000"),
            ("EPSILON_GREEDY__EXPERIMENT__ARM_PROBABILITIES", "0.7"),
        ]);

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.experiment.num_trials, 2000);
        assert_eq!(config.experiment.arm_probabilities, vec![0.7]);
        assert_eq!(config.experiment.epsilon, 0.3);
        assert!(config.report.json);
    }

    #[test]
    #[serial]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let err = AppConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, BanditError::ConfigLoad(_)));
    }
}
