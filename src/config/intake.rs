//! Interview engine configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::handlers::intake::EngineSettings;
use crate::domain::intake::{CoveragePolicy, EmergencyScreen};

/// Interview engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Upper bound on each oracle call, in seconds
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,

    /// Answers after which the interview is finalized
    #[serde(default = "default_max_patient_turns")]
    pub max_patient_turns: usize,

    /// How far the oracle's completion signal is trusted
    #[serde(default)]
    pub coverage_policy: CoveragePolicy,

    /// Screen answers for emergency language before consulting the oracle
    #[serde(default = "default_emergency_screening")]
    pub emergency_screening: bool,
}

impl IntakeConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Engine settings for this configuration, with the provider's temperature.
    pub fn engine_settings(&self, temperature: Option<f32>) -> EngineSettings {
        EngineSettings {
            oracle_timeout: self.oracle_timeout(),
            max_patient_turns: self.max_patient_turns,
            coverage_policy: self.coverage_policy,
            emergency_screen: if self.emergency_screening {
                EmergencyScreen::enabled()
            } else {
                EmergencyScreen::disabled()
            },
            temperature,
        }
    }

    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.oracle_timeout_secs == 0 || self.oracle_timeout_secs > 600 {
            return Err(ValidationError::InvalidOracleTimeout);
        }
        if self.max_patient_turns == 0 {
            return Err(ValidationError::InvalidTurnLimit);
        }
        Ok(())
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            oracle_timeout_secs: default_oracle_timeout(),
            max_patient_turns: default_max_patient_turns(),
            coverage_policy: CoveragePolicy::default(),
            emergency_screening: default_emergency_screening(),
        }
    }
}

fn default_oracle_timeout() -> u64 {
    60
}

fn default_max_patient_turns() -> usize {
    30
}

fn default_emergency_screening() -> bool {
    true
}
