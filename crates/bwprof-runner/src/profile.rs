//! Monitor profiles loaded from YAML.
//!
//! ```yaml
//! log_level: 2
//! sampling:
//!   histogram: true
//!   interval_ms: 100
//! masters: [1, 4, 7]
//! histogram_buckets: [1024, 65536, 1048576]
//! enable: true
//! ```
//!
//! Every field is optional. Absent fields are not sent.

use std::path::Path;

use scmi_bwprof::{MAX_BUCKETS, MAX_MASTERS};
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Sampling section of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamplingProfile {
    /// Collect histograms instead of basic counters.
    #[serde(default)]
    pub histogram: bool,
    /// Sampling interval in milliseconds.
    pub interval_ms: u16,
}

/// A complete monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BwprofProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<SamplingProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masters: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram_buckets: Option<[u32; MAX_BUCKETS]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

impl BwprofProfile {
    /// Parse and validate a profile from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RunnerError> {
        let profile: BwprofProfile = serde_yaml::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check limits the wire records cannot express.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if let Some(masters) = &self.masters {
            if masters.len() > MAX_MASTERS {
                return Err(RunnerError::InvalidProfile(format!(
                    "masters lists {} ids, at most {} are supported",
                    masters.len(),
                    MAX_MASTERS
                )));
            }
        }
        Ok(())
    }

    /// Number of commands applying this profile sends.
    pub fn command_count(&self) -> usize {
        [
            self.log_level.is_some(),
            self.masters.is_some(),
            self.histogram_buckets.is_some(),
            self.sampling.is_some(),
            self.enable.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    /// Whether the profile sends nothing.
    pub fn is_empty(&self) -> bool {
        self.command_count() == 0
    }
}
