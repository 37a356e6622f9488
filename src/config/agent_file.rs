use crate::config::ConfigError;
use crate::outputs::OutputType;
use crate::shared::ids::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The per-agent contract document. Parsed once per invocation and
/// immutable for the run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub id: AgentId,
    #[serde(default)]
    pub description: String,
    /// Glob allow-list consulted by path-sensitive output types only.
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default)]
    pub outputs: BTreeMap<OutputType, OutputTypeConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputTypeConfig {
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub sign: bool,
}

fn enabled_default() -> bool {
    true
}

impl Default for OutputTypeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max: None,
            sign: false,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (output_type, config) in &self.outputs {
            if config.max == Some(0) {
                return Err(ConfigError::Agent(format!(
                    "output `{output_type}` max must be at least 1"
                )));
            }
        }
        Ok(())
    }

    /// Enabled output types in deterministic order.
    pub fn enabled_types(&self) -> Vec<OutputType> {
        self.outputs
            .iter()
            .filter(|(_, config)| config.enabled)
            .map(|(output_type, _)| *output_type)
            .collect()
    }

    pub fn output_config(&self, output_type: OutputType) -> Option<&OutputTypeConfig> {
        self.outputs
            .get(&output_type)
            .filter(|config| config.enabled)
    }
}
