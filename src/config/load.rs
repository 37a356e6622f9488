use crate::config::{AgentConfig, ConfigError};
use std::fs;
use std::path::Path;

pub fn load_agent_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: AgentConfig =
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}
