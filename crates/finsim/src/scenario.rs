//! Scenario files
//!
//! Scenarios are YAML documents in the shape of [`ScenarioConfig`]. Since
//! YAML is a superset of JSON, JSON scenario files load as well.

use std::fs;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use finsim_core::ScenarioConfig;

pub fn parse_scenario(yaml: &str) -> Result<ScenarioConfig, serde_saphyr::Error> {
    serde_saphyr::from_str(yaml)
}

pub fn load_scenario(path: &Path) -> color_eyre::Result<ScenarioConfig> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read scenario {}", path.display()))?;
    let config = parse_scenario(&content)
        .wrap_err_with(|| format!("failed to parse scenario {}", path.display()))?;
    config
        .validate()
        .wrap_err_with(|| format!("invalid scenario {}", path.display()))?;
    Ok(config)
}
