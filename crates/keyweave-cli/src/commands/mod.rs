pub mod caps;
pub mod check;
pub mod exec;

use std::path::Path;
use std::sync::Arc;

use keyweave_vm::{Config, MappingConfig};

/// Build the mapping config, optionally from a JSON file of global knobs.
pub fn load_config(path: Option<&Path>) -> Result<MappingConfig, String> {
    let Some(path) = path else {
        return Ok(MappingConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    let config = Config::from_json(&text)
        .map_err(|err| format!("cannot parse {}: {err}", path.display()))?;
    Ok(MappingConfig::new(Arc::new(config)))
}
