//! Configuration loader for YAML files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::AppError;

use super::types::AppConfig;

/// Load configuration from a YAML file
///
/// Parses, applies environment overrides, and validates the configuration
/// rules. A missing file is a configuration error.
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    apply_env_overrides(&mut config);
    config.validate()?;

    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let mut config: AppConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::Config(format!("YAML parse error: {}", e)))?;

    apply_env_overrides(&mut config);
    config.validate()?;

    Ok(config)
}

/// Environment overrides applied after parsing
///
/// `GOMARKET_BASE` replaces the configured price API base URL.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(base) = std::env::var("GOMARKET_BASE") {
        if !base.trim().is_empty() {
            config.engine.gomarket_base = base;
        }
    }
}
