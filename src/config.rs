//! Layered `ClientConfig` loading.
//!
//! | Layer | Source |
//! |-------|--------|
//! | 1 | built-in defaults (`ClientConfig::default`) |
//! | 2 | optional TOML file (`--config arena.toml`) |
//! | 3 | environment, `ARENA_` prefix (`ARENA_PICKUP_RADIUS=40`) |
//!
//! CLI flags are applied on top by the binary.

use std::path::Path;

use ::config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::error::ConfigError;
use crate::types::ClientConfig;

pub const ENV_PREFIX: &str = "ARENA";

/// Load from an optional file plus the process environment.
pub fn load(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    finish(builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)))
}

/// Load from TOML text only (no environment layer).
pub fn from_toml(text: &str) -> Result<ClientConfig, ConfigError> {
    finish(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
}

fn finish(
    builder: ConfigBuilder<::config::builder::DefaultState>,
) -> Result<ClientConfig, ConfigError> {
    let config: ClientConfig = builder.build()?.try_deserialize()?;
    validate(&config)?;
    Ok(config)
}

fn validate(c: &ClientConfig) -> Result<(), ConfigError> {
    if c.hotbar_capacity == 0 || c.inventory_capacity == 0 {
        return Err(ConfigError::Invalid(
            "hotbar_capacity and inventory_capacity must be at least 1".into(),
        ));
    }
    if c.frame_rate_hz.is_nan() || c.frame_rate_hz <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "frame_rate_hz must be positive (got {})",
            c.frame_rate_hz
        )));
    }
    if c.pickup_radius < 0.0 || c.map_size <= 0.0 {
        return Err(ConfigError::Invalid(
            "pickup_radius must be >= 0 and map_size > 0".into(),
        ));
    }
    Ok(())
}
