// Configuration loading: optional file layered with PORTICO__* overrides

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::Path;
use tracing::{debug, info};

use portico_core::config::GatewayConfig;

pub const DEFAULT_CONFIG_PATH: &str = "~/.portico/portico.toml";
pub const ENV_PREFIX: &str = "PORTICO";
const ENV_SEPARATOR: &str = "__";

/// Load the gateway configuration
///
/// An explicit `path` must exist; the default path is optional. Format is
/// chosen from the extension (toml, json, yaml, ini, ...).
/// `PORTICO__SYS__DIAGNOSTIC=true` style variables override file values.
pub fn load(path: Option<&str>) -> Result<GatewayConfig> {
    let (raw, required) = match path {
        Some(p) => (p, true),
        None => (DEFAULT_CONFIG_PATH, false),
    };
    let expanded = shellexpand::tilde(raw).into_owned();

    if !required && !Path::new(&expanded).exists() {
        debug!(path = %expanded, "No config file, using defaults and environment");
    }

    let settings = Config::builder()
        .add_source(File::with_name(&expanded).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read config from {expanded}"))?;

    let gateway: GatewayConfig = settings
        .try_deserialize()
        .context("Invalid gateway configuration")?;
    let gateway = gateway.normalized();

    info!(
        path = %expanded,
        commands = gateway.cli.len(),
        cors_origins = !gateway.cors.is_empty(),
        diagnostic = gateway.sys.diagnostic,
        "Configuration loaded"
    );
    Ok(gateway)
}
