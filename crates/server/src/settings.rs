//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. built-in defaults
//! 2. `config/default.toml` (optional)
//! 3. `TOKENAGG__SECTION__KEY` environment variables
//! 4. the plain `PORT` and `REDIS_URL` variables

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::env;

use tokenagg_core::AppConfig;

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "TOKENAGG";

pub fn load() -> anyhow::Result<AppConfig> {
    let builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("refresh.seed_tracked"),
        );

    let mut config = build(builder)?;
    apply_overrides(&mut config, env::var("PORT").ok(), env::var("REDIS_URL").ok());

    Ok(config)
}

fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    Ok(builder.build()?.try_deserialize()?)
}

/// Apply `PORT` / `REDIS_URL`. An unparsable port is ignored.
pub fn apply_overrides(config: &mut AppConfig, port: Option<String>, redis_url: Option<String>) {
    if let Some(port) = port.and_then(|p| p.trim().parse().ok()) {
        config.server.port = port;
    }
    if let Some(url) = redis_url {
        config.cache.redis_url = url;
    }
}
