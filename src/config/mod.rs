mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    GatewaySettings, LogSettings, PartialSettings, ServerSettings, Settings,
};

/// Prefix of environment variables read by `load_config`,
/// e.g. `PRESENCEHUB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "PRESENCEHUB";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merged(partial))
}
