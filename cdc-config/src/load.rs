use serde::de::DeserializeOwned;
use std::path::Path;

/// Prefix for environment variable configuration overrides.
const ENV_PREFIX: &str = "APP";

/// Separator between environment variable prefix and key segments.
const ENV_PREFIX_SEPARATOR: &str = "_";

/// Separator for nested configuration keys in environment variables.
///
/// Example: `APP_BATCH__MAX_SIZE` sets the `batch.max_size` field.
const ENV_SEPARATOR: &str = "__";

/// Loads configuration from a YAML file with environment variable overrides.
///
/// Loads configuration in this order:
/// 1. The YAML file at `path`.
/// 2. Environment variable overrides prefixed with `APP`.
///
/// Nested keys use double underscores: `APP_BATCH__MAX_SIZE` → `batch.max_size`.
pub fn load_config<T>(path: &Path) -> Result<T, config::ConfigError>
where
    T: DeserializeOwned,
{
    let environment_source = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    let settings = config::Config::builder()
        // Add in settings from the configuration file.
        .add_source(config::File::from(path))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_DESTINATION=stdout` sets `TransferConfig { destination: Stdout }`.
        .add_source(environment_source)
        .build()?;

    settings.try_deserialize::<T>()
}
