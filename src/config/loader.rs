//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{NimbusConfig, PaginationStrategy};
use super::secret_string;
use crate::domain::errors::NimbusError;
use crate::domain::ids::{ContainerName, SubscriptionId};
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`NimbusConfig`]
/// 4. Applies environment variable overrides (`NIMBUS_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`NimbusError::Configuration`] if the file cannot be read, a
/// referenced variable is unset, parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use nimbus::config::loader::load_config;
///
/// let config = load_config("nimbus.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<NimbusConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(NimbusError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        NimbusError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Loads configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn load_config_from_str(contents: &str) -> Result<NimbusConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: NimbusConfig = toml::from_str(&contents)
        .map_err(|e| NimbusError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        NimbusError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Every missing variable is reported in a
/// single error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(NimbusError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        NimbusError::Configuration(format!("Invalid value for {name}: '{value}'"))
    })
}

/// Applies environment variable overrides using the `NIMBUS_*` prefix
///
/// Variables follow the pattern `NIMBUS_<SECTION>_<KEY>`, for example
/// `NIMBUS_STORAGE_CONTAINER_NAME`. Unlike substitution, overrides with an
/// unparseable value are rejected.
fn apply_env_overrides(config: &mut NimbusConfig) -> Result<()> {
    // Application
    if let Ok(val) = std::env::var("NIMBUS_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("NIMBUS_APPLICATION_OUTPUT_DIR") {
        config.application.output_dir = val;
    }

    // Identity
    if let Ok(val) = std::env::var("NIMBUS_IDENTITY_MANAGED_IDENTITY_CLIENT_ID") {
        config.identity.managed_identity_client_id = Some(val);
    }
    if let Ok(val) = std::env::var("NIMBUS_IDENTITY_TENANT_ID") {
        config.identity.tenant_id = Some(val);
    }
    if let Ok(val) = std::env::var("NIMBUS_IDENTITY_CLIENT_ID") {
        config.identity.client_id = Some(val);
    }
    if let Ok(val) = std::env::var("NIMBUS_IDENTITY_CLIENT_SECRET") {
        config.identity.client_secret = Some(secret_string(val));
    }

    // Storage
    if let Ok(val) = std::env::var("NIMBUS_STORAGE_ACCOUNT_URL") {
        config.storage.account_url = val;
    }
    if let Ok(val) = std::env::var("NIMBUS_STORAGE_CONTAINER_NAME") {
        config.storage.container_name = ContainerName::new(val).map_err(|e| {
            NimbusError::Configuration(format!("NIMBUS_STORAGE_CONTAINER_NAME: {e}"))
        })?;
    }

    // HTTP
    if let Ok(val) = std::env::var("NIMBUS_HTTP_TIMEOUT_SECONDS") {
        config.http.timeout_seconds = parse_env("NIMBUS_HTTP_TIMEOUT_SECONDS", &val)?;
    }
    if let Ok(val) = std::env::var("NIMBUS_HTTP_RETRY_MAX_RETRIES") {
        config.http.retry.max_retries = parse_env("NIMBUS_HTTP_RETRY_MAX_RETRIES", &val)?;
    }

    // Disk inventory
    if let Ok(val) = std::env::var("NIMBUS_DISK_INVENTORY_ENABLED") {
        config.disk_inventory.enabled = parse_env("NIMBUS_DISK_INVENTORY_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("NIMBUS_DISK_INVENTORY_PAGE_SIZE") {
        config.disk_inventory.page_size = parse_env("NIMBUS_DISK_INVENTORY_PAGE_SIZE", &val)?;
    }
    if let Ok(val) = std::env::var("NIMBUS_DISK_INVENTORY_PAGINATION") {
        config.disk_inventory.pagination = val
            .parse::<PaginationStrategy>()
            .map_err(NimbusError::Configuration)?;
    }

    // Placement
    if let Some(ref mut placement) = config.placement {
        if let Ok(val) = std::env::var("NIMBUS_PLACEMENT_ENABLED") {
            placement.enabled = parse_env("NIMBUS_PLACEMENT_ENABLED", &val)?;
        }
        if let Ok(val) = std::env::var("NIMBUS_PLACEMENT_SUBSCRIPTION_ID") {
            placement.subscription_id = SubscriptionId::new(val).map_err(|e| {
                NimbusError::Configuration(format!("NIMBUS_PLACEMENT_SUBSCRIPTION_ID: {e}"))
            })?;
        }
        if let Ok(val) = std::env::var("NIMBUS_PLACEMENT_API_VERSION") {
            placement.api_version = val;
        }
        if let Ok(val) = std::env::var("NIMBUS_PLACEMENT_DESIRED_COUNT") {
            placement.desired_count = parse_env("NIMBUS_PLACEMENT_DESIRED_COUNT", &val)?;
        }
    }

    // Logging
    if let Ok(val) = std::env::var("NIMBUS_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("NIMBUS_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("NIMBUS_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
