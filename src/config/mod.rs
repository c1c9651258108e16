//! Configuration management for Nimbus.
//!
//! Nimbus reads one TOML file per process, validates it eagerly and hands the
//! resulting [`NimbusConfig`] to each job at construction time.
//!
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `NIMBUS_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for optional settings
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! output_dir = "/tmp"
//!
//! [identity]
//! auth_method = "managed_identity"
//! managed_identity_client_id = "${MANAGED_IDENTITY_CLIENT_ID}"
//!
//! [storage]
//! account_url = "${STORAGE_ACCOUNT_URL}"
//! container_name = "${STORAGE_CONTAINER_NAME}"
//!
//! [disk_inventory]
//! page_size = 1000
//! interval_seconds = 300
//!
//! [placement]
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! desired_locations = ["westus", "eastus", "westcentralus"]
//! desired_sizes = ["Standard_D2_v2", "Standard_D8s_v3"]
//! desired_count = 10
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nimbus::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nimbus.toml")?;
//! println!("Uploading to container {}", config.storage.container_name);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, AuthMethod, DiskInventoryConfig, HttpConfig, IdentityConfig,
    LoggingConfig, NimbusConfig, PaginationStrategy, PlacementConfig, RetryConfig,
    ScheduleConfig, StorageConfig, MAX_PAGE_SIZE,
};
pub use secret::{secret_string, SecretString, SecretValue};
