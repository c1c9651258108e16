//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "nimbus.toml")]
    pub output: String,

    /// Include every option with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Nimbus configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG_ERROR);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with:");
                println!("     - STORAGE_ACCOUNT_URL and STORAGE_CONTAINER_NAME");
                println!("     - MANAGED_IDENTITY_CLIENT_ID (user-assigned identity only)");
                println!("  3. Validate configuration: nimbus validate-config");
                println!("  4. Try one job: nimbus run disk_inventory");
                println!("  5. Start the scheduler: nimbus serve");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Nimbus Configuration File
# Scheduled Azure inventory exports to Blob Storage

[application]
log_level = "info"
output_dir = "/tmp"

[identity]
auth_method = "managed_identity"
managed_identity_client_id = "${MANAGED_IDENTITY_CLIENT_ID}"

[storage]
account_url = "${STORAGE_ACCOUNT_URL}"
container_name = "${STORAGE_CONTAINER_NAME}"

[disk_inventory]
enabled = true
page_size = 1000
interval_seconds = 300

# [placement]
# subscription_id = "00000000-0000-0000-0000-000000000000"
# desired_locations = ["westus", "eastus", "westcentralus"]
# desired_sizes = ["Standard_D2_v2", "Standard_D8s_v3"]
# desired_count = 10
# interval_seconds = 3600

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Nimbus Configuration File
# Scheduled Azure inventory exports to Blob Storage
#
# Two jobs are available:
#   - disk_inventory:  Resource Graph managed-disk inventory -> CSV
#   - placement_score: Compute placement scores -> xlsx
#
# ${VAR} references are replaced with environment variables (a .env file is
# loaded first). Any value can also be overridden with NIMBUS_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Directory artifacts are written to before upload
output_dir = "/tmp"

# ============================================================================
# Identity
# ============================================================================
[identity]
# managed_identity | client_secret
auth_method = "managed_identity"

# Client ID of a user-assigned managed identity (omit for system-assigned)
managed_identity_client_id = "${MANAGED_IDENTITY_CLIENT_ID}"

# Required when auth_method = "client_secret"
# tenant_id = "${AZURE_TENANT_ID}"
# client_id = "${AZURE_CLIENT_ID}"
# client_secret = "${AZURE_CLIENT_SECRET}"

# ============================================================================
# Blob Storage
# ============================================================================
[storage]
# Blob endpoint of the storage account
account_url = "${STORAGE_ACCOUNT_URL}"

# Destination container (3-63 lowercase letters, digits and hyphens)
container_name = "${STORAGE_CONTAINER_NAME}"

# ============================================================================
# HTTP
# ============================================================================
[http]
management_endpoint = "https://management.azure.com"

# Per-request timeout
timeout_seconds = 60

[http.retry]
# Attempts per request, including the first
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Disk Inventory Job
# ============================================================================
[disk_inventory]
enabled = true

# Records per Resource Graph page (1-1000)
page_size = 1000

# counted: fetch ceil(total / page_size) pages
# continuation_token: follow $skipToken until the service stops returning one
pagination = "counted"

# Page cap for continuation_token pagination
max_pages = 10000

# Subscriptions to query (empty = all readable subscriptions)
subscriptions = []

# Blob is named {blob_prefix}_{YYYYMMDD}.csv
blob_prefix = "azure_disks"
file_name = "azure_disks.csv"

interval_seconds = 300

# ============================================================================
# Placement Score Job (remove the section to disable)
# ============================================================================
[placement]
enabled = true
subscription_id = "00000000-0000-0000-0000-000000000000"
api_version = "2024-06-01-preview"
location = "eastus"
desired_locations = ["westus", "eastus", "westcentralus"]
desired_sizes = ["Standard_D2_v2", "Standard_D8s_v3"]
desired_count = 10
availability_zones = true

# Blob is named {blob_prefix}_{YYYYMMDD}.xlsx
# (default: placement_Score_{subscription_id})
# blob_prefix = "placement_Score"
file_name = "placement_scores.xlsx"

interval_seconds = 3600

# ============================================================================
# Scheduler (serve)
# ============================================================================
[schedule]
# Run every enabled job once at startup
run_on_startup = true

# Ticks later than this are logged as past due
past_due_tolerance_ms = 1000

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "/var/log/nimbus"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "nimbus.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "nimbus.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generate_minimal_config() {
        let config = InitArgs::generate_minimal_config();
        assert!(config.contains("[application]"));
        assert!(config.contains("[storage]"));
        assert!(config.contains("[disk_inventory]"));
    }

    #[test]
    fn test_generated_configs_parse_once_variables_are_filled() {
        for template in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let filled = template
                .replace("${MANAGED_IDENTITY_CLIENT_ID}", "client-id")
                .replace("${STORAGE_ACCOUNT_URL}", "https://acct.blob.core.windows.net")
                .replace("${STORAGE_CONTAINER_NAME}", "exports");
            assert!(load_config_from_str(&filled).is_ok());
        }
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = InitArgs {
            output: file.path().to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG_ERROR);
    }
}
