//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Nimbus configuration file.

use super::{EXIT_CONFIG_ERROR, EXIT_OK};
use crate::config::{load_config, AuthMethod};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Output Directory: {}", config.application.output_dir);
        match config.identity.auth_method {
            AuthMethod::ManagedIdentity => match config.identity.managed_identity_client_id {
                Some(ref id) => println!("  Identity: user-assigned managed identity ({id})"),
                None => println!("  Identity: system-assigned managed identity"),
            },
            AuthMethod::ClientSecret => println!(
                "  Identity: client secret (client {})",
                config.identity.client_id.as_deref().unwrap_or("?")
            ),
        }
        println!("  Storage Account: {}", config.storage.account_url);
        println!("  Container: {}", config.storage.container_name);

        let disk = &config.disk_inventory;
        if disk.enabled {
            println!(
                "  Disk Inventory: every {}s, page size {}, {} pagination",
                disk.interval_seconds, disk.page_size, disk.pagination
            );
            if !disk.subscriptions.is_empty() {
                println!("    Subscriptions: {}", disk.subscriptions.len());
            }
        } else {
            println!("  Disk Inventory: disabled");
        }

        match config.placement {
            Some(ref placement) if placement.enabled => {
                println!(
                    "  Placement Score: every {}s, subscription {}",
                    placement.interval_seconds, placement.subscription_id
                );
                println!("    Locations: {:?}", placement.desired_locations);
                println!("    Sizes: {:?}", placement.desired_sizes);
                println!("    Desired Count: {}", placement.desired_count);
            }
            _ => println!("  Placement Score: disabled"),
        }
        println!();

        Ok(EXIT_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_validate_missing_file() {
        let args = ValidateArgs {};
        let code = args.execute("/nonexistent/nimbus.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[storage]
account_url = "https://acct.blob.core.windows.net"
container_name = "exports"
"#
        )
        .unwrap();

        let args = ValidateArgs {};
        let code = args
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_OK);
    }
}
