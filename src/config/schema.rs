//! Configuration schema types
//!
//! This module defines the configuration structure for Nimbus. Every value a
//! job needs at run time lives here; jobs receive the validated config at
//! construction and never read the environment themselves.

use crate::config::SecretString;
use crate::domain::ids::{ContainerName, SubscriptionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Managed-disk inventory query run by the disk inventory job
///
/// Column renames happen in the query itself so the CSV header needs no
/// post-processing.
pub const DEFAULT_DISK_QUERY: &str = r#"Resources
| where type == 'microsoft.compute/disks'
| extend vmId = tostring(properties.ownerId)
| extend diskState = iif(isnull(vmId) or vmId == '', 'Unattached', 'Attached')
| extend isManagedDisk = iif(isnull(properties.osType), 'Unmanaged', 'Managed')
| project id, name, location, resourceGroup,
          diskSizeGb = properties.diskSizeGB,
          timeCreated = properties.timeCreated,
          diskState, isManagedDisk"#;

/// Largest `$top` the Resource Graph API accepts
pub const MAX_PAGE_SIZE: usize = 1000;

/// How the export loop decides it has fetched the last page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// Fetch `ceil(total / page_size)` pages, trusting the first page's total
    #[default]
    Counted,
    /// Keep fetching while the service returns a continuation token
    ContinuationToken,
}

impl fmt::Display for PaginationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaginationStrategy::Counted => write!(f, "counted"),
            PaginationStrategy::ContinuationToken => write!(f, "continuation_token"),
        }
    }
}

impl FromStr for PaginationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counted" => Ok(PaginationStrategy::Counted),
            "continuation_token" | "token" => Ok(PaginationStrategy::ContinuationToken),
            other => Err(format!(
                "Invalid pagination strategy '{other}'. Must be one of: counted, continuation_token"
            )),
        }
    }
}

/// Azure AD authentication method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Managed identity (user-assigned when a client ID is given)
    #[default]
    ManagedIdentity,
    /// App registration with a client secret
    ClientSecret,
}

/// Main Nimbus configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NimbusConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Identity used for Azure Resource Manager and Blob Storage
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Upload destination
    pub storage: StorageConfig,

    /// HTTP client settings shared by all adapters
    #[serde(default)]
    pub http: HttpConfig,

    /// Resource Graph disk inventory job
    #[serde(default)]
    pub disk_inventory: DiskInventoryConfig,

    /// Compute placement score job (disabled when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<PlacementConfig>,

    /// Timer settings for `serve`
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NimbusConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.identity.validate()?;
        self.storage.validate()?;
        self.http.validate()?;
        self.disk_inventory.validate()?;
        if let Some(ref placement) = self.placement {
            placement.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }

    /// Whether the placement score job is configured and enabled
    pub fn placement_enabled(&self) -> bool {
        self.placement.as_ref().is_some_and(|p| p.enabled)
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory where artifacts are written before upload
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: default_output_dir(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        if self.output_dir.trim().is_empty() {
            return Err("application.output_dir cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Azure AD identity configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Authentication method
    #[serde(default)]
    pub auth_method: AuthMethod,

    /// Client ID of a user-assigned managed identity
    ///
    /// When absent the system-assigned identity is used.
    #[serde(default)]
    pub managed_identity_client_id: Option<String>,

    /// Tenant ID (client_secret auth)
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// App registration client ID (client_secret auth)
    #[serde(default)]
    pub client_id: Option<String>,

    /// App registration client secret (client_secret auth)
    #[serde(default)]
    pub client_secret: Option<SecretString>,
}

impl IdentityConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        match self.auth_method {
            AuthMethod::ManagedIdentity => {
                if let Some(ref id) = self.managed_identity_client_id {
                    if id.trim().is_empty() {
                        return Err(
                            "identity.managed_identity_client_id cannot be empty when set"
                                .to_string(),
                        );
                    }
                }
            }
            AuthMethod::ClientSecret => {
                if self
                    .tenant_id
                    .as_deref()
                    .map_or(true, |s| s.trim().is_empty())
                {
                    return Err(
                        "identity.tenant_id is required when auth_method = 'client_secret'"
                            .to_string(),
                    );
                }
                if self
                    .client_id
                    .as_deref()
                    .map_or(true, |s| s.trim().is_empty())
                {
                    return Err(
                        "identity.client_id is required when auth_method = 'client_secret'"
                            .to_string(),
                    );
                }
                if self
                    .client_secret
                    .as_ref()
                    .map_or(true, |s| s.expose_secret().is_blank())
                {
                    return Err(
                        "identity.client_secret is required when auth_method = 'client_secret'"
                            .to_string(),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Blob Storage destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage account blob endpoint, e.g. `https://account.blob.core.windows.net`
    pub account_url: String,

    /// Destination container
    pub container_name: ContainerName,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.account_url.is_empty() {
            return Err("storage.account_url cannot be empty".to_string());
        }
        let url = url::Url::parse(&self.account_url)
            .map_err(|e| format!("storage.account_url is not a valid URL: {e}"))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(format!(
                "storage.account_url must be an http(s) URL, got scheme '{}'",
                url.scheme()
            ));
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("http.retry.max_retries must be at least 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("http.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("http.retry.initial_delay_ms cannot exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Azure Resource Manager endpoint
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            management_endpoint: default_management_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.management_endpoint.starts_with("http://")
            && !self.management_endpoint.starts_with("https://")
        {
            return Err("http.management_endpoint must start with http:// or https://".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("http.timeout_seconds must be greater than 0".to_string());
        }
        self.retry.validate()
    }
}

/// Resource Graph disk inventory job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInventoryConfig {
    /// Run this job
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Kusto query sent to Resource Graph
    #[serde(default = "default_disk_query")]
    pub query: String,

    /// Records per page (`$top`)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Termination rule for the export loop
    #[serde(default)]
    pub pagination: PaginationStrategy,

    /// Upper bound on pages when following continuation tokens
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Subscriptions to query (empty means every subscription the identity can read)
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionId>,

    /// Blob name prefix; the blob is `{prefix}_{YYYYMMDD}.csv`
    #[serde(default = "default_disk_blob_prefix")]
    pub blob_prefix: String,

    /// Local file name inside `application.output_dir`
    #[serde(default = "default_disk_file_name")]
    pub file_name: String,

    /// Seconds between runs under `serve`
    #[serde(default = "default_disk_interval_seconds")]
    pub interval_seconds: u64,
}

impl Default for DiskInventoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            query: default_disk_query(),
            page_size: default_page_size(),
            pagination: PaginationStrategy::default(),
            max_pages: default_max_pages(),
            subscriptions: Vec::new(),
            blob_prefix: default_disk_blob_prefix(),
            file_name: default_disk_file_name(),
            interval_seconds: default_disk_interval_seconds(),
        }
    }
}

impl DiskInventoryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.query.trim().is_empty() {
            return Err("disk_inventory.query cannot be empty".to_string());
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "disk_inventory.page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            ));
        }
        if self.max_pages == 0 {
            return Err("disk_inventory.max_pages must be greater than 0".to_string());
        }
        if self.blob_prefix.trim().is_empty() {
            return Err("disk_inventory.blob_prefix cannot be empty".to_string());
        }
        validate_file_name("disk_inventory.file_name", &self.file_name)?;
        if self.interval_seconds == 0 {
            return Err("disk_inventory.interval_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Compute placement score job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Run this job
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Subscription the placement scores are generated for
    pub subscription_id: SubscriptionId,

    /// Microsoft.Compute API version
    #[serde(default = "default_placement_api_version")]
    pub api_version: String,

    /// Location segment of the `generate` endpoint
    #[serde(default = "default_placement_location")]
    pub location: String,

    /// Regions to score
    #[serde(default = "default_desired_locations")]
    pub desired_locations: Vec<String>,

    /// VM SKUs to score
    #[serde(default = "default_desired_sizes")]
    pub desired_sizes: Vec<String>,

    /// Number of VMs the score is computed for
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    /// Score per availability zone
    #[serde(default = "default_true")]
    pub availability_zones: bool,

    /// Blob name prefix (default `placement_Score_{subscription_id}`)
    #[serde(default)]
    pub blob_prefix: Option<String>,

    /// Local file name inside `application.output_dir`
    #[serde(default = "default_placement_file_name")]
    pub file_name: String,

    /// Seconds between runs under `serve`
    #[serde(default = "default_placement_interval_seconds")]
    pub interval_seconds: u64,
}

impl PlacementConfig {
    /// Creates a placement config with defaults for everything but the subscription
    pub fn new(subscription_id: SubscriptionId) -> Self {
        Self {
            enabled: true,
            subscription_id,
            api_version: default_placement_api_version(),
            location: default_placement_location(),
            desired_locations: default_desired_locations(),
            desired_sizes: default_desired_sizes(),
            desired_count: default_desired_count(),
            availability_zones: true,
            blob_prefix: None,
            file_name: default_placement_file_name(),
            interval_seconds: default_placement_interval_seconds(),
        }
    }

    /// Effective blob name prefix
    pub fn blob_prefix(&self) -> String {
        self.blob_prefix
            .clone()
            .unwrap_or_else(|| format!("placement_Score_{}", self.subscription_id))
    }

    fn validate(&self) -> Result<(), String> {
        if self.api_version.trim().is_empty() {
            return Err("placement.api_version cannot be empty".to_string());
        }
        if self.location.trim().is_empty() {
            return Err("placement.location cannot be empty".to_string());
        }
        if self.desired_locations.is_empty() {
            return Err("placement.desired_locations must contain at least one region".to_string());
        }
        if self.desired_sizes.is_empty() {
            return Err("placement.desired_sizes must contain at least one SKU".to_string());
        }
        if self.desired_locations.iter().any(|l| l.trim().is_empty())
            || self.desired_sizes.iter().any(|s| s.trim().is_empty())
        {
            return Err("placement desired locations and sizes cannot be blank".to_string());
        }
        if self.desired_count == 0 {
            return Err("placement.desired_count must be at least 1".to_string());
        }
        validate_file_name("placement.file_name", &self.file_name)?;
        if self.interval_seconds == 0 {
            return Err("placement.interval_seconds must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Timer configuration for `serve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Run every enabled job once immediately on startup
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Lateness beyond which a tick is reported as past due
    #[serde(default = "default_past_due_tolerance_ms")]
    pub past_due_tolerance_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_on_startup: true,
            past_due_tolerance_ms: default_past_due_tolerance_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }
        Ok(())
    }
}

fn validate_file_name(field: &str, name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!("{field} must be a bare file name, got '{name}'"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> String {
    std::env::temp_dir().to_string_lossy().to_string()
}

fn default_true() -> bool {
    true
}

fn default_management_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_disk_query() -> String {
    DEFAULT_DISK_QUERY.to_string()
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_max_pages() -> usize {
    10_000
}

fn default_disk_blob_prefix() -> String {
    "azure_disks".to_string()
}

fn default_disk_file_name() -> String {
    "azure_disks.csv".to_string()
}

fn default_disk_interval_seconds() -> u64 {
    300
}

fn default_placement_api_version() -> String {
    "2024-06-01-preview".to_string()
}

fn default_placement_location() -> String {
    "eastus".to_string()
}

fn default_desired_locations() -> Vec<String> {
    vec![
        "westus".to_string(),
        "eastus".to_string(),
        "westcentralus".to_string(),
    ]
}

fn default_desired_sizes() -> Vec<String> {
    vec!["Standard_D2_v2".to_string(), "Standard_D8s_v3".to_string()]
}

fn default_desired_count() -> u32 {
    10
}

fn default_placement_file_name() -> String {
    "placement_scores.xlsx".to_string()
}

fn default_placement_interval_seconds() -> u64 {
    3600
}

fn default_past_due_tolerance_ms() -> u64 {
    1000
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn minimal_config() -> NimbusConfig {
        NimbusConfig {
            application: ApplicationConfig::default(),
            identity: IdentityConfig::default(),
            storage: StorageConfig {
                account_url: "https://inventory.blob.core.windows.net".to_string(),
                container_name: ContainerName::new("exports").unwrap(),
            },
            http: HttpConfig::default(),
            disk_inventory: DiskInventoryConfig::default(),
            placement: None,
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_minimal_config_is_valid() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = minimal_config();
        config.application.log_level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_level"));
    }

    #[test]
    fn test_page_size_bounds() {
        let mut config = minimal_config();
        config.disk_inventory.page_size = 0;
        assert!(config.validate().is_err());

        config.disk_inventory.page_size = 1001;
        assert!(config.validate().is_err());

        config.disk_inventory.page_size = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_secret_requires_all_fields() {
        let mut config = minimal_config();
        config.identity.auth_method = AuthMethod::ClientSecret;
        config.identity.tenant_id = Some("tenant".to_string());
        config.identity.client_id = Some("client".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.contains("client_secret"));

        config.identity.client_secret = Some(secret_string("secret".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_url_must_parse() {
        let mut config = minimal_config();
        config.storage.account_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.storage.account_url = "ftp://inventory.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_placement_validation() {
        let sub = SubscriptionId::new("00000000-0000-0000-0000-000000000000").unwrap();
        let mut config = minimal_config();
        config.placement = Some(PlacementConfig::new(sub));
        assert!(config.validate().is_ok());
        assert!(config.placement_enabled());

        if let Some(ref mut placement) = config.placement {
            placement.desired_count = 0;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_placement_default_blob_prefix() {
        let sub = SubscriptionId::new("6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af").unwrap();
        let placement = PlacementConfig::new(sub);
        assert_eq!(
            placement.blob_prefix(),
            "placement_Score_6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af"
        );
    }

    #[test]
    fn test_file_name_must_be_bare() {
        let mut config = minimal_config();
        config.disk_inventory.file_name = "../escape.csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pagination_strategy_from_str() {
        assert_eq!(
            "counted".parse::<PaginationStrategy>().unwrap(),
            PaginationStrategy::Counted
        );
        assert_eq!(
            "CONTINUATION_TOKEN".parse::<PaginationStrategy>().unwrap(),
            PaginationStrategy::ContinuationToken
        );
        assert!("sometimes".parse::<PaginationStrategy>().is_err());
    }

    #[test]
    fn test_default_query_projects_disk_columns() {
        assert!(DEFAULT_DISK_QUERY.contains("microsoft.compute/disks"));
        assert!(DEFAULT_DISK_QUERY.contains("diskSizeGb = properties.diskSizeGB"));
    }
}
