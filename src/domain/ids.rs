//! Domain identifier types with validation
//!
//! Newtype wrappers for the Azure identifiers Nimbus passes around. Each type
//! validates its format on construction so that malformed values are caught
//! when the configuration is loaded instead of mid-run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Azure subscription identifier (a GUID)
///
/// # Examples
///
/// ```
/// use nimbus::domain::ids::SubscriptionId;
/// use std::str::FromStr;
///
/// let id = SubscriptionId::from_str("6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af").unwrap();
/// assert_eq!(id.as_str(), "6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af");
/// assert!(SubscriptionId::from_str("not-a-guid").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Creates a new SubscriptionId, rejecting anything that is not a GUID
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Subscription ID cannot be empty".to_string());
        }
        uuid::Uuid::parse_str(trimmed)
            .map_err(|_| format!("Subscription ID must be a GUID, got: {trimmed}"))?;
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the subscription ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.0
    }
}

/// Blob container name
///
/// Azure container names are 3-63 characters of lowercase letters, digits
/// and hyphens. They must start and end with a letter or digit, and hyphens
/// may not be consecutive.
///
/// # Examples
///
/// ```
/// use nimbus::domain::ids::ContainerName;
///
/// assert!(ContainerName::new("inventory-exports").is_ok());
/// assert!(ContainerName::new("Inventory").is_err());
/// assert!(ContainerName::new("a--b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName(String);

impl ContainerName {
    /// Creates a new ContainerName, validating Azure naming rules
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();

        if name.len() < 3 || name.len() > 63 {
            return Err(format!(
                "Container name must be 3-63 characters long, got {} characters: {name}",
                name.len()
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(format!(
                "Container name may only contain lowercase letters, digits and hyphens: {name}"
            ));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(format!(
                "Container name must start and end with a letter or digit: {name}"
            ));
        }

        if name.contains("--") {
            return Err(format!(
                "Container name may not contain consecutive hyphens: {name}"
            ));
        }

        Ok(Self(name))
    }

    /// Returns the container name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContainerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContainerName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContainerName> for String {
    fn from(name: ContainerName) -> Self {
        name.0
    }
}

/// Name of an uploaded blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobName(String);

impl BlobName {
    /// Creates a new BlobName
    ///
    /// Blob names are 1-1024 characters and may not end with a dot or slash.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() || name.len() > 1024 {
            return Err(format!(
                "Blob name must be 1-1024 characters long, got {}",
                name.len()
            ));
        }
        if name.ends_with('.') || name.ends_with('/') {
            return Err(format!("Blob name may not end with '.' or '/': {name}"));
        }
        Ok(Self(name))
    }

    /// Builds a dated blob name: `{prefix}_{YYYYMMDD}.{extension}`
    ///
    /// # Examples
    ///
    /// ```
    /// use nimbus::domain::ids::BlobName;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 2, 6).unwrap();
    /// let name = BlobName::dated("azure_disks", date, "csv").unwrap();
    /// assert_eq!(name.as_str(), "azure_disks_20250206.csv");
    /// ```
    pub fn dated(prefix: &str, date: NaiveDate, extension: &str) -> Result<Self, String> {
        Self::new(format!("{prefix}_{}.{extension}", date.format("%Y%m%d")))
    }

    /// Returns the blob name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension of the blob name, lowercased
    pub fn extension(&self) -> Option<String> {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BlobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_id_valid() {
        let id = SubscriptionId::new("00000000-0000-0000-0000-000000000000").unwrap();
        assert_eq!(id.as_str(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_subscription_id_normalized() {
        let id = SubscriptionId::new(" 6A4EEA0D-60CF-4A28-B6CA-DED6C8C5A4AF ").unwrap();
        assert_eq!(id.as_str(), "6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af");
    }

    #[test]
    fn test_subscription_id_invalid() {
        assert!(SubscriptionId::new("").is_err());
        assert!(SubscriptionId::new("my-subscription").is_err());
    }

    #[test]
    fn test_subscription_id_serde() {
        let id: SubscriptionId =
            serde_json::from_str("\"6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af\"").unwrap();
        assert_eq!(id.as_str(), "6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af");
        assert!(serde_json::from_str::<SubscriptionId>("\"nope\"").is_err());
    }

    #[test]
    fn test_container_name_rules() {
        assert!(ContainerName::new("abc").is_ok());
        assert!(ContainerName::new("disk-exports-2025").is_ok());
        assert!(ContainerName::new("ab").is_err());
        assert!(ContainerName::new("a".repeat(64)).is_err());
        assert!(ContainerName::new("-abc").is_err());
        assert!(ContainerName::new("abc-").is_err());
        assert!(ContainerName::new("ab_c").is_err());
        assert!(ContainerName::new("ABC").is_err());
    }

    #[test]
    fn test_blob_name_dated() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let name = BlobName::dated(
            "placement_Score_6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af",
            date,
            "xlsx",
        )
        .unwrap();
        assert_eq!(
            name.as_str(),
            "placement_Score_6a4eea0d-60cf-4a28-b6ca-ded6c8c5a4af_20241231.xlsx"
        );
        assert_eq!(name.extension().as_deref(), Some("xlsx"));
    }

    #[test]
    fn test_blob_name_invalid() {
        assert!(BlobName::new("").is_err());
        assert!(BlobName::new("folder/").is_err());
        assert!(BlobName::new("file.").is_err());
    }
}
