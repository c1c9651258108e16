//! Placement Score REST wire models

use crate::adapters::resource_graph::Record;
use crate::config::PlacementConfig;
use serde::{Deserialize, Serialize};

/// Request payload for `placementScores/regular/generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementScoreRequest {
    pub desired_locations: Vec<String>,
    pub desired_sizes: Vec<DesiredSize>,
    pub desired_count: u32,
    pub availability_zones: bool,
}

/// One VM SKU to score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredSize {
    pub sku: String,
}

impl PlacementScoreRequest {
    /// Build the fixed payload from configuration
    pub fn from_config(config: &PlacementConfig) -> Self {
        Self {
            desired_locations: config.desired_locations.clone(),
            desired_sizes: config
                .desired_sizes
                .iter()
                .map(|sku| DesiredSize { sku: sku.clone() })
                .collect(),
            desired_count: config.desired_count,
            availability_zones: config.availability_zones,
        }
    }
}

/// Response body
///
/// Only `placementScores` is interpreted; each score is kept as a raw record so
/// that fields added by newer API versions flow through to the spreadsheet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementScoreResponse {
    #[serde(default)]
    pub placement_scores: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionId;
    use serde_json::json;

    #[test]
    fn test_request_from_config() {
        let sub = SubscriptionId::new("11111111-2222-3333-4444-555555555555").unwrap();
        let config = PlacementConfig::new(sub);
        let request = PlacementScoreRequest::from_config(&config);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "desiredLocations": ["westus", "eastus", "westcentralus"],
                "desiredSizes": [{"sku": "Standard_D2_v2"}, {"sku": "Standard_D8s_v3"}],
                "desiredCount": 10,
                "availabilityZones": true
            })
        );
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "desiredLocations": ["eastus"],
            "placementScores": [
                {"sku": "Standard_D2_v2", "region": "eastus", "availabilityZone": "1", "score": "High", "isQuotaAvailable": true}
            ]
        }"#;
        let response: PlacementScoreResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.placement_scores.len(), 1);
        let keys: Vec<&str> = response.placement_scores[0]
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec!["sku", "region", "availabilityZone", "score", "isQuotaAvailable"]
        );
    }

    #[test]
    fn test_response_without_scores() {
        let response: PlacementScoreResponse = serde_json::from_str("{}").unwrap();
        assert!(response.placement_scores.is_empty());
    }
}
