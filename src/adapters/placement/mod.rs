//! Azure Compute Placement Score integration

pub mod client;
pub mod models;

pub use client::{PlacementScoreClient, PlacementScoreSource};
pub use models::{DesiredSize, PlacementScoreRequest, PlacementScoreResponse};
