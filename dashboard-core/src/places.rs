//! Place search: autocomplete predictions and place details.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::{PlaceDetails, Prediction};

pub mod google;

/// Fields requested when resolving a selected prediction.
pub const DETAIL_FIELDS: &[&str] = &["formatted_address", "geometry/location"];

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("Places request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Places request failed with HTTP status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Places service returned status {status}")]
    Status { status: String, message: Option<String> },
    #[error("Failed to parse places JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Places response is missing {0}")]
    Incomplete(&'static str),
}

#[async_trait]
pub trait PlacesApi: Send + Sync + Debug {
    /// Candidate places for free-form `input`. No match is an empty list.
    async fn predictions(&self, input: &str) -> Result<Vec<Prediction>, PlacesError>;

    async fn details(&self, place_id: &str, fields: &[&str]) -> Result<PlaceDetails, PlacesError>;
}
