use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::{LatLng, PlaceDetails, Prediction},
    provider::truncate_body,
};

use super::{PlacesApi, PlacesError};

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Google Places web service client.
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GooglePlacesClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, GOOGLE_MAPS_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, PlacesError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(PlacesError::Http { status: status.as_u16(), body: truncate_body(&body) });
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct GPrediction {
    description: String,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GAutocompleteResponse {
    #[serde(default)]
    predictions: Vec<GPrediction>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GLocation {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GGeometry {
    location: Option<GLocation>,
}

#[derive(Debug, Deserialize)]
struct GPlaceResult {
    formatted_address: Option<String>,
    geometry: Option<GGeometry>,
}

#[derive(Debug, Deserialize)]
struct GDetailsResponse {
    result: Option<GPlaceResult>,
    status: String,
    error_message: Option<String>,
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, PlacesError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(error = %e, body = %truncate_body(body), "Unparseable places response");
        PlacesError::from(e)
    })
}

#[async_trait]
impl PlacesApi for GooglePlacesClient {
    async fn predictions(&self, input: &str) -> Result<Vec<Prediction>, PlacesError> {
        let body = self.get("/maps/api/place/autocomplete/json", &[("input", input)]).await?;
        let parsed: GAutocompleteResponse = parse_json(&body)?;

        tracing::debug!(status = %parsed.status, count = parsed.predictions.len(), "Place predictions");

        match parsed.status.as_str() {
            STATUS_OK => Ok(parsed
                .predictions
                .into_iter()
                .map(|p| Prediction { description: p.description, place_id: p.place_id })
                .collect()),
            STATUS_ZERO_RESULTS => Ok(Vec::new()),
            _ => Err(PlacesError::Status { status: parsed.status, message: parsed.error_message }),
        }
    }

    async fn details(&self, place_id: &str, fields: &[&str]) -> Result<PlaceDetails, PlacesError> {
        let fields = fields.join(",");
        let body = self
            .get(
                "/maps/api/place/details/json",
                &[("place_id", place_id), ("fields", fields.as_str())],
            )
            .await?;
        let parsed: GDetailsResponse = parse_json(&body)?;

        tracing::debug!(status = %parsed.status, place_id, "Place details");

        if parsed.status != STATUS_OK {
            return Err(PlacesError::Status { status: parsed.status, message: parsed.error_message });
        }

        let result = parsed.result.ok_or(PlacesError::Incomplete("result"))?;
        let location = result
            .geometry
            .and_then(|g| g.location)
            .ok_or(PlacesError::Incomplete("geometry.location"))?;

        Ok(PlaceDetails {
            formatted_address: result.formatted_address.unwrap_or_default(),
            location: LatLng { lat: location.lat, lng: location.lng },
        })
    }
}
