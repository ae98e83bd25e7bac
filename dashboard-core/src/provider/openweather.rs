use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::model::{AirPollutionResponse, OneCallResponse, ReverseGeocoderResponse, Units};

use super::{WeatherApi, truncate_body};

pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
const REVERSE_GEOCODE_LIMIT: &str = "5";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENWEATHER_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        mut query: Vec<(&str, String)>,
        what: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        query.push(("appid", self.api_key.clone()));

        tracing::debug!(%url, "OpenWeather {what} request");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenWeather ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read OpenWeather {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse OpenWeather {what} JSON"))
    }
}

fn coords(lat: f64, lng: f64) -> Vec<(&'static str, String)> {
    vec![("lat", lat.to_string()), ("lon", lng.to_string())]
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_and_forecast(
        &self,
        lat: f64,
        lng: f64,
        units: Option<Units>,
    ) -> Result<OneCallResponse> {
        let mut query = coords(lat, lng);
        query.push(("exclude", "minutely".to_string()));
        if let Some(units) = units {
            query.push(("units", units.as_str().to_string()));
        }

        self.get_json("/data/2.5/onecall", query, "one call").await
    }

    async fn air_pollution(&self, lat: f64, lng: f64) -> Result<AirPollutionResponse> {
        self.get_json("/data/2.5/air_pollution", coords(lat, lng), "air pollution")
            .await
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Vec<ReverseGeocoderResponse>> {
        let mut query = coords(lat, lng);
        query.push(("limit", REVERSE_GEOCODE_LIMIT.to_string()));

        self.get_json("/geo/1.0/reverse", query, "reverse geocoding").await
    }
}
