use crate::{
    Config,
    config::ProviderConfig,
    model::{AirPollutionResponse, OneCallResponse, ReverseGeocoderResponse, Units},
    places::{PlacesApi, google::GooglePlacesClient},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openweather;

/// External services the dashboard holds credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    GooglePlaces,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::GooglePlaces => "google-places",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::GooglePlaces]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "google-places" | "google" | "places" => Ok(ProviderId::GooglePlaces),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, google-places."
            )),
        }
    }
}

/// Weather, air-quality and reverse-geocoding reads keyed by coordinates.
///
/// Implementations do not retry or cache; transport and status errors are
/// returned as-is.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// Current conditions with hourly and daily forecast. `None` units leave
    /// the choice to the service default.
    async fn current_and_forecast(
        &self,
        lat: f64,
        lng: f64,
        units: Option<Units>,
    ) -> anyhow::Result<OneCallResponse>;

    async fn air_pollution(&self, lat: f64, lng: f64) -> anyhow::Result<AirPollutionResponse>;

    async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
    ) -> anyhow::Result<Vec<ReverseGeocoderResponse>>;
}

fn provider_config(id: ProviderId, config: &Config) -> anyhow::Result<&ProviderConfig> {
    config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-dashboard configure {id}` and enter your API key."
        )
    })
}

/// Construct the weather client from config.
pub fn weather_client_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherApi>> {
    let cfg = provider_config(ProviderId::OpenWeather, config)?;

    let client = match &cfg.base_url {
        Some(url) => OpenWeatherClient::with_base_url(cfg.api_key.clone(), url.clone()),
        None => OpenWeatherClient::new(cfg.api_key.clone()),
    };

    Ok(Arc::new(client))
}

/// Construct the place search client from config.
pub fn places_client_from_config(config: &Config) -> anyhow::Result<Arc<dyn PlacesApi>> {
    let cfg = provider_config(ProviderId::GooglePlaces, config)?;

    let client = match &cfg.base_url {
        Some(url) => GooglePlacesClient::with_base_url(cfg.api_key.clone(), url.clone()),
        None => GooglePlacesClient::new(cfg.api_key.clone()),
    };

    Ok(Arc::new(client))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
