use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description used for the placeholder prediction shown when a search
/// yields nothing usable.
pub const NO_RECORDS_FOUND: &str = "No records found";

/// The geographic position currently considered "current".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, accuracy_meters: None, timestamp: Utc::now() }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// A candidate place returned by the autocomplete search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: Option<String>,
}

impl Prediction {
    pub fn new(description: impl Into<String>, place_id: impl Into<String>) -> Self {
        Self { description: description.into(), place_id: Some(place_id.into()) }
    }

    /// Sentinel entry: no place id, so selecting it never triggers a lookup.
    pub fn no_records() -> Self {
        Self { description: NO_RECORDS_FOUND.to_string(), place_id: None }
    }

    pub fn is_sentinel(&self) -> bool {
        self.place_id.is_none() && self.description == NO_RECORDS_FOUND
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Full details of a selected place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: String,
    pub location: LatLng,
}

/// Units of measurement accepted by the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Standard,
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Standard => "K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            _ => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: standard, metric, imperial."
            )),
        }
    }
}

// OpenWeather payloads. Kept close to the wire format; only the fields the
// dashboard reads are required.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub dt: i64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: f64,
    pub feels_like: f64,
    pub pressure: u32,
    pub humidity: u8,
    pub uvi: Option<f64>,
    pub clouds: Option<u8>,
    pub visibility: Option<u32>,
    pub wind_speed: f64,
    pub wind_deg: Option<u16>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pop: Option<f64>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTemperature {
    pub day: f64,
    pub min: f64,
    pub max: f64,
    pub night: f64,
    pub eve: f64,
    pub morn: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub dt: i64,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    pub temp: DailyTemperature,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pop: Option<f64>,
    pub uvi: Option<f64>,
    #[serde(default)]
    pub weather: Vec<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub sender_name: String,
    pub event: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
}

/// Current conditions plus hourly and daily forecast for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneCallResponse {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub timezone_offset: i64,
    pub current: CurrentWeather,
    #[serde(default)]
    pub hourly: Vec<HourlyWeather>,
    #[serde(default)]
    pub daily: Vec<DailyWeather>,
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityIndex {
    /// 1 (good) to 5 (very poor).
    pub aqi: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirComponents {
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollutionEntry {
    pub dt: i64,
    pub main: AirQualityIndex,
    pub components: AirComponents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollutionResponse {
    pub coord: Coord,
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

impl AirPollutionResponse {
    pub fn latest(&self) -> Option<&AirPollutionEntry> {
        self.list.iter().max_by_key(|e| e.dt)
    }
}

/// Qualitative label for an OpenWeather air quality index.
pub fn aqi_label(aqi: u8) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocoderResponse {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub state: Option<String>,
}

impl ReverseGeocoderResponse {
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) if !state.is_empty() && state != &self.name => {
                format!("{}, {}, {}", self.name, state, self.country)
            }
            _ => format!("{}, {}", self.name, self.country),
        }
    }
}
