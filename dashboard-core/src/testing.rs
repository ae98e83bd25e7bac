//! Test doubles shared by the unit tests.

use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    model::{
        AirPollutionResponse, Coord, CurrentWeather, LatLng, OneCallResponse, PlaceDetails,
        Prediction, ReverseGeocoderResponse, Units,
    },
    notify::Notifier,
    places::{PlacesApi, PlacesError},
    provider::WeatherApi,
};

#[derive(Debug, Default)]
pub struct RecordingWeather {
    calls: Mutex<Vec<String>>,
}

impl RecordingWeather {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WeatherApi for RecordingWeather {
    async fn current_and_forecast(
        &self,
        lat: f64,
        lng: f64,
        units: Option<Units>,
    ) -> Result<OneCallResponse> {
        self.calls.lock().push(format!("weather {lat} {lng} {units:?}"));
        Ok(OneCallResponse {
            lat,
            lon: lng,
            timezone: "UTC".into(),
            timezone_offset: 0,
            current: CurrentWeather {
                dt: 0,
                sunrise: None,
                sunset: None,
                temp: 20.0,
                feels_like: 19.0,
                pressure: 1013,
                humidity: 50,
                uvi: None,
                clouds: None,
                visibility: None,
                wind_speed: 1.0,
                wind_deg: None,
                weather: vec![],
            },
            hourly: vec![],
            daily: vec![],
            alerts: vec![],
        })
    }

    async fn air_pollution(&self, lat: f64, lng: f64) -> Result<AirPollutionResponse> {
        self.calls.lock().push(format!("air {lat} {lng}"));
        Ok(AirPollutionResponse { coord: Coord { lat, lon: lng }, list: vec![] })
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Vec<ReverseGeocoderResponse>> {
        self.calls.lock().push(format!("reverse {lat} {lng}"));
        Ok(vec![ReverseGeocoderResponse {
            name: "Lisbon".into(),
            lat,
            lon: lng,
            country: "PT".into(),
            state: None,
        }])
    }
}

/// Canned answer for one autocomplete input.
#[derive(Debug, Clone)]
pub enum Reply {
    Found(Vec<Prediction>),
    Failed,
}

#[derive(Debug, Default)]
pub struct ScriptedPlaces {
    replies: Mutex<HashMap<String, (Reply, Duration)>>,
    details: Mutex<HashMap<String, (PlaceDetails, Duration)>>,
    prediction_calls: Mutex<Vec<String>>,
    detail_calls: Mutex<Vec<String>>,
}

impl ScriptedPlaces {
    pub fn reply(&self, input: &str, reply: Reply) -> &Self {
        self.reply_after(input, reply, Duration::ZERO)
    }

    pub fn reply_after(&self, input: &str, reply: Reply, delay: Duration) -> &Self {
        self.replies.lock().insert(input.to_string(), (reply, delay));
        self
    }

    pub fn place(&self, place_id: &str, address: &str, lat: f64, lng: f64) -> &Self {
        self.place_after(place_id, address, lat, lng, Duration::ZERO)
    }

    pub fn place_after(
        &self,
        place_id: &str,
        address: &str,
        lat: f64,
        lng: f64,
        delay: Duration,
    ) -> &Self {
        let details =
            PlaceDetails { formatted_address: address.to_string(), location: LatLng { lat, lng } };
        self.details.lock().insert(place_id.to_string(), (details, delay));
        self
    }

    pub fn prediction_calls(&self) -> Vec<String> {
        self.prediction_calls.lock().clone()
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().clone()
    }
}

#[async_trait]
impl PlacesApi for ScriptedPlaces {
    async fn predictions(&self, input: &str) -> Result<Vec<Prediction>, PlacesError> {
        self.prediction_calls.lock().push(input.to_string());

        let (reply, delay) = self
            .replies
            .lock()
            .get(input)
            .cloned()
            .unwrap_or((Reply::Found(vec![]), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Found(list) => Ok(list),
            Reply::Failed => Err(PlacesError::Status {
                status: "REQUEST_DENIED".into(),
                message: None,
            }),
        }
    }

    async fn details(&self, place_id: &str, _fields: &[&str]) -> Result<PlaceDetails, PlacesError> {
        self.detail_calls.lock().push(place_id.to_string());

        let Some((details, delay)) = self.details.lock().get(place_id).cloned() else {
            return Err(PlacesError::Status { status: "NOT_FOUND".into(), message: None });
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(details)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
