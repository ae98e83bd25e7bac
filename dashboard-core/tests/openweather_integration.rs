//! Integration tests for OpenWeatherClient using wiremock.

use dashboard_core::{
    Units, WeatherApi,
    provider::openweather::OpenWeatherClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn one_call_body() -> serde_json::Value {
    serde_json::json!({
        "lat": 52.52,
        "lon": 13.41,
        "timezone": "Europe/Berlin",
        "timezone_offset": 7200,
        "current": {
            "dt": 1_700_000_000,
            "sunrise": 1_699_990_000,
            "sunset": 1_700_020_000,
            "temp": 14.2,
            "feels_like": 13.1,
            "pressure": 1015,
            "humidity": 68,
            "uvi": 1.3,
            "clouds": 40,
            "visibility": 10000,
            "wind_speed": 4.1,
            "wind_deg": 250,
            "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" }]
        },
        "daily": [{
            "dt": 1_700_000_000,
            "temp": { "day": 14.0, "min": 8.0, "max": 16.0, "night": 9.0, "eve": 12.0, "morn": 8.5 },
            "humidity": 70,
            "wind_speed": 5.0,
            "pop": 0.2,
            "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }]
        }]
    })
}

#[tokio::test]
async fn test_one_call_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .and(query_param("lat", "52.52"))
        .and(query_param("lon", "13.41"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_call_body()))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    let weather = client.current_and_forecast(52.52, 13.41, Some(Units::Metric)).await.unwrap();

    assert_eq!(weather.timezone, "Europe/Berlin");
    assert_eq!(weather.current.humidity, 68);
    assert_eq!(weather.current.weather[0].description, "scattered clouds");
    assert_eq!(weather.daily.len(), 1);
    assert_eq!(weather.daily[0].temp.max, 16.0);
}

#[tokio::test]
async fn test_one_call_without_units_omits_parameter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_call_body()))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    client.current_and_forecast(52.52, 13.41, None).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].url.query_pairs().any(|(k, _)| k == "units"));
}

#[tokio::test]
async fn test_one_call_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key."
        })))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("BAD".into(), mock_server.uri());
    let err = client.current_and_forecast(0.0, 0.0, None).await.unwrap_err().to_string();

    assert!(err.contains("401"), "Error should mention 401 status: {}", err);
    assert!(err.contains("Invalid API key"), "Error should carry the body: {}", err);
}

#[tokio::test]
async fn test_one_call_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    let err = client.current_and_forecast(0.0, 0.0, None).await.unwrap_err();

    assert!(err.to_string().contains("Failed to parse OpenWeather one call JSON"));
}

#[tokio::test]
async fn test_air_pollution_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/air_pollution"))
        .and(query_param("lat", "50"))
        .and(query_param("lon", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "coord": { "lon": 50.0, "lat": 50.0 },
            "list": [{
                "dt": 1_605_182_400,
                "main": { "aqi": 1 },
                "components": {
                    "co": 201.94, "no": 0.02, "no2": 0.77, "o3": 68.66,
                    "so2": 0.64, "pm2_5": 0.5, "pm10": 0.54, "nh3": 0.12
                }
            }]
        })))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    let air = client.air_pollution(50.0, 50.0).await.unwrap();

    let latest = air.latest().unwrap();
    assert_eq!(latest.main.aqi, 1);
    assert_eq!(latest.components.pm2_5, 0.5);
}

#[tokio::test]
async fn test_reverse_geocode_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "City of London", "lat": 51.51, "lon": -0.09, "country": "GB", "state": "England" },
            { "name": "London", "lat": 51.50, "lon": -0.12, "country": "GB" }
        ])))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    let names = client.reverse_geocode(51.51, -0.09).await.unwrap();

    assert_eq!(names.len(), 2);
    assert_eq!(names[0].display_name(), "City of London, England, GB");
    assert!(names[1].state.is_none());
}

#[tokio::test]
async fn test_reverse_geocode_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let client = OpenWeatherClient::with_base_url("KEY".into(), mock_server.uri());
    assert!(client.reverse_geocode(0.0, 0.0).await.unwrap().is_empty());
}
