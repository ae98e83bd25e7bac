//! Integration tests for GooglePlacesClient using wiremock.

use dashboard_core::{
    PlacesApi, PlacesError,
    places::{DETAIL_FIELDS, google::GooglePlacesClient},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_predictions_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .and(query_param("input", "Amster"))
        .and(query_param("key", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "predictions": [
                { "description": "Amsterdam, Netherlands", "place_id": "ChIJVXealLU_xkcRja_At0z9AGY" },
                { "description": "Amstelveen, Netherlands", "place_id": "ChIJ3dqlSzfhxUcR2Qn6Y5dRNDw" }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let predictions = client.predictions("Amster").await.unwrap();

    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].description, "Amsterdam, Netherlands");
    assert_eq!(predictions[0].place_id.as_deref(), Some("ChIJVXealLU_xkcRja_At0z9AGY"));
}

#[tokio::test]
async fn test_predictions_zero_results_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "predictions": []
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    assert!(client.predictions("qqqqqq").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_predictions_request_denied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "predictions": []
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("BAD".into(), mock_server.uri());
    let err = client.predictions("Amster").await.unwrap_err();

    match err {
        PlacesError::Status { status, message } => {
            assert_eq!(status, "REQUEST_DENIED");
            assert_eq!(message.as_deref(), Some("The provided API key is invalid."));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_predictions_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let err = client.predictions("Amster").await.unwrap_err();

    assert!(matches!(err, PlacesError::Http { status: 503, .. }));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_predictions_malformed_body_keeps_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/autocomplete/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ not json"))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let err = client.predictions("Amster").await.unwrap_err();

    assert!(matches!(err, PlacesError::Parse(_)));
    assert!(err.to_string().contains("Failed to parse places JSON"));
}

#[tokio::test]
async fn test_details_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "ChIJVXealLU_xkcRja_At0z9AGY"))
        .and(query_param("fields", "formatted_address,geometry/location"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": {
                "formatted_address": "Amsterdam, Netherlands",
                "geometry": { "location": { "lat": 52.3676, "lng": 4.9041 } }
            }
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let details = client.details("ChIJVXealLU_xkcRja_At0z9AGY", DETAIL_FIELDS).await.unwrap();

    assert_eq!(details.formatted_address, "Amsterdam, Netherlands");
    assert_eq!(details.location.lat, 52.3676);
    assert_eq!(details.location.lng, 4.9041);
}

#[tokio::test]
async fn test_details_missing_geometry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": { "formatted_address": "Somewhere" }
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let err = client.details("x", DETAIL_FIELDS).await.unwrap_err();

    assert!(matches!(err, PlacesError::Incomplete("geometry.location")));
}

#[tokio::test]
async fn test_details_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "NOT_FOUND"
        })))
        .mount(&mock_server)
        .await;

    let client = GooglePlacesClient::with_base_url("KEY".into(), mock_server.uri());
    let err = client.details("gone", DETAIL_FIELDS).await.unwrap_err();

    assert!(err.to_string().contains("NOT_FOUND"));
}
