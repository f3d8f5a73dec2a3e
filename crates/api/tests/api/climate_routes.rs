use crate::helpers::{spawn_app, MockClimateAccess};
use axum::{
    body::{to_bytes, Body},
    http::Request,
};
use climate_api::{Observation, Station, StationCount};
use hyper::Method;
use serde_json::{from_slice, json, Value};
use std::sync::Arc;
use time::{macros::date, Date};
use tower::ServiceExt;

fn observation(station: &str, date: Date, prcp: Option<f64>, tobs: f64) -> Observation {
    Observation {
        station_id: station.to_string(),
        date,
        precipitation: prcp,
        temperature: tobs,
    }
}

async fn get(test_app: &crate::helpers::TestApp, uri: &str) -> (hyper::StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn index_lists_available_routes() {
    let climate_db = MockClimateAccess::new();
    let test_app = spawn_app(Arc::new(climate_db)).await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = test_app
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let listing = String::from_utf8(body.to_vec()).unwrap();
    assert!(listing.contains("/api/v1.0/precipitation"));
    assert!(listing.contains("/api/v1.0/stations"));
    assert!(listing.contains("/api/v1.0/tobs"));
    assert!(listing.contains("/api/v1.0/placedate/{start}"));
    assert!(listing.contains("/api/v1.0/placedate/{start}/{end}"));
}

#[tokio::test]
async fn precipitation_returns_trailing_year_as_single_key_objects() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db
        .expect_observations_since()
        // Cutoff is exactly 365 days before the newest observation
        .withf(|cutoff| *cutoff == date!(2016 - 08 - 23))
        .times(1)
        .returning(|_| {
            Ok(vec![
                observation("USC00519281", date!(2016 - 08 - 24), Some(0.08), 77.0),
                observation("USC00514830", date!(2016 - 08 - 24), None, 80.0),
                observation("USC00519281", date!(2017 - 08 - 23), Some(0.45), 76.0),
            ])
        });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/precipitation").await;

    assert!(status.is_success());
    // One entry per row; duplicate dates are not merged and nulls survive
    assert_eq!(
        body,
        json!([
            { "2016-08-24": 0.08 },
            { "2016-08-24": null },
            { "2017-08-23": 0.45 },
        ])
    );
}

#[tokio::test]
async fn stations_returns_id_and_name_columns() {
    let mut climate_db = MockClimateAccess::new();

    climate_db.expect_stations_with_names().times(1).returning(|| {
        Ok(vec![
            Station {
                station_id: String::from("USC00514830"),
                name: String::from("KUALOA RANCH HEADQUARTERS 886.9, HI US"),
            },
            Station {
                station_id: String::from("USC00519281"),
                name: String::from("WAIHEE 837.5, HI US"),
            },
        ])
    });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/stations").await;

    assert!(status.is_success());
    assert_eq!(
        body,
        json!([
            { "ID": "USC00514830", "Station Name": "KUALOA RANCH HEADQUARTERS 886.9, HI US" },
            { "ID": "USC00519281", "Station Name": "WAIHEE 837.5, HI US" },
        ])
    );
}

#[tokio::test]
async fn tobs_returns_temperatures_for_most_active_station() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db.expect_count_by_station().times(1).returning(|| {
        Ok(vec![
            StationCount {
                station_id: String::from("USC00514830"),
                observations: 2202,
            },
            StationCount {
                station_id: String::from("USC00519281"),
                observations: 2772,
            },
        ])
    });
    climate_db
        .expect_observations_since()
        .withf(|cutoff| *cutoff == date!(2016 - 08 - 23))
        .times(1)
        .returning(|_| {
            Ok(vec![
                observation("USC00519281", date!(2016 - 08 - 24), Some(0.08), 77.0),
                observation("USC00514830", date!(2016 - 08 - 24), None, 80.0),
                observation("USC00519281", date!(2017 - 08 - 23), Some(0.45), 76.0),
            ])
        });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/tobs").await;

    assert!(status.is_success());
    assert_eq!(body, json!([77.0, 76.0]));
}

#[tokio::test]
async fn placedate_aggregates_over_inclusive_range() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db
        .expect_observations_in_range()
        .withf(|start, end| *start == date!(2017 - 08 - 01) && *end == date!(2017 - 08 - 23))
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                observation("USC00519281", date!(2017 - 08 - 01), Some(0.0), 72.0),
                observation("USC00519281", date!(2017 - 08 - 12), Some(0.3), 84.0),
                observation("USC00514830", date!(2017 - 08 - 23), None, 78.0),
            ])
        });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/placedate/2017-08-01/2017-08-23").await;

    assert!(status.is_success());
    assert_eq!(
        body,
        json!({ "Temp Min": 72.0, "Temp Avg": 78.0, "Temp Max": 84.0 })
    );
}

#[tokio::test]
async fn placedate_swaps_out_of_order_dates() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db
        .expect_observations_in_range()
        // Same normalized window as the ordered request
        .withf(|start, end| *start == date!(2017 - 08 - 01) && *end == date!(2017 - 08 - 23))
        .times(1)
        .returning(|_, _| {
            Ok(vec![observation(
                "USC00519281",
                date!(2017 - 08 - 12),
                Some(0.3),
                84.0,
            )])
        });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, _) = get(&test_app, "/api/v1.0/placedate/2017-08-23/2017-08-01").await;

    assert!(status.is_success());
}

#[tokio::test]
async fn placedate_defaults_missing_end_to_last_date() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db
        .expect_observations_in_range()
        .withf(|start, end| *start == date!(2017 - 01 - 01) && *end == date!(2017 - 08 - 23))
        .times(1)
        .returning(|_, _| {
            Ok(vec![observation(
                "USC00519281",
                date!(2017 - 03 - 15),
                Some(0.1),
                70.0,
            )])
        });

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/placedate/2017-01-01").await;

    assert!(status.is_success());
    assert_eq!(
        body,
        json!({ "Temp Min": 70.0, "Temp Avg": 70.0, "Temp Max": 70.0 })
    );
}

#[tokio::test]
async fn placedate_rejects_start_past_newest_data() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/placedate/2018-01-01").await;

    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("2017-08-23"));
}

#[tokio::test]
async fn placedate_rejects_start_below_first_date() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/placedate/2009-06-01/2017-01-01").await;

    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("2010-01-01"));
}

#[tokio::test]
async fn placedate_rejects_malformed_dates_without_touching_dataset() {
    // No expectations set: any data access would panic the mock
    let climate_db = MockClimateAccess::new();
    let test_app = spawn_app(Arc::new(climate_db)).await;

    for uri in [
        "/api/v1.0/placedate/2017%2F01%2F01",
        "/api/v1.0/placedate/Jan-1-2017",
        "/api/v1.0/placedate/2017-01-01/not-a-date",
    ] {
        let (status, body) = get(&test_app, uri).await;
        assert_eq!(status, hyper::StatusCode::NOT_FOUND);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("YYYY-MM-DD"));
    }
}

#[tokio::test]
async fn placedate_with_no_observations_in_range_is_not_found() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_first_date()
        .times(1)
        .returning(|| Ok(date!(2010 - 01 - 01)));
    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Ok(date!(2017 - 08 - 23)));
    climate_db
        .expect_observations_in_range()
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/placedate/2014-02-01/2014-02-02").await;

    assert_eq!(status, hyper::StatusCode::NOT_FOUND);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("no observations"));
}

#[tokio::test]
async fn data_access_failure_is_an_opaque_server_error() {
    let mut climate_db = MockClimateAccess::new();

    climate_db
        .expect_last_date()
        .times(1)
        .returning(|| Err(climate_api::db::Error::EmptyDataset));

    let test_app = spawn_app(Arc::new(climate_db)).await;
    let (status, body) = get(&test_app, "/api/v1.0/precipitation").await;

    assert_eq!(status, hyper::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "internal server error" }));
}
