use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    db::Station,
    stats::{self, TemperatureSummary},
    AppState,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Validation failures surface as 404 with the violated constraint in the
/// body; data-access failures are logged and become an opaque 500.
fn into_api_error(err: stats::Error) -> ApiError {
    match err {
        stats::Error::Data(e) => {
            error!("data access failure: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: String::from("internal server error"),
                }),
            )
        }
        other => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: other.to_string(),
            }),
        ),
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> String {
    let base = &state.remote_url;
    format!(
        "Available Routes:\n\
         {base}/api/v1.0/precipitation\n\
         {base}/api/v1.0/stations\n\
         {base}/api/v1.0/tobs\n\
         {base}/api/v1.0/placedate/{{start}}\n\
         {base}/api/v1.0/placedate/{{start}}/{{end}}\n\
         {base}/docs\n"
    )
}

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "Precipitation by date over the trailing 365 days, one single-key object per stored row", content_type = "application/json"),
        (status = INTERNAL_SERVER_ERROR, description = "Dataset unreachable", body = ErrorBody)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let series = stats::trailing_year_precipitation(state.climate_db.as_ref())
        .await
        .map_err(into_api_error)?;

    // One independent {date: value} object per row, duplicates by date kept
    let body = series
        .into_iter()
        .map(|entry| {
            let mut object = Map::new();
            object.insert(entry.date.to_string(), json!(entry.precipitation));
            Value::Object(object)
        })
        .collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Every station present in the observations", body = Vec<Station>),
        (status = INTERNAL_SERVER_ERROR, description = "Dataset unreachable", body = ErrorBody)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Station>>, ApiError> {
    let stations = state
        .climate_db
        .stations_with_names()
        .await
        .map_err(|e| into_api_error(e.into()))?;
    Ok(Json(stations))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "Temperatures at the most active station over the trailing year", body = Vec<f64>),
        (status = INTERNAL_SERVER_ERROR, description = "Dataset unreachable", body = ErrorBody)
    ))]
pub async fn tobs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<f64>>, ApiError> {
    let db = state.climate_db.as_ref();
    let range = stats::trailing_year(db).await.map_err(into_api_error)?;
    let station = stats::most_active_station(db)
        .await
        .map_err(into_api_error)?;
    let temperatures = stats::station_temperatures(db, &station, range)
        .await
        .map_err(into_api_error)?;
    Ok(Json(temperatures))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/placedate/{start}",
    params(
        ("start" = String, Path, description = "Start date, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature aggregates from start through the dataset's last date", body = TemperatureSummary),
        (status = NOT_FOUND, description = "Bad date format or date outside the dataset", body = ErrorBody)
    ))]
pub async fn temperature_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<TemperatureSummary>, ApiError> {
    summarize(&state, &start, None).await
}

#[utoipa::path(
    get,
    path = "/api/v1.0/placedate/{start}/{end}",
    params(
        ("start" = String, Path, description = "Start date, YYYY-MM-DD"),
        ("end" = String, Path, description = "End date, YYYY-MM-DD; swapped with start when out of order"),
    ),
    responses(
        (status = OK, description = "Temperature aggregates over the inclusive range", body = TemperatureSummary),
        (status = NOT_FOUND, description = "Bad date format or range outside the dataset", body = ErrorBody)
    ))]
pub async fn temperature_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<TemperatureSummary>, ApiError> {
    summarize(&state, &start, Some(&end)).await
}

async fn summarize(
    state: &AppState,
    start_raw: &str,
    end_raw: Option<&str>,
) -> Result<Json<TemperatureSummary>, ApiError> {
    let db = state.climate_db.as_ref();
    let range = stats::resolve_range(db, start_raw, end_raw)
        .await
        .map_err(into_api_error)?;
    let summary = stats::temperature_summary(db, range)
        .await
        .map_err(into_api_error)?;
    Ok(Json(summary))
}
