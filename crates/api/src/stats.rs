use serde::{Deserialize, Serialize};
use time::{Date, Duration};
use utoipa::ToSchema;

use crate::{
    db::{self, ClimateData},
    range::{normalize, parse_date, DateRange, DatasetBounds, RangeError},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Data(#[from] db::Error),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("no observations between {start} and {end}")]
    NoDataInRange { start: Date, end: Date },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TemperatureSummary {
    #[serde(rename = "Temp Min")]
    pub temp_min: f64,
    #[serde(rename = "Temp Avg")]
    pub temp_avg: f64,
    #[serde(rename = "Temp Max")]
    pub temp_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrecipEntry {
    pub date: Date,
    pub precipitation: Option<f64>,
}

pub async fn dataset_bounds(db: &dyn ClimateData) -> Result<DatasetBounds, db::Error> {
    Ok(DatasetBounds {
        first_date: db.first_date().await?,
        last_date: db.last_date().await?,
    })
}

/// Resolves raw caller input into a query window validated against the
/// dataset's own bounds. Both dates must parse before the dataset is touched.
pub async fn resolve_range(
    db: &dyn ClimateData,
    start_raw: &str,
    end_raw: Option<&str>,
) -> Result<DateRange, Error> {
    let start = parse_date(start_raw)?;
    let end = end_raw.map(parse_date).transpose()?;
    let bounds = dataset_bounds(db).await?;
    Ok(normalize(start, end, bounds)?)
}

/// Min/avg/max temperature over the inclusive range. Zero observations in
/// range is an explicit error rather than null aggregates.
pub async fn temperature_summary(
    db: &dyn ClimateData,
    range: DateRange,
) -> Result<TemperatureSummary, Error> {
    let observations = db.observations_in_range(range.start, range.end).await?;
    if observations.is_empty() {
        return Err(Error::NoDataInRange {
            start: range.start,
            end: range.end,
        });
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for observation in &observations {
        min = min.min(observation.temperature);
        max = max.max(observation.temperature);
        sum += observation.temperature;
    }

    Ok(TemperatureSummary {
        temp_min: min,
        temp_avg: sum / observations.len() as f64,
        temp_max: max,
    })
}

/// The station with the most observations. Ties break to the
/// lexicographically smallest station id so the answer is deterministic.
pub async fn most_active_station(db: &dyn ClimateData) -> Result<String, Error> {
    let mut counts = db.count_by_station().await?;
    counts.sort_by(|a, b| {
        b.observations
            .cmp(&a.observations)
            .then_with(|| a.station_id.cmp(&b.station_id))
    });

    counts
        .into_iter()
        .next()
        .map(|count| count.station_id)
        .ok_or(Error::Data(db::Error::EmptyDataset))
}

/// The 365-day window ending at the newest observation date.
pub async fn trailing_year(db: &dyn ClimateData) -> Result<DateRange, Error> {
    let last_date = db.last_date().await?;
    Ok(DateRange {
        start: last_date - Duration::days(365),
        end: last_date,
    })
}

/// Temperature observations at one station within the range.
pub async fn station_temperatures(
    db: &dyn ClimateData,
    station_id: &str,
    range: DateRange,
) -> Result<Vec<f64>, Error> {
    let observations = db.observations_since(range.start).await?;
    Ok(observations
        .into_iter()
        .filter(|observation| {
            observation.station_id == station_id && observation.date <= range.end
        })
        .map(|observation| observation.temperature)
        .collect())
}

/// Ordered precipitation series over the trailing year, one entry per stored
/// row. Entries are not merged by date: several stations reporting the same
/// date produce several entries with that date.
pub async fn trailing_year_precipitation(
    db: &dyn ClimateData,
) -> Result<Vec<PrecipEntry>, Error> {
    let range = trailing_year(db).await?;
    let observations = db.observations_since(range.start).await?;
    Ok(observations
        .into_iter()
        .map(|observation| PrecipEntry {
            date: observation.date,
            precipitation: observation.precipitation,
        })
        .collect())
}
