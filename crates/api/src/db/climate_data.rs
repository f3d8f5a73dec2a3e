use async_trait::async_trait;
use log::info;
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    FromRow,
};
use std::str::FromStr;
use time::Date;
use utoipa::ToSchema;

use crate::range::DATE_FORMAT;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to format date string: {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("Failed to parse stored date string: {0}")]
    TimeParse(#[from] time::error::Parse),
    #[error("Dataset contains no observations")]
    EmptyDataset,
}

/// A single recorded measurement at one station on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_id: String,
    pub date: Date,
    pub precipitation: Option<f64>,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Station {
    #[serde(rename = "ID")]
    pub station_id: String,
    #[serde(rename = "Station Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct StationCount {
    pub station_id: String,
    pub observations: i64,
}

/// Read-only access to the observation dataset.
///
/// The dataset is static for the lifetime of the process; every method is a
/// plain read and no call holds a connection beyond its own query.
#[async_trait]
pub trait ClimateData: Send + Sync {
    /// Earliest observation date in the dataset
    async fn first_date(&self) -> Result<Date, Error>;
    /// Latest observation date in the dataset
    async fn last_date(&self) -> Result<Date, Error>;
    /// All observations with `start <= date <= end`
    async fn observations_in_range(&self, start: Date, end: Date)
        -> Result<Vec<Observation>, Error>;
    /// All observations with `date >= cutoff`, ascending by date
    async fn observations_since(&self, cutoff: Date) -> Result<Vec<Observation>, Error>;
    /// Observation counts grouped by station
    async fn count_by_station(&self) -> Result<Vec<StationCount>, Error>;
    /// Every station appearing in the observations, joined with its name
    async fn stations_with_names(&self) -> Result<Vec<Station>, Error>;
}

/// Stored dates are TEXT in `YYYY-MM-DD`, which compares correctly as strings
/// in SQL. Rows with any other date format fail conversion to [`Observation`].
#[derive(FromRow)]
struct ObservationRow {
    station: String,
    date: String,
    prcp: Option<f64>,
    tobs: f64,
}

impl TryFrom<ObservationRow> for Observation {
    type Error = Error;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        Ok(Observation {
            station_id: row.station,
            date: Date::parse(&row.date, DATE_FORMAT)?,
            precipitation: row.prcp,
            temperature: row.tobs,
        })
    }
}

pub struct ClimateAccess {
    pool: SqlitePool,
}

impl ClimateAccess {
    /// Opens a read-only pool over the dataset file. Built once at startup and
    /// shared by all requests.
    pub async fn new(path: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?.read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!("Climate dataset opened read-only at: {}", path);

        Ok(Self { pool })
    }

    async fn bound_date(&self, sql: &str) -> Result<Date, Error> {
        let raw: Option<String> = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        let raw = raw.ok_or(Error::EmptyDataset)?;
        Ok(Date::parse(&raw, DATE_FORMAT)?)
    }

    async fn observations(&self, sql: &str, params: Vec<String>) -> Result<Vec<Observation>, Error> {
        let mut query = sqlx::query_as::<_, ObservationRow>(sql);
        for param in params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Observation::try_from).collect()
    }
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn first_date(&self) -> Result<Date, Error> {
        self.bound_date("SELECT MIN(date) FROM measurement").await
    }

    async fn last_date(&self) -> Result<Date, Error> {
        self.bound_date("SELECT MAX(date) FROM measurement").await
    }

    async fn observations_in_range(
        &self,
        start: Date,
        end: Date,
    ) -> Result<Vec<Observation>, Error> {
        self.observations(
            "SELECT station, date, prcp, tobs FROM measurement \
             WHERE date >= ? AND date <= ? ORDER BY date ASC",
            vec![start.format(DATE_FORMAT)?, end.format(DATE_FORMAT)?],
        )
        .await
    }

    async fn observations_since(&self, cutoff: Date) -> Result<Vec<Observation>, Error> {
        self.observations(
            "SELECT station, date, prcp, tobs FROM measurement \
             WHERE date >= ? ORDER BY date ASC",
            vec![cutoff.format(DATE_FORMAT)?],
        )
        .await
    }

    async fn count_by_station(&self) -> Result<Vec<StationCount>, Error> {
        let counts = sqlx::query_as::<_, StationCount>(
            "SELECT station AS station_id, COUNT(*) AS observations \
             FROM measurement GROUP BY station",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn stations_with_names(&self) -> Result<Vec<Station>, Error> {
        let stations = sqlx::query_as::<_, Station>(
            "SELECT m.station AS station_id, s.name AS name \
             FROM measurement m JOIN station s ON m.station = s.station \
             GROUP BY m.station ORDER BY m.station",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stations)
    }
}
