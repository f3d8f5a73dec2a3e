pub mod db;
pub mod range;
pub mod routes;
mod startup;
pub mod stats;
mod utils;

pub use db::{ClimateAccess, ClimateData, Observation, Station, StationCount};
pub use range::{normalize, parse_date, DateRange, DatasetBounds, RangeError, DATE_FORMAT};
pub use routes::{
    index, precipitation, stations, temperature_between, temperature_from, tobs, ErrorBody,
};
pub use startup::{app, build_app_state, AppState};
pub use stats::{PrecipEntry, TemperatureSummary};
pub use utils::{get_config_info, get_log_level, setup_logger, Cli};
