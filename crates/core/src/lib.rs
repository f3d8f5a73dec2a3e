//! Climate Stats Core Library
//!
//! Shared utilities for the API service:
//! - Configuration loading (XDG-compliant)
//! - File system utilities

mod config;
pub mod fs;

pub use config::{find_config_file, load_config, ConfigSource};
pub use fs::{is_file, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "climate-stats";

/// Default API port
pub const DEFAULT_API_PORT: u16 = 9500;
