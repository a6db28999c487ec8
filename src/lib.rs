//! Marine pollution incident dashboard: loading, normalization, filtering
//! and derived summaries. The egui front-end lives in the binary.

pub mod config;
pub mod data;
pub mod error;

pub use config::DashboardConfig;
pub use error::{ConfigError, DataError, ExportError};
