#![forbid(unsafe_code)]

//! Core domain model and forecasting logic for cyclecast.
//!
//! This crate provides:
//! - Domain types (period and ovulation records, forecasts, statistics)
//! - The cycle predictor (next period, next ovulation, cycle statistics)
//! - Input validation
//! - Record storage (JSON record book, CSV export/import)
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod validate;
pub mod stats;
pub mod predictor;
pub mod records;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, PredictionParams};
pub use records::RecordBook;
pub use store::RECORDS_FILE;
pub use validate::parse_date;
pub use predictor::{
    cycle_stats, fertile_window, ovulation_offsets, predict_next_ovulation, predict_next_period,
};
