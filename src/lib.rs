//! Cultivation strategy KPI aggregation: loads per-cultivation KPI records,
//! averages them per strategy and builds the dashboard panels (radar series,
//! colors, energy cost series, weight distribution).

pub mod analysis;
pub mod config;
pub mod defaults;
pub mod error;
pub mod http;
pub mod output;
pub mod selection;
pub mod session;
pub mod sources;
pub mod types;

pub use error::{Error, Result};
