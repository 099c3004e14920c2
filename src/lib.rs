pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::FirmaSeguroClient, storage::LocalStorage};
pub use config::toml_config::ReportConfig;
pub use crate::core::{etl::ReportEngine, pipeline::ConsumptionPipeline};
pub use utils::error::{ReportError, Result};
