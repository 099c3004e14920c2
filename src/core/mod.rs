pub mod bundle;
pub mod etl;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod tenant;

pub use crate::domain::model::{ConsumptionReport, ExtractedConsumption, NormalizedRow};
pub use crate::domain::ports::{ConfigProvider, ConsumptionApi, Pipeline, Storage};
pub use crate::utils::error::Result;
