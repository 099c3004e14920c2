use crate::domain::model::{
    ConsumptionReport, DuplicateStatusPolicy, ExtractedConsumption, MonthLabel,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Destination for the finished report bundle.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The vendor balance API: sign in once, then fetch with the bearer token.
pub trait ConsumptionApi: Send + Sync {
    fn authenticate(&self) -> impl std::future::Future<Output = Result<String>> + Send;

    /// All tenants (one entry per NIT) for the configured date range.
    fn fetch_all_consumption(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;

    /// Per-status buckets for one NIT.
    fn fetch_consumption_by_nit(
        &self,
        token: &str,
        nit: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn output_path(&self) -> &str;
    fn output_filename(&self) -> &str;
    fn nit(&self) -> Option<&str>;
    fn duplicate_status_policy(&self) -> DuplicateStatusPolicy;
    fn month_label(&self) -> MonthLabel;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedConsumption>;
    async fn transform(&self, data: ExtractedConsumption) -> Result<ConsumptionReport>;
    async fn load(&self, report: ConsumptionReport) -> Result<String>;
}
