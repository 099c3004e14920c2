use crate::core::bundle::write_bundle;
use crate::core::report::build_report;
use crate::core::{ConfigProvider, ConsumptionApi, ConsumptionReport, ExtractedConsumption};
use crate::core::{Pipeline, Storage};
use crate::utils::error::{ReportError, Result};

pub struct ConsumptionPipeline<S: Storage, A: ConsumptionApi, C: ConfigProvider> {
    storage: S,
    api: A,
    config: C,
}

impl<S: Storage, A: ConsumptionApi, C: ConfigProvider> ConsumptionPipeline<S, A, C> {
    pub fn new(storage: S, api: A, config: C) -> Self {
        Self {
            storage,
            api,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, A: ConsumptionApi, C: ConfigProvider> Pipeline for ConsumptionPipeline<S, A, C> {
    async fn extract(&self) -> Result<ExtractedConsumption> {
        let token = self.api.authenticate().await?;
        tracing::debug!("Authenticated against consumption API");

        let tenants = self.api.fetch_all_consumption(&token).await?;

        let nit = self.config.nit().map(str::to_string);
        let status_records = match &nit {
            Some(nit) => {
                let value = self.api.fetch_consumption_by_nit(&token, nit).await?;
                match value {
                    serde_json::Value::Array(items) => items,
                    other => {
                        return Err(ReportError::UnexpectedResponseError {
                            message: format!(
                                "by-nit consumption for {} is not a JSON array (got {})",
                                nit,
                                json_kind(&other)
                            ),
                        })
                    }
                }
            }
            None => {
                tracing::info!("No NIT configured, skipping per-status consumption");
                Vec::new()
            }
        };

        Ok(ExtractedConsumption {
            nit,
            status_records,
            tenants: Some(tenants),
        })
    }

    async fn transform(&self, data: ExtractedConsumption) -> Result<ConsumptionReport> {
        let report = build_report(
            data,
            self.config.duplicate_status_policy(),
            self.config.month_label(),
        )?;

        if report.dropped_records > 0 {
            tracing::warn!(
                "Dropped {} status records without a tipoCreacion breakdown",
                report.dropped_records
            );
        }
        tracing::debug!("Summary: {:?}", report.summary);

        Ok(report)
    }

    async fn load(&self, report: ConsumptionReport) -> Result<String> {
        let filename = self.config.output_filename();
        let output_path = format!("{}/{}", self.config.output_path(), filename);

        let bundle = write_bundle(&report)?;
        tracing::debug!("Writing report bundle ({} bytes) to storage", bundle.len());
        self.storage.write_file(filename, &bundle).await?;

        Ok(output_path)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
