use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting consumption report");

        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} status records{}",
            extracted.status_records.len(),
            if extracted.tenants.is_some() {
                " and tenant consumption"
            } else {
                ""
            }
        );

        let report = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Normalized {} status rows, {} method usage rows",
            report.rows.len(),
            report.method_usage.len()
        );

        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Report saved to {} in {:?}", output_path, started.elapsed());

        Ok(output_path)
    }
}
