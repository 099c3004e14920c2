use crate::core::report::{
    status_totals, DIMENSION_AUTHENTICATION, DIMENSION_CREATION, DIMENSION_PROCESS,
};
use crate::domain::model::ConsumptionReport;
use crate::utils::error::{ReportError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const STATUS_TOTALS_FILE: &str = "status_totals.csv";
pub const STATUS_BREAKDOWN_FILE: &str = "status_breakdown.csv";
pub const MONTHLY_FILE: &str = "monthly.csv";
pub const METHOD_USAGE_FILE: &str = "method_usage.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Packs the report tables into a ZIP archive held in memory.
pub fn write_bundle(report: &ConsumptionReport) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(STATUS_TOTALS_FILE, FileOptions::default())?;
    zip.write_all(&status_totals_csv(report)?)?;

    zip.start_file::<_, ()>(STATUS_BREAKDOWN_FILE, FileOptions::default())?;
    zip.write_all(&status_breakdown_csv(report)?)?;

    zip.start_file::<_, ()>(MONTHLY_FILE, FileOptions::default())?;
    zip.write_all(&monthly_csv(report)?)?;

    // Only present when the all-consumption endpoint was queried.
    if !report.method_usage.is_empty() {
        zip.start_file::<_, ()>(METHOD_USAGE_FILE, FileOptions::default())?;
        zip.write_all(&method_usage_csv(report)?)?;
    }

    zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
    let summary = serde_json::to_string_pretty(report)?;
    zip.write_all(summary.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn status_totals_csv(report: &ConsumptionReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["processStatus", "totalConsolidado"])?;
    for (status, total) in status_totals(&report.rows) {
        writer.write_record([status, total.to_string()])?;
    }
    finish(writer)
}

fn status_breakdown_csv(report: &ConsumptionReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["processStatus", "dimension", "key", "count"])?;
    for row in &report.rows {
        for (dimension, counts) in [
            (DIMENSION_CREATION, &row.tipo_creacion),
            (DIMENSION_PROCESS, &row.tipo_proceso),
            (DIMENSION_AUTHENTICATION, &row.tipo_autenticacion),
        ] {
            for (key, count) in counts {
                writer.write_record([
                    row.process_status.as_str(),
                    dimension,
                    key.as_str(),
                    count.to_string().as_str(),
                ])?;
            }
        }
    }
    finish(writer)
}

fn monthly_csv(report: &ConsumptionReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["processStatus", "month", "label", "count"])?;
    for status in &report.status_reports {
        for point in &status.months {
            writer.write_record([
                status.process_status.as_str(),
                point.month.as_str(),
                point.label.as_str(),
                point.count.to_string().as_str(),
            ])?;
        }
    }
    finish(writer)
}

fn method_usage_csv(report: &ConsumptionReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in &report.method_usage {
        writer.serialize(row)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ReportError::IoError(e.into_error()))
}
