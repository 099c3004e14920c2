//! Per-status datasets: the tables each dashboard panel was drawn from.

use crate::core::normalizer::{apply_status_policy, month_series, normalize, summarize};
use crate::core::tenant::{authentication_breakdown, flatten_tenants, parse_tenants};
use crate::domain::model::{
    Breakdown, ConsumptionReport, Counts, DuplicateStatusPolicy, ExtractedConsumption,
    MonthLabel, NormalizedRow, StatusReport,
};
use crate::utils::error::Result;

pub const DIMENSION_CREATION: &str = "tipoCreacion";
pub const DIMENSION_PROCESS: &str = "tipoProceso";
pub const DIMENSION_AUTHENTICATION: &str = "tipoAutenticacion";

/// `(processStatus, totalConsolidado)` pairs for the status bar chart.
pub fn status_totals(rows: &[NormalizedRow]) -> Vec<(String, i64)> {
    rows.iter()
        .map(|row| (row.process_status.clone(), row.total_consolidado))
        .collect()
}

pub fn status_report(row: &NormalizedRow, label: MonthLabel) -> Result<StatusReport> {
    Ok(StatusReport {
        process_status: row.process_status.clone(),
        total_consolidado: row.total_consolidado,
        months: month_series(row, label)?,
        creation: breakdown(DIMENSION_CREATION, &row.tipo_creacion),
        process_type: breakdown(DIMENSION_PROCESS, &row.tipo_proceso),
        authentication: breakdown(DIMENSION_AUTHENTICATION, &row.tipo_autenticacion),
    })
}

fn breakdown(dimension: &str, counts: &Counts) -> Breakdown {
    Breakdown {
        dimension: dimension.to_string(),
        entries: counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect(),
    }
}

/// Turns the raw responses of one run into the exported report.
///
/// Totals are computed over every normalized row; per-status reports use
/// the table after the duplicate policy is applied.
pub fn build_report(
    extracted: ExtractedConsumption,
    policy: DuplicateStatusPolicy,
    label: MonthLabel,
) -> Result<ConsumptionReport> {
    let normalized = normalize(&extracted.status_records)?;
    let dropped_records = extracted.status_records.len() - normalized.len();
    let summary = summarize(&normalized)?;

    let rows = apply_status_policy(normalized, policy)?;
    let status_reports = rows
        .iter()
        .map(|row| status_report(row, label))
        .collect::<Result<Vec<_>>>()?;

    let tenants = match &extracted.tenants {
        Some(value) => parse_tenants(value)?,
        None => Vec::new(),
    };
    let authentication = match &extracted.nit {
        Some(nit) if extracted.tenants.is_some() => authentication_breakdown(&tenants, nit)?,
        _ => Vec::new(),
    };

    Ok(ConsumptionReport {
        nit: extracted.nit,
        dropped_records,
        summary,
        rows,
        status_reports,
        method_usage: flatten_tenants(&tenants),
        authentication,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extracted() -> ExtractedConsumption {
        ExtractedConsumption {
            nit: Some("1012402467".to_string()),
            status_records: vec![
                json!({
                    "processStatus": "Exitoso",
                    "consumption": {
                        "consolidados": {"202402": 3, "202401": 5},
                        "tipoCreacion": {"BackOffice": 4, "API": 4},
                        "tipoProceso": {"Simple": 0},
                        "tipoAutenticacion": {"SMS": 8}
                    }
                }),
                json!({
                    "processStatus": "TODOS",
                    "consumption": {"consolidados": {"202401": 1}}
                }),
            ],
            tenants: Some(json!([{
                "nit": "1012402467",
                "consumption": {
                    "totalAmountConsumption": 8,
                    "firmaSeguroMethod": [
                        {"balanceTypeId": 1, "signatureMethodId": 1, "authenticationMethodId": 2, "amountConsumed": 8}
                    ]
                }
            }])),
        }
    }

    #[test]
    fn test_build_report() {
        let report =
            build_report(extracted(), DuplicateStatusPolicy::Merge, MonthLabel::Month).unwrap();

        assert_eq!(report.dropped_records, 1);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.summary.total_processes_signed, 8);
        assert_eq!(report.summary.total_signatures, 8);
        assert_eq!(report.method_usage.len(), 1);
        assert_eq!(report.authentication[1].method, "SMS");
        assert_eq!(report.authentication[1].count, 8);

        let status = &report.status_reports[0];
        assert_eq!(status.months[0].label, "January");
        assert!(status.creation.has_results());
        assert!(!status.process_type.has_results());
    }

    #[test]
    fn test_build_report_without_tenants() {
        let mut data = extracted();
        data.tenants = None;

        let report = build_report(data, DuplicateStatusPolicy::Merge, MonthLabel::Month).unwrap();
        assert!(report.method_usage.is_empty());
        assert!(report.authentication.is_empty());
    }

    #[test]
    fn test_status_totals() {
        let report =
            build_report(extracted(), DuplicateStatusPolicy::Merge, MonthLabel::Month).unwrap();
        assert_eq!(status_totals(&report.rows), vec![("Exitoso".to_string(), 8)]);
    }
}
