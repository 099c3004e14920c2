//! Flattens per-status consumption buckets into rows and derives the
//! headline totals shown on the consumption dashboard.

use crate::domain::model::{
    ConsumptionRecord, ConsumptionSummary, Counts, DuplicateStatusPolicy, MonthLabel, MonthPoint,
    NormalizedRow, STATUS_DRAFT, STATUS_SUCCESSFUL,
};
use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;

const CHANNEL_BACKOFFICE: &str = "BackOffice";
const CHANNEL_API: &str = "API";

/// Validates and normalizes raw records in one pass.
///
/// Fails when a record lacks `processStatus` or `consumption`, or when a
/// count does not fit in an `i64`.
pub fn normalize(records: &[serde_json::Value]) -> Result<Vec<NormalizedRow>> {
    let parsed = records
        .iter()
        .enumerate()
        .map(|(index, value)| ConsumptionRecord::from_value(index, value))
        .collect::<Result<Vec<_>>>()?;

    normalize_records(&parsed)
}

/// Keeps every record that carries a `tipoCreacion` mapping, in input order.
///
/// Fails only when a `consolidados` total does not fit in an `i64`.
pub fn normalize_records(records: &[ConsumptionRecord]) -> Result<Vec<NormalizedRow>> {
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let consumption = &record.consumption;
        let Some(tipo_creacion) = consumption.tipo_creacion.clone() else {
            continue;
        };
        let consolidados = consumption.consolidados.clone().unwrap_or_default();

        rows.push(NormalizedRow {
            process_status: record.process_status.clone(),
            total_consolidado: checked_sum(consolidados.values().copied(), "consolidados")?,
            tipo_creacion,
            tipo_proceso: consumption.tipo_proceso.clone().unwrap_or_default(),
            tipo_autenticacion: consumption.tipo_autenticacion.clone().unwrap_or_default(),
            consolidados,
        });
    }

    Ok(rows)
}

/// Sums counts, failing with [`ReportError::CountOverflowError`] instead of wrapping.
pub(crate) fn checked_sum(counts: impl IntoIterator<Item = i64>, field: &str) -> Result<i64> {
    counts.into_iter().try_fold(0i64, |total, count| {
        total
            .checked_add(count)
            .ok_or_else(|| ReportError::CountOverflowError {
                field: field.to_string(),
            })
    })
}

/// Signatures across every authentication method. Drafts are never signed.
pub fn total_signatures(rows: &[NormalizedRow]) -> Result<i64> {
    checked_sum(
        rows.iter()
            .filter(|row| row.process_status != STATUS_DRAFT)
            .flat_map(|row| row.tipo_autenticacion.values().copied()),
        "totalSignatures",
    )
}

pub fn total_processes(rows: &[NormalizedRow]) -> Result<i64> {
    let created = rows
        .iter()
        .filter(|row| row.process_status != STATUS_DRAFT)
        .map(created_processes)
        .collect::<Result<Vec<_>>>()?;
    checked_sum(created, "totalProcesses")
}

pub fn total_processes_signed(rows: &[NormalizedRow]) -> Result<i64> {
    let created = rows
        .iter()
        .filter(|row| row.process_status == STATUS_SUCCESSFUL)
        .map(created_processes)
        .collect::<Result<Vec<_>>>()?;
    checked_sum(created, "totalProcessesSigned")
}

fn created_processes(row: &NormalizedRow) -> Result<i64> {
    let channel = |name: &str| row.tipo_creacion.get(name).copied().unwrap_or(0);
    checked_sum(
        [channel(CHANNEL_BACKOFFICE), channel(CHANNEL_API)],
        "tipoCreacion",
    )
}

pub fn summarize(rows: &[NormalizedRow]) -> Result<ConsumptionSummary> {
    Ok(ConsumptionSummary {
        total_signatures: total_signatures(rows)?,
        total_processes: total_processes(rows)?,
        total_processes_signed: total_processes_signed(rows)?,
    })
}

/// Chronological `(label, count)` points for a row's `consolidados`.
pub fn month_series(row: &NormalizedRow, label: MonthLabel) -> Result<Vec<MonthPoint>> {
    let mut points = row
        .consolidados
        .iter()
        .map(|(key, count)| parse_month_key(key).map(|date| (date, key, *count)))
        .collect::<Result<Vec<_>>>()?;

    points.sort_by_key(|(date, _, _)| *date);

    Ok(points
        .into_iter()
        .map(|(date, key, count)| MonthPoint {
            month: key.clone(),
            label: match label {
                MonthLabel::Month => date.format("%B").to_string(),
                MonthLabel::MonthYear => date.format("%B %Y").to_string(),
            },
            count,
        })
        .collect())
}

fn parse_month_key(key: &str) -> Result<NaiveDate> {
    let malformed = || ReportError::MalformedDateKeyError {
        key: key.to_string(),
    };

    if key.len() != 6 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let year: i32 = key[..4].parse().map_err(|_| malformed())?;
    let month: u32 = key[4..].parse().map_err(|_| malformed())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(malformed)
}

/// Resolves repeated statuses so that each status maps to exactly one row.
///
/// `Merge` keeps the first occurrence's position and sums every mapping
/// key-wise into it.
pub fn apply_status_policy(
    rows: Vec<NormalizedRow>,
    policy: DuplicateStatusPolicy,
) -> Result<Vec<NormalizedRow>> {
    let mut unique: Vec<NormalizedRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match unique
            .iter_mut()
            .find(|existing| existing.process_status == row.process_status)
        {
            None => unique.push(row),
            Some(_) if policy == DuplicateStatusPolicy::Reject => {
                return Err(ReportError::DuplicateStatusError {
                    status: row.process_status,
                });
            }
            Some(existing) => {
                existing.total_consolidado = checked_sum(
                    [existing.total_consolidado, row.total_consolidado],
                    "totalConsolidado",
                )?;
                merge_counts(&mut existing.consolidados, row.consolidados, "consolidados")?;
                merge_counts(&mut existing.tipo_creacion, row.tipo_creacion, "tipoCreacion")?;
                merge_counts(&mut existing.tipo_proceso, row.tipo_proceso, "tipoProceso")?;
                merge_counts(
                    &mut existing.tipo_autenticacion,
                    row.tipo_autenticacion,
                    "tipoAutenticacion",
                )?;
            }
        }
    }

    Ok(unique)
}

fn merge_counts(into: &mut Counts, from: Counts, field: &str) -> Result<()> {
    for (key, count) in from {
        let slot = into.entry(key).or_insert(0);
        *slot = checked_sum([*slot, count], field)?;
    }
    Ok(())
}

/// Looks up a status in a table that already went through [`apply_status_policy`].
pub fn row_for_status<'a>(rows: &'a [NormalizedRow], status: &str) -> Option<&'a NormalizedRow> {
    rows.iter().find(|row| row.process_status == status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_records() -> Vec<serde_json::Value> {
        vec![
            json!({
                "processStatus": "Exitoso",
                "consumption": {
                    "consolidados": {"202401": 5, "202402": 3},
                    "tipoCreacion": {"BackOffice": 4, "API": 4},
                    "tipoProceso": {},
                    "tipoAutenticacion": {"SMS": 8}
                }
            }),
            json!({
                "processStatus": "Borrador",
                "consumption": {
                    "consolidados": {"202401": 2},
                    "tipoCreacion": {"BackOffice": 2},
                    "tipoAutenticacion": {"Email": 2}
                }
            }),
            json!({
                "processStatus": "Rechazado",
                "consumption": {
                    "consolidados": {"202403": 1},
                    "tipoCreacion": {"API": 1},
                    "tipoProceso": {"Simple": 1},
                    "tipoAutenticacion": {"WhatsApp": 1}
                }
            }),
        ]
    }

    #[test]
    fn test_normalize_successful_record() {
        let rows = normalize(&sample_records()[..1]).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.process_status, "Exitoso");
        assert_eq!(row.total_consolidado, 8);
        assert_eq!(row.tipo_creacion["BackOffice"], 4);
        assert_eq!(row.tipo_creacion["API"], 4);
        assert!(row.tipo_proceso.is_empty());
        assert_eq!(row.tipo_autenticacion["SMS"], 8);

        let serialized = serde_json::to_value(row).unwrap();
        assert_eq!(serialized["processStatus"], "Exitoso");
        assert_eq!(serialized["totalConsolidado"], 8);
    }

    #[test]
    fn test_normalize_drops_records_without_tipo_creacion() {
        let mut records = sample_records();
        records.push(json!({
            "processStatus": "TODOS",
            "consumption": {"consolidados": {"202401": 9}}
        }));
        records.push(json!({
            "processStatus": "Pendiente",
            "consumption": {"tipoCreacion": []}
        }));

        let rows = normalize(&records).unwrap();

        assert_eq!(rows.len(), records.len() - 2);
        assert!(rows.iter().all(|row| row.process_status != "TODOS"));
        assert!(rows.iter().all(|row| row.process_status != "Pendiente"));
    }

    #[test]
    fn test_normalize_preserves_order_and_duplicates() {
        let mut records = sample_records();
        records.push(records[0].clone());

        let rows = normalize(&records).unwrap();
        let statuses: Vec<&str> = rows.iter().map(|r| r.process_status.as_str()).collect();
        assert_eq!(statuses, vec!["Exitoso", "Borrador", "Rechazado", "Exitoso"]);
    }

    #[test]
    fn test_normalize_missing_consolidados_totals_zero() {
        let records = vec![json!({
            "processStatus": "Exitoso",
            "consumption": {"tipoCreacion": {"API": 1}}
        })];

        let rows = normalize(&records).unwrap();
        assert_eq!(rows[0].total_consolidado, 0);
        assert!(rows[0].consolidados.is_empty());
        assert!(rows[0].tipo_autenticacion.is_empty());
    }

    #[test]
    fn test_normalize_fails_on_missing_required_keys() {
        let mut records = sample_records();
        records.insert(1, json!({"processStatus": "Exitoso"}));

        let err = normalize(&records).unwrap_err();
        assert!(matches!(
            err,
            ReportError::MalformedRecordError {
                index: 1,
                field: "consumption"
            }
        ));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = sample_records();
        assert_eq!(normalize(&records).unwrap(), normalize(&records).unwrap());
    }

    #[test]
    fn test_totals() {
        let rows = normalize(&sample_records()).unwrap();

        // Borrador is excluded from both signatures and processes.
        assert_eq!(total_signatures(&rows).unwrap(), 9);
        assert_eq!(total_processes(&rows).unwrap(), 9);
        assert_eq!(total_processes_signed(&rows).unwrap(), 8);

        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.total_signatures, 9);
        assert_eq!(summary.total_processes_signed, 8);
    }

    #[test]
    fn test_totals_on_edge_inputs() {
        assert_eq!(total_signatures(&[]).unwrap(), 0);
        assert_eq!(total_processes(&[]).unwrap(), 0);

        let drafts = normalize(&sample_records()[1..2]).unwrap();
        assert_eq!(total_signatures(&drafts).unwrap(), 0);
        assert_eq!(total_processes(&drafts).unwrap(), 0);

        let not_successful = normalize(&sample_records()[1..]).unwrap();
        assert_eq!(total_processes_signed(&not_successful).unwrap(), 0);
    }

    #[test]
    fn test_month_series_labels() {
        let rows = normalize(&sample_records()[..1]).unwrap();

        let series = month_series(&rows[0], MonthLabel::Month).unwrap();
        let pairs: Vec<(&str, i64)> = series.iter().map(|p| (p.label.as_str(), p.count)).collect();
        assert_eq!(pairs, vec![("January", 5), ("February", 3)]);

        let series = month_series(&rows[0], MonthLabel::MonthYear).unwrap();
        assert_eq!(series[1].label, "February 2024");
        assert_eq!(series[1].month, "202402");
    }

    #[test]
    fn test_month_series_is_chronological_across_years() {
        let records = vec![json!({
            "processStatus": "Exitoso",
            "consumption": {
                "consolidados": {"202402": 1, "202312": 7, "202401": 2},
                "tipoCreacion": {}
            }
        })];
        let rows = normalize(&records).unwrap();

        let months: Vec<String> = month_series(&rows[0], MonthLabel::MonthYear)
            .unwrap()
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(months, vec!["December 2023", "January 2024", "February 2024"]);
    }

    #[test]
    fn test_month_series_rejects_malformed_keys() {
        for key in ["2024-01", "20241", "202413", "abcdef", "2024001"] {
            let mut row = normalize(&sample_records()[..1]).unwrap().remove(0);
            row.consolidados.insert(key.to_string(), 1);

            let err = month_series(&row, MonthLabel::Month).unwrap_err();
            assert!(
                matches!(err, ReportError::MalformedDateKeyError { key: ref k } if k == key),
                "expected malformed key error for {}",
                key
            );
        }
    }

    #[test]
    fn test_merge_policy_sums_duplicates() {
        let mut records = sample_records();
        records.push(json!({
            "processStatus": "Exitoso",
            "consumption": {
                "consolidados": {"202402": 1, "202403": 4},
                "tipoCreacion": {"API": 5},
                "tipoAutenticacion": {"SMS": 1, "Email": 4}
            }
        }));
        let rows = normalize(&records).unwrap();

        let merged = apply_status_policy(rows, DuplicateStatusPolicy::Merge).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].process_status, "Exitoso");

        let exitoso = row_for_status(&merged, "Exitoso").unwrap();
        assert_eq!(exitoso.total_consolidado, 13);
        assert_eq!(exitoso.consolidados["202402"], 4);
        assert_eq!(exitoso.consolidados["202403"], 4);
        assert_eq!(exitoso.tipo_creacion["API"], 9);
        assert_eq!(exitoso.tipo_autenticacion["SMS"], 9);
        assert_eq!(exitoso.tipo_autenticacion["Email"], 4);
    }

    #[test]
    fn test_reject_policy_fails_on_duplicates() {
        let mut records = sample_records();
        records.push(records[2].clone());
        let rows = normalize(&records).unwrap();

        let err = apply_status_policy(rows, DuplicateStatusPolicy::Reject).unwrap_err();
        assert!(matches!(err, ReportError::DuplicateStatusError { ref status } if status == "Rechazado"));

        let unique = normalize(&sample_records()).unwrap();
        assert_eq!(
            apply_status_policy(unique.clone(), DuplicateStatusPolicy::Reject).unwrap(),
            unique
        );
    }

    fn is_overflow(err: &ReportError, expected: &str) -> bool {
        matches!(err, ReportError::CountOverflowError { field } if field == expected)
    }

    #[test]
    fn test_normalize_fails_when_consolidado_total_overflows() {
        let records = vec![json!({
            "processStatus": "Exitoso",
            "consumption": {
                "consolidados": {"202401": i64::MAX, "202402": 1},
                "tipoCreacion": {"API": 1}
            }
        })];

        let err = normalize(&records).unwrap_err();
        assert!(is_overflow(&err, "consolidados"), "unexpected error: {err}");
    }

    #[test]
    fn test_totals_fail_instead_of_wrapping() {
        let records = vec![
            json!({
                "processStatus": "Exitoso",
                "consumption": {
                    "tipoCreacion": {"BackOffice": i64::MAX, "API": 0},
                    "tipoAutenticacion": {"SMS": i64::MAX}
                }
            }),
            json!({
                "processStatus": "Rechazado",
                "consumption": {
                    "tipoCreacion": {"API": 1},
                    "tipoAutenticacion": {"Email": 1}
                }
            }),
        ];
        let rows = normalize(&records).unwrap();

        assert!(is_overflow(&total_signatures(&rows).unwrap_err(), "totalSignatures"));
        assert!(is_overflow(&total_processes(&rows).unwrap_err(), "totalProcesses"));
        assert_eq!(total_processes_signed(&rows).unwrap(), i64::MAX);
        assert!(summarize(&rows).is_err());
    }

    #[test]
    fn test_merge_policy_fails_on_overflowing_counts() {
        let records = vec![
            json!({
                "processStatus": "Exitoso",
                "consumption": {"tipoCreacion": {"API": i64::MAX}}
            }),
            json!({
                "processStatus": "Exitoso",
                "consumption": {"tipoCreacion": {"API": 1}}
            }),
        ];
        let rows = normalize(&records).unwrap();

        let err = apply_status_policy(rows, DuplicateStatusPolicy::Merge).unwrap_err();
        assert!(is_overflow(&err, "tipoCreacion"), "unexpected error: {err}");
    }
}
