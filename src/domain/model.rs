use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Key/count mapping as delivered by the balance API (`tipoCreacion`, `consolidados`, ...).
pub type Counts = BTreeMap<String, i64>;

pub const STATUS_DRAFT: &str = "Borrador";
pub const STATUS_SUCCESSFUL: &str = "Exitoso";

/// One process-status bucket of the by-NIT consumption response.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionRecord {
    pub process_status: String,
    pub consumption: Consumption,
}

/// Optional breakdowns of a record. A field that is absent or not a JSON
/// object is `None`. Inside an object, integral numbers (including `5.0`)
/// are kept, other values are ignored, and integers outside the `i64` range
/// are rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Consumption {
    pub consolidados: Option<Counts>,
    pub tipo_creacion: Option<Counts>,
    pub tipo_proceso: Option<Counts>,
    pub tipo_autenticacion: Option<Counts>,
}

impl ConsumptionRecord {
    /// Validates one raw record. Only `processStatus` and `consumption` are
    /// structurally required.
    pub fn from_value(index: usize, value: &serde_json::Value) -> Result<Self> {
        let process_status = value
            .get("processStatus")
            .and_then(|v| v.as_str())
            .ok_or(ReportError::MalformedRecordError {
                index,
                field: "processStatus",
            })?;

        let consumption = value
            .get("consumption")
            .and_then(|v| v.as_object())
            .ok_or(ReportError::MalformedRecordError {
                index,
                field: "consumption",
            })?;

        Ok(Self {
            process_status: process_status.to_string(),
            consumption: Consumption {
                consolidados: counts_from(consumption, "consolidados")?,
                tipo_creacion: counts_from(consumption, "tipoCreacion")?,
                tipo_proceso: counts_from(consumption, "tipoProceso")?,
                tipo_autenticacion: counts_from(consumption, "tipoAutenticacion")?,
            },
        })
    }
}

fn counts_from(
    consumption: &serde_json::Map<String, serde_json::Value>,
    field: &str,
) -> Result<Option<Counts>> {
    let Some(obj) = consumption.get(field).and_then(|v| v.as_object()) else {
        return Ok(None);
    };

    let mut counts = Counts::new();
    for (key, value) in obj {
        if let Some(count) = count_from(value, field)? {
            counts.insert(key.clone(), count);
        }
    }
    Ok(Some(counts))
}

fn count_from(value: &serde_json::Value, field: &str) -> Result<Option<i64>> {
    let overflow = || ReportError::CountOverflowError {
        field: field.to_string(),
    };

    if let Some(count) = value.as_i64() {
        return Ok(Some(count));
    }
    if value.is_u64() {
        return Err(overflow());
    }
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 => {
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            if n >= i64::MIN as f64 && n < i64::MAX as f64 {
                Ok(Some(n as i64))
            } else {
                Err(overflow())
            }
        }
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    pub process_status: String,
    pub total_consolidado: i64,
    pub tipo_creacion: Counts,
    pub tipo_proceso: Counts,
    pub tipo_autenticacion: Counts,
    pub consolidados: Counts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionSummary {
    pub total_signatures: i64,
    pub total_processes: i64,
    pub total_processes_signed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthPoint {
    /// Original `YYYYMM` key.
    pub month: String,
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthLabel {
    /// "January"
    #[default]
    Month,
    /// "January 2024"
    MonthYear,
}

/// How repeated `processStatus` values are resolved before per-status lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStatusPolicy {
    #[default]
    Merge,
    Reject,
}

/// Label/count slice feeding a single bar or donut chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub dimension: String,
    pub entries: Vec<(String, i64)>,
}

impl Breakdown {
    /// `None` when the sum does not fit in an `i64`.
    pub fn total(&self) -> Option<i64> {
        self.entries
            .iter()
            .try_fold(0i64, |total, (_, count)| total.checked_add(*count))
    }

    pub fn has_results(&self) -> bool {
        self.total() != Some(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub process_status: String,
    pub total_consolidado: i64,
    pub months: Vec<MonthPoint>,
    pub creation: Breakdown,
    pub process_type: Breakdown,
    pub authentication: Breakdown,
}

/// One NIT of the all-consumption response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenantConsumption {
    #[serde(deserialize_with = "string_or_number")]
    pub nit: String,
    pub consumption: TenantUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantUsage {
    #[serde(default)]
    pub total_amount_consumption: i64,
    #[serde(default)]
    pub firma_seguro_method: Vec<MethodUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodUsage {
    pub balance_type_id: i64,
    pub signature_method_id: i64,
    pub authentication_method_id: i64,
    pub amount_consumed: i64,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Nit {
        Text(String),
        Number(i64),
    }

    Ok(match Nit::deserialize(deserializer)? {
        Nit::Text(text) => text,
        Nit::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodUsageRow {
    pub nit: String,
    pub total_amount_consumption: i64,
    pub balance_type_id: i64,
    pub signature_method_id: i64,
    pub authentication_method_id: i64,
    pub amount_consumed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthenticationMethod {
    Llamada,
    Sms,
    Email,
    WhatsApp,
}

impl AuthenticationMethod {
    pub const ALL: [AuthenticationMethod; 4] = [
        AuthenticationMethod::Llamada,
        AuthenticationMethod::Sms,
        AuthenticationMethod::Email,
        AuthenticationMethod::WhatsApp,
    ];

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Llamada),
            2 => Some(Self::Sms),
            3 => Some(Self::Email),
            4 => Some(Self::WhatsApp),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Llamada => "Llamada",
            Self::Sms => "SMS",
            Self::Email => "Email",
            Self::WhatsApp => "WhatsApp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthMethodCount {
    pub method: String,
    pub count: i64,
}

/// Raw responses of one run, handed from extract to transform.
#[derive(Debug, Clone, Default)]
pub struct ExtractedConsumption {
    pub nit: Option<String>,
    pub status_records: Vec<serde_json::Value>,
    pub tenants: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionReport {
    pub nit: Option<String>,
    pub dropped_records: usize,
    pub summary: ConsumptionSummary,
    pub rows: Vec<NormalizedRow>,
    pub status_reports: Vec<StatusReport>,
    pub method_usage: Vec<MethodUsageRow>,
    pub authentication: Vec<AuthMethodCount>,
}
