use crate::domain::model::{
    AuthMethodCount, AuthenticationMethod, MethodUsageRow, TenantConsumption,
};
use crate::core::normalizer::checked_sum;
use crate::utils::error::{ReportError, Result};

/// Decodes the all-consumption response, which must be a JSON array.
pub fn parse_tenants(value: &serde_json::Value) -> Result<Vec<TenantConsumption>> {
    let items = value.as_array().ok_or_else(|| ReportError::UnexpectedResponseError {
        message: "all-consumption response is not a JSON array".to_string(),
    })?;

    items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).map_err(ReportError::from))
        .collect()
}

/// One row per signature-method usage, in input order.
pub fn flatten_tenants(tenants: &[TenantConsumption]) -> Vec<MethodUsageRow> {
    tenants
        .iter()
        .flat_map(|tenant| {
            tenant
                .consumption
                .firma_seguro_method
                .iter()
                .map(move |method| MethodUsageRow {
                    nit: tenant.nit.clone(),
                    total_amount_consumption: tenant.consumption.total_amount_consumption,
                    balance_type_id: method.balance_type_id,
                    signature_method_id: method.signature_method_id,
                    authentication_method_id: method.authentication_method_id,
                    amount_consumed: method.amount_consumed,
                })
        })
        .collect()
}

/// Amount consumed per authentication method for one NIT. Always lists the
/// four known methods; unknown method ids are ignored.
pub fn authentication_breakdown(
    tenants: &[TenantConsumption],
    nit: &str,
) -> Result<Vec<AuthMethodCount>> {
    let usages = tenants
        .iter()
        .find(|tenant| tenant.nit == nit)
        .map(|tenant| tenant.consumption.firma_seguro_method.as_slice())
        .unwrap_or_default();

    AuthenticationMethod::ALL
        .iter()
        .map(|&method| {
            let consumed = usages
                .iter()
                .filter(|usage| {
                    AuthenticationMethod::from_id(usage.authentication_method_id) == Some(method)
                })
                .map(|usage| usage.amount_consumed);

            Ok(AuthMethodCount {
                method: method.label().to_string(),
                count: checked_sum(consumed, "amountConsumed")?,
            })
        })
        .collect()
}
