use crate::utils::error::{ReportError, Result};
use chrono::NaiveDate;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ReportError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ReportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Parses a `YYYY-MM-DD` query date.
pub fn validate_date(field_name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| ReportError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Expected YYYY-MM-DD: {}", e),
    })
}

pub fn validate_date_range(initial: (&str, &str), last: (&str, &str)) -> Result<()> {
    let start = validate_date(initial.0, initial.1)?;
    let end = validate_date(last.0, last.1)?;

    if start > end {
        return Err(ReportError::InvalidConfigValueError {
            field: last.0.to_string(),
            value: last.1.to_string(),
            reason: format!("Must not be before {} ({})", initial.0, initial.1),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api.base_url", "https://example.com").is_ok());
        assert!(validate_url("api.base_url", "http://example.com").is_ok());
        assert!(validate_url("api.base_url", "").is_err());
        assert!(validate_url("api.base_url", "invalid-url").is_err());
        assert!(validate_url("api.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_date() {
        assert_eq!(
            validate_date("query.initial_date", "2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(validate_date("query.initial_date", "2023-02-29").is_err());
        assert!(validate_date("query.initial_date", "20240101").is_err());
    }

    #[test]
    fn test_validate_date_range() {
        let initial = ("query.initial_date", "2024-01-01");
        assert!(validate_date_range(initial, ("query.final_date", "2024-01-01")).is_ok());
        assert!(validate_date_range(initial, ("query.final_date", "2024-08-28")).is_ok());
        assert!(validate_date_range(initial, ("query.final_date", "2023-12-31")).is_err());
    }

    #[test]
    fn test_validate_range_and_strings() {
        assert!(validate_range("api.timeout_seconds", 30u64, 1, 600).is_ok());
        assert!(validate_range("api.timeout_seconds", 0u64, 1, 600).is_err());
        assert!(validate_non_empty_string("auth.email", "   ").is_err());
        assert!(validate_path("load.output_path", "").is_err());
    }
}
