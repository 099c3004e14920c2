use crate::core::ConfigProvider;
use crate::domain::model::{DuplicateStatusPolicy, MonthLabel};
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_FILENAME: &str = "consumption_report.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub report: ReportInfo,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub query: QueryConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// YYYY-MM-DD
    pub initial_date: String,
    /// YYYY-MM-DD
    pub final_date: String,
    pub nit: Option<String>,
    pub user_app_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default)]
    pub duplicate_status: DuplicateStatusPolicy,
    #[serde(default)]
    pub month_label: MonthLabel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_format: Option<String>,
}

impl ReportConfig {
    /// Loads and parses a TOML report configuration.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        validation::validate_non_empty_string("auth.email", &self.auth.email)?;
        validation::validate_non_empty_string("auth.password", &self.auth.password)?;
        validation::validate_date_range(
            ("query.initial_date", self.query.initial_date.as_str()),
            ("query.final_date", self.query.final_date.as_str()),
        )?;

        if let Some(nit) = &self.query.nit {
            validation::validate_non_empty_string("query.nit", nit)?;
        }
        if let Some(timeout) = self.api.timeout_seconds {
            validation::validate_range("api.timeout_seconds", timeout, 1, 600)?;
        }

        validation::validate_path("load.output_path", &self.load.output_path)?;
        if !self.output_filename().ends_with(".zip") {
            return Err(ReportError::InvalidConfigValueError {
                field: "load.filename".to_string(),
                value: self.output_filename().to_string(),
                reason: "Report bundles are ZIP archives; use a .zip filename".to_string(),
            });
        }

        if let Some(format) = self.log_format() {
            if !["compact", "json"].contains(&format) {
                return Err(ReportError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn log_format(&self) -> Option<&str> {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
    }
}

impl ConfigProvider for ReportConfig {
    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_filename(&self) -> &str {
        self.load.filename.as_deref().unwrap_or(DEFAULT_FILENAME)
    }

    fn nit(&self) -> Option<&str> {
        self.query.nit.as_deref()
    }

    fn duplicate_status_policy(&self) -> DuplicateStatusPolicy {
        self.normalize.duplicate_status
    }

    fn month_label(&self) -> MonthLabel {
        self.normalize.month_label
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
