use crate::config::toml_config::ReportConfig;
use crate::core::ConsumptionApi;
use crate::utils::error::{ReportError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SIGN_IN_PATH: &str = "Auth/SignIn";
const ALL_CONSUMPTION_PATH: &str = "Balance/get-all-consumption";
const CONSUMPTION_BY_NIT_PATH: &str = "Balance/get-all-consumption-by-nit";

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SignInResponse {
    access_token: Option<String>,
}

/// Client for the FirmaSeguro balance API.
#[derive(Clone)]
pub struct FirmaSeguroClient {
    client: Client,
    base_url: String,
    email: String,
    password: String,
    initial_date: String,
    final_date: String,
    user_app_id: i64,
}

impl FirmaSeguroClient {
    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.api.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            email: config.auth.email.clone(),
            password: config.auth.password.clone(),
            initial_date: config.query.initial_date.clone(),
            final_date: config.query.final_date.clone(),
            user_app_id: config.query.user_app_id.unwrap_or(0),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<serde_json::Value> {
        let endpoint = self.endpoint(path);
        tracing::debug!("GET {} {:?}", endpoint, query);

        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        if !status.is_success() {
            return Err(ReportError::ApiStatusError {
                endpoint,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    fn date_range(&self) -> [(&'static str, String); 2] {
        [
            ("initial_date", self.initial_date.clone()),
            ("final_date", self.final_date.clone()),
        ]
    }
}

impl ConsumptionApi for FirmaSeguroClient {
    async fn authenticate(&self) -> Result<String> {
        let endpoint = self.endpoint(SIGN_IN_PATH);
        tracing::debug!("Signing in at {} as {}", endpoint, self.email);

        let response = self
            .client
            .post(&endpoint)
            .json(&SignInRequest {
                email: &self.email,
                password: &self.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::AuthError {
                message: format!("sign-in returned {}", response.status()),
            });
        }

        let body: SignInResponse = response.json().await?;
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ReportError::AuthError {
                message: "sign-in response has no access_token".to_string(),
            })
    }

    async fn fetch_all_consumption(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json(token, ALL_CONSUMPTION_PATH, &self.date_range())
            .await
    }

    async fn fetch_consumption_by_nit(&self, token: &str, nit: &str) -> Result<serde_json::Value> {
        let [initial, last] = self.date_range();
        let query = [
            ("nit", nit.to_string()),
            ("userAppId", self.user_app_id.to_string()),
            initial,
            last,
        ];
        self.get_json(token, CONSUMPTION_BY_NIT_PATH, &query).await
    }
}
