use crate::core::config::AppConfig;
use crate::core::currency::{CurrencyCode, ExchangeRate, FetchError, RateSource};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// What the response must look like before a rate is taken from it.
#[derive(Debug, Clone)]
pub struct ResponseValidation {
    /// Require `base` to equal the requested currency rather than merely exist.
    pub match_base: bool,
    /// Key that must be present in `rates`.
    pub required_rate: CurrencyCode,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: Option<String>,
    rates: Option<HashMap<String, f64>>,
}

/// Rate source for the bankersalgo rates API: `GET {base_url}{access_key}/{from}`.
pub struct BankersAlgoProvider {
    base_url: String,
    access_key: String,
    from: CurrencyCode,
    to: CurrencyCode,
    validation: ResponseValidation,
    client: reqwest::Client,
}

impl BankersAlgoProvider {
    pub fn new(
        base_url: &str,
        access_key: &str,
        from: CurrencyCode,
        to: CurrencyCode,
        validation: ResponseValidation,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ratewatch/1.0")
            .timeout(timeout)
            .build()?;
        Ok(BankersAlgoProvider {
            base_url: base_url.to_string(),
            access_key: access_key.to_string(),
            from,
            to,
            validation,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            &config.api.base_url,
            &config.api.access_key,
            config.pair.from.clone(),
            config.pair.to.clone(),
            ResponseValidation {
                match_base: config.validation.match_base,
                required_rate: config.required_rate().clone(),
            },
            config.api.timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}{}/{}", self.base_url, self.access_key, self.from)
    }

    fn validate(&self, response: &RatesResponse) -> Result<(), FetchError> {
        let base = response
            .base
            .as_deref()
            .ok_or_else(|| FetchError::Malformed("missing 'base'".to_string()))?;
        if self.validation.match_base && !base.eq_ignore_ascii_case(self.from.as_str()) {
            return Err(FetchError::Malformed(format!(
                "base '{}' does not match requested currency {}",
                base, self.from
            )));
        }

        let rates = response
            .rates
            .as_ref()
            .ok_or_else(|| FetchError::Malformed("missing 'rates'".to_string()))?;
        if !rates.contains_key(self.validation.required_rate.as_str()) {
            return Err(FetchError::Malformed(format!(
                "'rates' has no entry for {}",
                self.validation.required_rate
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RateSource for BankersAlgoProvider {
    #[instrument(name = "RateFetch", skip(self))]
    async fn fetch(&self) -> Result<ExchangeRate, FetchError> {
        // The URL carries the access key; keep it out of the logs
        debug!(
            base_url = %self.base_url,
            from = %self.from,
            to = %self.to,
            "Requesting exchange rate"
        );

        let response = self
            .client
            .get(self.url())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The status is the diagnosis; an unreadable body must not hide it
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;

        let data: RatesResponse = serde_json::from_str(&text).map_err(|e| {
            FetchError::Malformed(format!("invalid JSON: {e}. Response: '{text}'"))
        })?;
        self.validate(&data)?;

        let value = data
            .rates
            .as_ref()
            .and_then(|rates| rates.get(self.to.as_str()))
            .copied()
            .ok_or_else(|| {
                FetchError::Malformed(format!("'rates' has no entry for {}", self.to))
            })?;

        debug!(value, "Received exchange rate");
        Ok(ExchangeRate {
            base: self.from.clone(),
            quote: self.to.clone(),
            value,
        })
    }
}
