use super::RateProvider;
use crate::error::{CoreError, RateError, Result};
use regex::Regex;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Scrapes the percentage from a published HTML page
pub struct HttpRateProvider {
    url: String,
    pattern: Regex,
    client: reqwest::blocking::Client,
}

impl HttpRateProvider {
    pub fn new(url: &str, label: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CoreError::config(format!("Failed to create HTTP client: {}", e)))?;

        let pattern = label_pattern(label)
            .map_err(|e| CoreError::config(format!("Invalid rate label: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            pattern,
            client,
        })
    }
}

impl RateProvider for HttpRateProvider {
    fn fetch_rate(&self) -> std::result::Result<f64, RateError> {
        tracing::info!("Fetching rate from {}", self.url);

        let body = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .text()?;

        let rate = extract_rate(&self.pattern, &body)?;
        tracing::info!("Fetched rate from {}: {}%", self.url, rate);
        Ok(rate)
    }
}

/// First `12,34` / `12.34` numeral following `label`, across line breaks
fn label_pattern(label: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?s){}.*?(\d+[,.]\d{{2}})", regex::escape(label)))
}

fn extract_rate(pattern: &Regex, text: &str) -> std::result::Result<f64, RateError> {
    let raw = pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(RateError::NotFound)?
        .as_str();

    let rate: f64 = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| RateError::InvalidValue(raw.to_string()))?;

    if rate <= 0.0 {
        return Err(RateError::InvalidValue(raw.to_string()));
    }

    Ok(rate)
}

/// Parse the percentage out of free-form page text
pub fn parse_rate(text: &str, label: &str) -> std::result::Result<f64, RateError> {
    let pattern = label_pattern(label).map_err(|e| RateError::InvalidValue(e.to_string()))?;
    extract_rate(&pattern, text)
}
