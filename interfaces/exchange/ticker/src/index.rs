use std::str::FromStr;

use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://bittrex.com";

#[derive(Debug, Clone)]
pub struct TickerClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct TickerResponse {
    result: Option<TickerResult>,
}

#[derive(Deserialize)]
struct TickerResult {
    #[serde(rename = "Last")]
    last: Option<Value>,
}

impl Default for TickerClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TickerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Last traded price for a pair written `QUOTE_BASE`, e.g. `USDT_BTC`.
    pub async fn get_price(&self, pair: &str) -> Result<Decimal, GetPriceError> {
        let market = market_name(pair)?;
        let ticker_url = format!("{}/api/v1.1/public/getticker", self.base_url);

        debug!(%ticker_url, %market, "fetching ticker");

        let response = self
            .http
            .get(&ticker_url)
            .query(&[("market", market.as_str())])
            .send()
            .await
            .map_err(|source| GetPriceError::RequestSend { source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GetPriceError::HttpStatus { status });
        }

        let body = response
            .text()
            .await
            .map_err(|source| GetPriceError::ResponseRead { source })?;

        let parsed: TickerResponse = serde_json::from_str(&body)
            .map_err(|source| GetPriceError::DeserializeResponseBody { source })?;

        parsed
            .result
            .and_then(|result| result.last)
            .and_then(|last| decimal_from_value(&last))
            .ok_or(GetPriceError::TickerData { market })
    }
}

/// `USDT_BTC` becomes the exchange market name `USDT-BTC`.
pub fn market_name(pair: &str) -> Result<String, GetPriceError> {
    match pair.split_once('_') {
        Some((quote, base)) if !quote.is_empty() && !base.is_empty() => {
            Ok(format!("{quote}-{base}"))
        }
        _ => Err(GetPriceError::InvalidPair {
            pair: pair.to_string(),
        }),
    }
}

fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[derive(Debug, Error)]
pub enum GetPriceError {
    #[error("InvalidPair: {pair}")]
    InvalidPair {
        pair: String,
    },

    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("HttpStatus: {status}")]
    HttpStatus {
        status: StatusCode,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("DeserializeResponseBody: {source}")]
    DeserializeResponseBody {
        source: serde_json::Error,
    },

    #[error("error reading ticker data for {market}")]
    TickerData {
        market: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pair_maps_to_market() {
        assert_eq!(market_name("USDT_BTC").unwrap(), "USDT-BTC");
        assert_eq!(market_name("BTC_XZC").unwrap(), "BTC-XZC");
        assert!(market_name("BTCXZC").is_err());
        assert!(market_name("_XZC").is_err());
    }

    #[test]
    fn last_accepts_numbers_strings_and_exponents() {
        assert_eq!(
            decimal_from_value(&json!(0.00123)),
            Some(Decimal::from_str("0.00123").unwrap())
        );
        assert_eq!(
            decimal_from_value(&json!("6500.5")),
            Some(Decimal::from_str("6500.5").unwrap())
        );
        assert_eq!(
            decimal_from_value(&json!("1.5e-5")),
            Some(Decimal::from_str("0.000015").unwrap())
        );
        assert_eq!(decimal_from_value(&json!(null)), None);
    }
}
