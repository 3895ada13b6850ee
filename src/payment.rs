// Payment provider tokenization
// Card details are exchanged for a single-use token so the booking API never sees card data

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Payment provider rejected the card: {message}")]
    Rejected { message: String },

    #[error("Payment provider returned no token")]
    MissingToken,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    Decode(String),
}

impl PaymentError {
    // The provider's own message, suitable for showing to the user
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            PaymentError::Rejected { message } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

// Raw card input, as captured by the card entry widget
#[derive(Clone)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        let last_four: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        f.debug_struct("CardDetails")
            .field("number", &format!("**** {}", last_four))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentToken(String);

impl PaymentToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait PaymentClient: Send + Sync + 'static {
    async fn tokenize(&self, card: &CardDetails) -> Result<PaymentToken, PaymentError>;
}

// Provider response: either a token object or an error object
#[derive(Debug, Deserialize)]
struct TokenResponse {
    id: Option<String>,
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: Option<String>,
}

pub fn parse_token_response(body: &str) -> Result<PaymentToken, PaymentError> {
    let response: TokenResponse =
        serde_json::from_str(body).map_err(|e| PaymentError::Decode(e.to_string()))?;

    if let Some(error) = response.error {
        return Err(PaymentError::Rejected {
            message: error.message.unwrap_or_default(),
        });
    }

    match response.id {
        Some(id) if !id.is_empty() => Ok(PaymentToken::new(id)),
        _ => Err(PaymentError::MissingToken),
    }
}

// Tokenizes cards against a Stripe-compatible `/v1/tokens` endpoint
pub struct StripePaymentClient {
    http: reqwest::Client,
    tokens_url: String,
    publishable_key: String,
}

impl StripePaymentClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Ok(Self {
            http,
            tokens_url: config.tokens_url(),
            publishable_key: config.payment_publishable_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentClient for StripePaymentClient {
    async fn tokenize(&self, card: &CardDetails) -> Result<PaymentToken, PaymentError> {
        let form = [
            ("card[number]", card.number.clone()),
            ("card[exp_month]", card.exp_month.to_string()),
            ("card[exp_year]", card.exp_year.to_string()),
            ("card[cvc]", card.cvc.clone()),
        ];
        let idempotency_key = format!("tok-{:016x}", rand::random::<u64>());

        debug!(url = %self.tokens_url, card = ?card, "Requesting payment token");

        let response = self
            .http
            .post(&self.tokens_url)
            .bearer_auth(&self.publishable_key)
            .header("Idempotency-Key", idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        // Declines come back as 4xx with an error object; parse them either way
        let result = parse_token_response(&body);
        if let Err(ref error) = result {
            warn!(status = status.as_u16(), error = %error, "Tokenization failed");
        }
        result
    }
}
