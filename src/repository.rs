// Booking creation API
// The flow talks to a narrow repository trait; the GraphQL transport is one implementation of it

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::payment::PaymentToken;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("API error: {status_code} - {message}")]
    ApiResponseError { status_code: u16, message: String },

    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Invalid API response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Listing id is empty")]
    EmptyListingId,

    #[error("Check-out date {check_out} is before check-in date {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

// Built fresh for each submission attempt
#[derive(Debug, Clone)]
pub struct BookingRequest {
    listing_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    payment_token: PaymentToken,
}

impl BookingRequest {
    pub fn new(
        listing_id: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        payment_token: PaymentToken,
    ) -> Result<Self, RequestError> {
        let listing_id = listing_id.into();
        if listing_id.trim().is_empty() {
            return Err(RequestError::EmptyListingId);
        }
        if check_out < check_in {
            return Err(RequestError::CheckOutBeforeCheckIn {
                check_in,
                check_out,
            });
        }

        Ok(Self {
            listing_id,
            check_in,
            check_out,
            payment_token,
        })
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn payment_token(&self) -> &PaymentToken {
        &self.payment_token
    }

    pub fn to_input(&self) -> CreateBookingInput {
        CreateBookingInput {
            source: self.payment_token.as_str().to_string(),
            check_in: format_calendar_date(self.check_in),
            check_out: format_calendar_date(self.check_out),
            id: self.listing_id.clone(),
        }
    }
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// Wire shape of the `createBooking` mutation input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingInput {
    pub source: String,
    pub check_in: String,
    pub check_out: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookingConfirmation {
    pub id: String,
}

#[async_trait]
pub trait BookingRepository: Send + Sync + 'static {
    async fn create_booking(
        &self,
        request: BookingRequest,
    ) -> Result<BookingConfirmation, ApiError>;
}

pub const CREATE_BOOKING_MUTATION: &str = "mutation CreateBooking($input: CreateBookingInput!) {
  createBooking(input: $input) {
    id
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingData {
    create_booking: Option<BookingConfirmation>,
}

pub fn build_create_booking_body(request: &BookingRequest) -> serde_json::Value {
    serde_json::json!({
        "query": CREATE_BOOKING_MUTATION,
        "variables": { "input": request.to_input() },
    })
}

pub fn parse_create_booking_response(body: &str) -> Result<BookingConfirmation, ApiError> {
    let response: GraphQlResponse<CreateBookingData> =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(ApiError::GraphQl(
            errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    response
        .data
        .and_then(|data| data.create_booking)
        .ok_or_else(|| ApiError::Decode("missing data.createBooking".to_string()))
}

pub struct GraphQlBookingRepository {
    http: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl GraphQlBookingRepository {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.graphql_url(),
            timeout_ms: config.timeout_ms,
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.timeout_ms)
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }
}

#[async_trait]
impl BookingRepository for GraphQlBookingRepository {
    async fn create_booking(
        &self,
        request: BookingRequest,
    ) -> Result<BookingConfirmation, ApiError> {
        debug!(
            endpoint = %self.endpoint,
            listing_id = request.listing_id(),
            "Sending createBooking mutation"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(&build_create_booking_body(&request))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "createBooking returned an error status");
            // GraphQL servers often put the useful message in the body even on 4xx/5xx
            return match parse_create_booking_response(&body) {
                Err(ApiError::GraphQl(messages)) => Err(ApiError::ApiResponseError {
                    status_code: status.as_u16(),
                    message: messages.join("; "),
                }),
                _ => Err(ApiError::ApiResponseError {
                    status_code: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("unknown").to_string(),
                }),
            };
        }

        parse_create_booking_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request() -> BookingRequest {
        BookingRequest::new(
            "listing-1",
            date(2020, 1, 10),
            date(2020, 1, 12),
            PaymentToken::new("tok_abc"),
        )
        .unwrap()
    }

    #[test]
    fn test_request_rejects_empty_listing() {
        let result = BookingRequest::new(
            "  ",
            date(2020, 1, 10),
            date(2020, 1, 12),
            PaymentToken::new("tok_abc"),
        );
        assert_eq!(result.unwrap_err(), RequestError::EmptyListingId);
    }

    #[test]
    fn test_request_rejects_reversed_dates() {
        let result = BookingRequest::new(
            "listing-1",
            date(2020, 1, 12),
            date(2020, 1, 10),
            PaymentToken::new("tok_abc"),
        );
        assert!(matches!(
            result,
            Err(RequestError::CheckOutBeforeCheckIn { .. })
        ));
    }

    #[test]
    fn test_input_uses_calendar_dates() {
        let input = request().to_input();

        assert_eq!(
            input,
            CreateBookingInput {
                source: "tok_abc".to_string(),
                check_in: "2020-01-10".to_string(),
                check_out: "2020-01-12".to_string(),
                id: "listing-1".to_string(),
            }
        );
    }

    #[test]
    fn test_mutation_body_shape() {
        let body = build_create_booking_body(&request());

        assert_eq!(body["query"], CREATE_BOOKING_MUTATION);
        assert_eq!(
            body["variables"]["input"],
            serde_json::json!({
                "source": "tok_abc",
                "checkIn": "2020-01-10",
                "checkOut": "2020-01-12",
                "id": "listing-1",
            })
        );
    }

    #[test]
    fn test_parse_confirmation() {
        let confirmation =
            parse_create_booking_response(r#"{"data": {"createBooking": {"id": "booking-9"}}}"#)
                .unwrap();
        assert_eq!(confirmation.id, "booking-9");
    }

    #[test]
    fn test_parse_graphql_errors() {
        let err = parse_create_booking_response(
            r#"{"data": null, "errors": [{"message": "listing can't be booked"}, {"message": "second"}]}"#,
        )
        .unwrap_err();

        match err {
            ApiError::GraphQl(messages) => {
                assert_eq!(messages, vec!["listing can't be booked", "second"]);
            }
            other => panic!("Expected GraphQL error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_data() {
        let err = parse_create_booking_response(r#"{"data": {"createBooking": null}}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
