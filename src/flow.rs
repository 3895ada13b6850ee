// Booking flow controller
// Quotes the selected stay, tokenizes the card with the payment provider, then submits the booking.
// Tokenization and submission are the only suspension points and always run in that order.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::display::ChargeSummary;
use crate::notify::Notifier;
use crate::payment::{CardDetails, PaymentClient, PaymentError};
use crate::quote::{compute_price_quote, PriceQuote, QuoteError};
use crate::repository::{ApiError, BookingRepository, BookingRequest, RequestError};

pub const SUCCESS_TITLE: &str = "You've successfully booked the listing!";
pub const SUCCESS_DETAIL: &str = "Booking history can always be found in your User page";
pub const CONNECTION_UNAVAILABLE_MESSAGE: &str =
    "Sorry! We weren't able to connect with the payment provider.";
pub const TOKENIZATION_FALLBACK_MESSAGE: &str =
    "Sorry! We weren't able to book the listing. Please try again later.";
pub const BOOKING_FAILED_MESSAGE: &str =
    "Sorry! We weren't able to successfully book the listing. Please try again later.";
pub const IN_PROGRESS_MESSAGE: &str = "A booking request is already in progress.";

// Rejected when the flow is built, before any card is tokenized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Listing id is empty")]
    EmptyListingId,

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Payment provider session unavailable")]
    ConnectionUnavailable,

    #[error("Tokenization failed: {0}")]
    TokenizationFailed(#[from] PaymentError),

    #[error("Booking submission failed: {0}")]
    SubmissionFailed(#[from] ApiError),

    #[error("Invalid booking request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Booking submission already in progress")]
    InProgress,
}

impl BookingError {
    pub fn user_message(&self) -> String {
        match self {
            BookingError::ConnectionUnavailable => CONNECTION_UNAVAILABLE_MESSAGE.to_string(),
            BookingError::TokenizationFailed(error) => error
                .provider_message()
                .unwrap_or(TOKENIZATION_FALLBACK_MESSAGE)
                .to_string(),
            BookingError::SubmissionFailed(_) | BookingError::InvalidRequest(_) => {
                BOOKING_FAILED_MESSAGE.to_string()
            }
            BookingError::InProgress => IN_PROGRESS_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Success,
    Failure(String),
}

impl BookingOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BookingOutcome::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    AwaitingTokenization,
    AwaitingApiResponse,
    NotifiedSuccess,
    NotifiedFailure,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::AwaitingTokenization => "awaiting_tokenization",
            FlowState::AwaitingApiResponse => "awaiting_api_response",
            FlowState::NotifiedSuccess => "notified_success",
            FlowState::NotifiedFailure => "notified_failure",
        };
        f.write_str(name)
    }
}

/// Callbacks into the page that owns the date selection.
#[async_trait]
pub trait BookingHost: Send + Sync + 'static {
    /// Clears the selected check-in/check-out dates after a successful booking.
    fn clear_booking_data(&self);

    /// Reloads the listing so the newly booked dates show as unavailable.
    async fn refetch_listing(&self) -> anyhow::Result<()>;
}

pub struct BookingServices {
    // None when the payment provider failed to load
    pub payment: Option<Arc<dyn PaymentClient>>,
    pub repository: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub host: Arc<dyn BookingHost>,
}

#[derive(Debug, Clone, Copy)]
struct Stay {
    check_in: NaiveDate,
    check_out: NaiveDate,
    quote: PriceQuote,
}

pub struct BookingFlow {
    listing_id: String,
    nightly_price: u64,
    stay: Mutex<Stay>,
    state: Mutex<FlowState>,
    modal_visible: AtomicBool,
    services: BookingServices,
}

// Returns the flow to Idle when a submission finishes or its future is dropped
struct SubmissionGuard<'a> {
    listing_id: &'a str,
    state: &'a Mutex<FlowState>,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        set_state(self.state, self.listing_id, FlowState::Idle);
    }
}

fn set_state(state: &Mutex<FlowState>, listing_id: &str, next: FlowState) {
    *state.lock() = next;
    debug!(listing_id = %listing_id, state = %next, "Flow state changed");
}

impl BookingFlow {
    pub fn new(
        listing_id: impl Into<String>,
        nightly_price: u64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        services: BookingServices,
    ) -> Result<Self, SetupError> {
        let listing_id = listing_id.into();
        if listing_id.trim().is_empty() {
            return Err(SetupError::EmptyListingId);
        }
        let quote = compute_price_quote(check_in, check_out, nightly_price)?;

        Ok(Self {
            listing_id,
            nightly_price,
            stay: Mutex::new(Stay {
                check_in,
                check_out,
                quote,
            }),
            state: Mutex::new(FlowState::Idle),
            modal_visible: AtomicBool::new(false),
            services,
        })
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn quote(&self) -> PriceQuote {
        self.stay.lock().quote
    }

    pub fn dates(&self) -> (NaiveDate, NaiveDate) {
        let stay = self.stay.lock();
        (stay.check_in, stay.check_out)
    }

    /// Recomputes the quote for new dates. An invalid range leaves the previous
    /// selection in place.
    pub fn set_dates(
        &self,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<PriceQuote, QuoteError> {
        let quote = compute_price_quote(check_in, check_out, self.nightly_price)?;
        *self.stay.lock() = Stay {
            check_in,
            check_out,
            quote,
        };
        debug!(
            listing_id = %self.listing_id,
            nights = quote.nights_booked,
            total = quote.total_price,
            "Quote updated"
        );
        Ok(quote)
    }

    pub fn charge_summary(&self) -> ChargeSummary {
        let stay = *self.stay.lock();
        ChargeSummary::new(stay.check_in, stay.check_out, &stay.quote)
    }

    pub fn state(&self) -> FlowState {
        *self.state.lock()
    }

    pub fn is_loading(&self) -> bool {
        self.state() != FlowState::Idle
    }

    pub fn open_modal(&self) {
        self.modal_visible.store(true, Ordering::SeqCst);
    }

    pub fn close_modal(&self) {
        self.modal_visible.store(false, Ordering::SeqCst);
    }

    pub fn is_modal_visible(&self) -> bool {
        self.modal_visible.load(Ordering::SeqCst)
    }

    pub async fn submit_booking(&self, card: &CardDetails) -> BookingOutcome {
        let Some(_guard) = self.begin_submission() else {
            warn!(listing_id = %self.listing_id, "Ignoring submission while another is in flight");
            return BookingOutcome::Failure(BookingError::InProgress.user_message());
        };

        match self.run_submission(card).await {
            Ok(()) => BookingOutcome::Success,
            Err(error) => {
                self.transition(FlowState::NotifiedFailure);
                warn!(listing_id = %self.listing_id, error = %error, "Booking failed");

                let message = error.user_message();
                self.services.notifier.error(&message);
                BookingOutcome::Failure(message)
            }
        }
    }

    fn begin_submission(&self) -> Option<SubmissionGuard<'_>> {
        let mut state = self.state.lock();
        if *state != FlowState::Idle {
            return None;
        }
        *state = FlowState::AwaitingTokenization;
        debug!(listing_id = %self.listing_id, state = %*state, "Flow state changed");

        Some(SubmissionGuard {
            listing_id: &self.listing_id,
            state: &self.state,
        })
    }

    fn transition(&self, next: FlowState) {
        set_state(&self.state, &self.listing_id, next);
    }

    async fn run_submission(&self, card: &CardDetails) -> Result<(), BookingError> {
        let (check_in, check_out) = self.dates();

        let payment = self
            .services
            .payment
            .as_ref()
            .ok_or(BookingError::ConnectionUnavailable)?;
        let token = payment.tokenize(card).await?;

        let request = BookingRequest::new(self.listing_id.as_str(), check_in, check_out, token)?;

        self.transition(FlowState::AwaitingApiResponse);
        let confirmation = self.services.repository.create_booking(request).await?;
        info!(
            listing_id = %self.listing_id,
            booking_id = %confirmation.id,
            %check_in,
            %check_out,
            "Listing booked"
        );

        self.services.host.clear_booking_data();
        self.transition(FlowState::NotifiedSuccess);
        self.services.notifier.success(SUCCESS_TITLE, SUCCESS_DETAIL);

        // The booking already succeeded; a failed refresh only leaves stale availability on screen
        if let Err(error) = self.services.host.refetch_listing().await {
            warn!(listing_id = %self.listing_id, error = %error, "Listing refetch failed");
        }

        Ok(())
    }
}
