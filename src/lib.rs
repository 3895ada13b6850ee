// Listing booking: price quoting and the payment-confirmation flow for a rental listing

pub mod config;
pub mod display;
pub mod flow;
pub mod notify;
pub mod payment;
pub mod quote;
pub mod repository;

// Re-export key types for convenience
pub use config::{ClientConfig, ConfigError};
pub use display::{format_listing_price, format_long_date, ChargeSummary};
pub use flow::{
    BookingError, BookingFlow, BookingHost, BookingOutcome, BookingServices, FlowState, SetupError,
};
pub use notify::{Notifier, TracingNotifier};
pub use payment::{CardDetails, PaymentClient, PaymentError, PaymentToken, StripePaymentClient};
pub use quote::{compute_price_quote, PriceQuote, QuoteError};
pub use repository::{
    ApiError, BookingConfirmation, BookingRepository, BookingRequest, CreateBookingInput,
    GraphQlBookingRepository, RequestError,
};
