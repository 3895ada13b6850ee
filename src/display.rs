// Text shown in the booking modal's intro and charge summary

use chrono::{Datelike, NaiveDate};

use crate::quote::PriceQuote;

// Prices are stored in cents; the listing page shows whole dollars by default
pub fn format_listing_price(price: u64, round: bool) -> String {
    if round {
        format!("${}", price / 100 + u64::from(price % 100 >= 50))
    } else {
        format!("${}.{:02}", price / 100, price % 100)
    }
}

/// Formats a date as e.g. "January 10th 2020".
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{} {}", date.format("%B"), day, suffix, date.year())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeSummary {
    pub intro: String,
    pub breakdown: String,
    pub total: String,
}

impl ChargeSummary {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate, quote: &PriceQuote) -> Self {
        let total_price = format_listing_price(quote.total_price, true);

        Self {
            intro: format!(
                "Enter your payment information to book the listing for the dates between {} and {}, inclusive.",
                format_long_date(check_in),
                format_long_date(check_out)
            ),
            breakdown: format!(
                "{} * {} days = {}",
                format_listing_price(quote.nightly_price, true),
                quote.nights_booked,
                total_price
            ),
            total: format!("Total = {}", total_price),
        }
    }
}
