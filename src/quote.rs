// Price quote for a stay: nightly price times the inclusive number of nights

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("Check-out date {check_out} is before check-in date {check_in}")]
    CheckOutBeforeCheckIn {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("Price overflow: {nightly_price} x {nights} nights")]
    Overflow { nightly_price: u64, nights: i64 },
}

// All amounts are integer minor currency units (cents)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub nightly_price: u64,
    pub nights_booked: u32,
    pub total_price: u64,
}

/// Computes the quote for a stay. Both endpoints count as booked days, so a
/// same-day check-in/check-out is one night.
pub fn compute_price_quote(
    check_in: NaiveDate,
    check_out: NaiveDate,
    nightly_price: u64,
) -> Result<PriceQuote, QuoteError> {
    if check_out < check_in {
        return Err(QuoteError::CheckOutBeforeCheckIn {
            check_in,
            check_out,
        });
    }

    let nights = (check_out - check_in).num_days() + 1;
    let overflow = || QuoteError::Overflow {
        nightly_price,
        nights,
    };

    let nights_booked = u32::try_from(nights).map_err(|_| overflow())?;
    let total_price = nightly_price
        .checked_mul(u64::from(nights_booked))
        .ok_or_else(overflow)?;

    Ok(PriceQuote {
        nightly_price,
        nights_booked,
        total_price,
    })
}
