//! SOL <-> lamport conversion.
//!
//! Prices live in the catalog as integer lamports. Decimal SOL strings only
//! appear at the edges: form input and display.

use ethers::types::U256;
use ethers::utils::{format_units, parse_units, ParseUnits};

use crate::errors::ValidationError;
use crate::models::Lamports;

pub const SOL_DECIMALS: u32 = 9;
pub const LAMPORTS_PER_SOL: Lamports = 1_000_000_000;

/// Digits shown after the decimal point when rendering a price.
const DISPLAY_DECIMALS: u32 = 4;

/// Parse a decimal SOL amount ("1.5") into lamports.
pub fn parse_sol(amount: &str) -> Result<Lamports, ValidationError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidPrice(amount.to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(ValidationError::NonPositivePrice);
    }

    let parsed = parse_units(trimmed, SOL_DECIMALS)
        .map_err(|_| ValidationError::InvalidPrice(amount.to_string()))?;

    match parsed {
        ParseUnits::U256(value) if value > U256::from(u64::MAX) => {
            Err(ValidationError::InvalidPrice(amount.to_string()))
        }
        ParseUnits::U256(value) => Ok(value.as_u64()),
        ParseUnits::I256(_) => Err(ValidationError::NonPositivePrice),
    }
}

/// Render lamports as SOL rounded to four decimals ("1.5000").
pub fn format_sol(lamports: Lamports) -> String {
    let step = LAMPORTS_PER_SOL / 10u64.pow(DISPLAY_DECIMALS);
    let rounded = lamports / step + u64::from(lamports % step >= step / 2);

    format_units(rounded, DISPLAY_DECIMALS).unwrap_or_else(|_| rounded.to_string())
}
