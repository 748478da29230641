//! Common test fixtures

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// String fixtures for names that appear throughout the tests
pub struct StringFixtures;

impl StringFixtures {
    pub fn customer_name() -> &'static str {
        "Acme Traders"
    }

    pub fn party_name() -> &'static str {
        "Acme"
    }

    pub fn item_name() -> &'static str {
        "Widget"
    }
}

/// Monetary fixtures
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn standard_rate() -> Decimal {
        dec!(100)
    }

    pub fn standard_gst_percent() -> Decimal {
        dec!(18)
    }
}

/// Date fixtures
pub struct TemporalFixtures;

impl TemporalFixtures {
    pub fn invoice_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid fixture date")
    }

    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).expect("valid fixture date")
    }
}
