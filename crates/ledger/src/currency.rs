use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// ISO-like currency code carried by accounts and ledger rows.
///
/// Tillbook is effectively mono-currency per account (default `IDR`), but the
/// data model keeps currency explicit so rows stay self-describing.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// [`Money`](crate::Money)). `minor_units()` returns how many decimal digits
/// are used when converting between:
/// - major units (human input/output, e.g. `1,234.50 USD`)
/// - minor units (stored integers, e.g. `123450`)
///
/// IDR has no minor unit, so display and storage coincide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Idr,
    Usd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Idr => "IDR",
            Currency::Usd => "USD",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Idr => 0,
            Currency::Usd => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IDR" => Ok(Currency::Idr),
            "USD" => Ok(Currency::Usd),
            other => Err(LedgerError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
