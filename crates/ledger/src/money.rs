use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::{Currency, LedgerError};

/// Signed money amount represented as **integer minor units**.
///
/// Use this type for **all** monetary values (balances, transfer amounts,
/// audit snapshots) to avoid floating-point drift. Formatting into the
/// accounting display string (thousands separators, parentheses for negative
/// amounts) happens only at render time via [`Money::format`]; arithmetic is
/// never performed on display strings.
///
/// The value is signed:
/// - positive = inflow / increase
/// - negative = outflow / decrease
///
/// # Examples
///
/// ```rust
/// use ledger::{Currency, Money};
///
/// let amount = Money::new(1_000_000);
/// assert_eq!(amount.minor(), 1_000_000);
/// assert_eq!(amount.format(Currency::Idr), "1,000,000");
/// assert_eq!((-amount).format(Currency::Idr), "(1,000,000)");
/// ```
///
/// Parsing user input (accepts thousands separators, a leading `-`/`+`, or the
/// accounting parenthesis convention):
///
/// ```rust
/// use ledger::{Currency, Money};
///
/// assert_eq!(Money::parse("250,000", Currency::Idr).unwrap().minor(), 250_000);
/// assert_eq!(Money::parse("(1,500)", Currency::Idr).unwrap().minor(), -1_500);
/// assert_eq!(Money::parse("10.50", Currency::Usd).unwrap().minor(), 1_050);
/// assert!(Money::parse("10.5", Currency::Idr).is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Renders the amount in accounting notation for `currency`.
    ///
    /// Major digits are grouped with `,`; negative amounts are wrapped in
    /// parentheses instead of carrying a minus sign.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let digits = currency.minor_units() as u32;
        let abs = self.0.unsigned_abs();
        let scale = 10u64.pow(digits);
        let major = abs / scale;
        let frac = abs % scale;

        let mut grouped = String::new();
        let major_str = major.to_string();
        let first_len = match major_str.len() % 3 {
            0 => 3,
            n => n,
        };
        grouped.push_str(&major_str[..first_len]);
        let mut rest = &major_str[first_len..];
        while !rest.is_empty() {
            grouped.push(',');
            grouped.push_str(&rest[..3]);
            rest = &rest[3..];
        }

        let body = if digits == 0 {
            grouped
        } else {
            format!("{grouped}.{frac:0width$}", width = digits as usize)
        };

        if self.0 < 0 {
            format!("({body})")
        } else {
            body
        }
    }

    /// Parses a display string into minor units for `currency`.
    ///
    /// Accepts an optional leading `-`/`+` or enclosing parentheses (accounting
    /// negative), `,` as thousands separator, and `.` as decimal separator.
    ///
    /// Validation rules:
    /// - at most `currency.minor_units()` fractional digits
    /// - rejects empty/invalid strings and mixed sign conventions
    pub fn parse(s: &str, currency: Currency) -> Result<Self, LedgerError> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
        {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() || rest.starts_with('-') || rest.starts_with('(') {
            return Err(invalid());
        }

        let rest = rest.replace(',', "");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let major: i64 = major_str.parse().map_err(|_| invalid())?;

        let digits = currency.minor_units() as u32;
        let frac: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if frac.len() as u32 > digits {
                    return Err(LedgerError::InvalidAmount(format!(
                        "too many decimals for {}",
                        currency.code()
                    )));
                }
                let parsed: i64 = frac.parse().map_err(|_| invalid())?;
                parsed * 10i64.pow(digits - frac.len() as u32)
            }
        };

        let total = major
            .checked_mul(10i64.pow(digits))
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}
