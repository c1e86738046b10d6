//! Statement entries (synthetic legs).
//!
//! An [`Entry`] is one balance change on one account, derived for display from
//! the stored ledger rows. It is never persisted:
//!
//! - a [`Transfer`] row expands into two entries, an outflow on the source
//!   account and an inflow on the target account (the signed sum is zero)
//! - a [`Receipt`] row expands into a single inflow entry
//!
//! Ledger rows reference accounts by row id, so expansion needs the id→code
//! lookup of the user's accounts. Rows pointing at an unknown account are
//! skipped rather than surfaced with a dangling code.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Account, Money, Receipt, Transfer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inflow,
    Outflow,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }
}

/// One statement line for one account.
///
/// `amount` is always positive; `direction` carries the sign. The two entries
/// expanded from a transfer share the transfer row's `transaction_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub transaction_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub amount: Money,
    pub direction: Direction,
    pub account_code: String,
    pub reference: Option<String>,
}

impl Entry {
    /// Signed view of the amount: inflows positive, outflows negative.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            Direction::Inflow => self.amount,
            Direction::Outflow => -self.amount,
        }
    }
}

/// Builds the id→code lookup used to expand ledger rows.
pub(crate) fn code_lookup(accounts: &[Account]) -> HashMap<Uuid, &str> {
    accounts
        .iter()
        .map(|account| (account.id, account.code.as_str()))
        .collect()
}

/// Expands one transfer row into its outflow/inflow pair.
pub(crate) fn expand_transfer(transfer: &Transfer, codes: &HashMap<Uuid, &str>) -> Vec<Entry> {
    let (Some(source_code), Some(target_code)) = (
        codes.get(&transfer.from_account_id),
        codes.get(&transfer.to_account_id),
    ) else {
        return Vec::new();
    };

    vec![
        Entry {
            transaction_id: transfer.id,
            occurred_at: transfer.occurred_at,
            description: format!("Transfer to {target_code}"),
            amount: transfer.amount,
            direction: Direction::Outflow,
            account_code: (*source_code).to_string(),
            reference: transfer.note.clone(),
        },
        Entry {
            transaction_id: transfer.id,
            occurred_at: transfer.occurred_at,
            description: format!("Transfer from {source_code}"),
            amount: transfer.amount,
            direction: Direction::Inflow,
            account_code: (*target_code).to_string(),
            reference: transfer.note.clone(),
        },
    ]
}

/// Expands one receive row into its single inflow entry.
pub(crate) fn expand_receipt(receipt: &Receipt, codes: &HashMap<Uuid, &str>) -> Option<Entry> {
    let code = codes.get(&receipt.account_id)?;
    Some(Entry {
        transaction_id: receipt.id,
        occurred_at: receipt.occurred_at,
        description: receipt.payer.clone(),
        amount: receipt.amount,
        direction: Direction::Inflow,
        account_code: (*code).to_string(),
        reference: receipt.reference.clone(),
    })
}
