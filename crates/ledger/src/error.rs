//! The error type shared by every ledger operation.
//!
//! Variants are grouped the way failures reach the caller:
//!
//! - precondition errors checked against live rows ([`AccountNotFound`],
//!   [`CreditToDebitTransfer`], [`DebitToCreditTransfer`], [`InsufficientFunds`])
//! - validation errors raised before any write ([`ExistingCode`],
//!   [`InvalidAmount`], [`Validation`])
//! - store errors forwarded from sea-orm ([`Database`]) and rows that fail to
//!   map back into domain types ([`CorruptRow`])
//!
//! [`AccountNotFound`]: LedgerError::AccountNotFound
//! [`CreditToDebitTransfer`]: LedgerError::CreditToDebitTransfer
//! [`DebitToCreditTransfer`]: LedgerError::DebitToCreditTransfer
//! [`InsufficientFunds`]: LedgerError::InsufficientFunds
//! [`ExistingCode`]: LedgerError::ExistingCode
//! [`InvalidAmount`]: LedgerError::InvalidAmount
//! [`Validation`]: LedgerError::Validation
//! [`Database`]: LedgerError::Database
//! [`CorruptRow`]: LedgerError::CorruptRow
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("account \"{0}\" not found")]
    AccountNotFound(String),
    #[error("account code \"{0}\" already exists")]
    ExistingCode(String),
    #[error("insufficient funds on account \"{0}\"")]
    InsufficientFunds(String),
    #[error("transfers from a Credit account to a Debit account are not allowed")]
    CreditToDebitTransfer,
    #[error("transfers from a Debit account to a Credit account are not allowed")]
    DebitToCreditTransfer,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("{0}")]
    Validation(String),
    #[error("currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
    #[error("could not generate a unique account code after {0} attempts")]
    CodeGeneration(u32),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (Self::ExistingCode(a), Self::ExistingCode(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::CreditToDebitTransfer, Self::CreditToDebitTransfer) => true,
            (Self::DebitToCreditTransfer, Self::DebitToCreditTransfer) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::CorruptRow(a), Self::CorruptRow(b)) => a == b,
            (Self::CodeGeneration(a), Self::CodeGeneration(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
