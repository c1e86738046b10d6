//! The module contains the `Account` struct and its sea-orm entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money};

/// How an account behaves when money moves through it.
///
/// The type is optional on purpose: plain cash boxes have no type. When both
/// ends of a transfer are typed, a Credit/Debit mix is rejected in either
/// direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Debit,
    Credit,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for AccountType {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(LedgerError::Validation(format!(
                "invalid account type: {other}"
            ))),
        }
    }
}

/// Lifecycle flag stored on the account row.
///
/// Archived accounts keep their balance and history; they only drop out of the
/// active listing and totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Archived,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    #[must_use]
    pub fn is_archived(self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl TryFrom<&str> for AccountStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(LedgerError::CorruptRow(format!(
                "invalid account status: {other}"
            ))),
        }
    }
}

/// A cash or bank account.
///
/// The row id is a UUID generated once and persisted, so accounts can be
/// renamed without breaking ledger references. The user-facing identifier is
/// `code`, unique per user; ledger rows reference accounts by row id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Currency,
    pub balance: Money,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        user_id: String,
        code: String,
        name: String,
        currency: Currency,
        balance: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            code,
            name,
            bank_name: None,
            account_number: None,
            account_type: None,
            currency,
            balance,
            status: AccountStatus::Active,
            created_at,
        }
    }

    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.status.is_archived()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub name: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub currency: String,
    pub balance: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::receipts::Entity")]
    Receipts,
}

impl Related<super::receipts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            code: ActiveValue::Set(value.code.clone()),
            name: ActiveValue::Set(value.name.clone()),
            bank_name: ActiveValue::Set(value.bank_name.clone()),
            account_number: ActiveValue::Set(value.account_number.clone()),
            account_type: ActiveValue::Set(value.account_type.map(|t| t.as_str().to_string())),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            balance: ActiveValue::Set(value.balance.minor()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let account_type = match model.account_type.as_deref() {
            None => None,
            Some(raw) => Some(AccountType::try_from(raw)?),
        };
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| {
                LedgerError::CorruptRow(format!("invalid id on account \"{}\"", model.code))
            })?,
            user_id: model.user_id,
            code: model.code,
            name: model.name,
            bank_name: model.bank_name,
            account_number: model.account_number,
            account_type,
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            balance: Money::new(model.balance),
            status: AccountStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}
