//! Transfer audit rows.
//!
//! One `transfer_transactions` row records a movement between two accounts of
//! the same user, including balance snapshots on both sides taken at commit
//! time. Rows are never mutated after creation; they exist so that every
//! balance can be reconciled against its history.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money};

/// A committed transfer between two accounts.
///
/// Invariant: `source_after = source_before - amount` and
/// `target_after = target_before + amount`, so the two signed deltas cancel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub user_id: String,
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub currency: Currency,
    pub source_balance_before: Money,
    pub source_balance_after: Money,
    pub target_balance_before: Money,
    pub target_balance_after: Money,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transfer_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub from_account_id: String,
    pub to_account_id: String,
    pub amount: i64,
    pub currency: String,
    pub source_balance_before: i64,
    pub source_balance_after: i64,
    pub target_balance_before: i64,
    pub target_balance_after: i64,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    SourceAccount,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    TargetAccount,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(transfer.id.to_string()),
            user_id: ActiveValue::Set(transfer.user_id.clone()),
            from_account_id: ActiveValue::Set(transfer.from_account_id.to_string()),
            to_account_id: ActiveValue::Set(transfer.to_account_id.to_string()),
            amount: ActiveValue::Set(transfer.amount.minor()),
            currency: ActiveValue::Set(transfer.currency.code().to_string()),
            source_balance_before: ActiveValue::Set(transfer.source_balance_before.minor()),
            source_balance_after: ActiveValue::Set(transfer.source_balance_after.minor()),
            target_balance_before: ActiveValue::Set(transfer.target_balance_before.minor()),
            target_balance_after: ActiveValue::Set(transfer.target_balance_after.minor()),
            note: ActiveValue::Set(transfer.note.clone()),
            occurred_at: ActiveValue::Set(transfer.occurred_at),
        }
    }
}

impl TryFrom<Model> for Transfer {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let invalid_id =
            |what: &str| LedgerError::CorruptRow(format!("invalid {what} id on transfer row"));
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| invalid_id("transfer"))?,
            user_id: model.user_id,
            from_account_id: Uuid::parse_str(&model.from_account_id)
                .map_err(|_| invalid_id("source account"))?,
            to_account_id: Uuid::parse_str(&model.to_account_id)
                .map_err(|_| invalid_id("target account"))?,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            source_balance_before: Money::new(model.source_balance_before),
            source_balance_after: Money::new(model.source_balance_after),
            target_balance_before: Money::new(model.target_balance_before),
            target_balance_after: Money::new(model.target_balance_after),
            note: model.note,
            occurred_at: model.occurred_at,
        })
    }
}
