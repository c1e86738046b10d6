//! Receive-money audit rows.
//!
//! One `receive_transactions` row records money arriving on an account from an
//! external payer, with the balance snapshot taken when the row was committed.
//! Like transfers, rows are immutable after creation.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, LedgerError, Money};

/// A committed receipt of money from an external payer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Uuid,
    pub user_id: String,
    pub account_id: Uuid,
    pub amount: Money,
    pub currency: Currency,
    pub payer: String,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub balance_before: Money,
    pub balance_after: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "receive_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub amount: i64,
    pub currency: String,
    pub payer: String,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub balance_before: i64,
    pub balance_after: i64,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Receipt> for ActiveModel {
    fn from(receipt: &Receipt) -> Self {
        Self {
            id: ActiveValue::Set(receipt.id.to_string()),
            user_id: ActiveValue::Set(receipt.user_id.clone()),
            account_id: ActiveValue::Set(receipt.account_id.to_string()),
            amount: ActiveValue::Set(receipt.amount.minor()),
            currency: ActiveValue::Set(receipt.currency.code().to_string()),
            payer: ActiveValue::Set(receipt.payer.clone()),
            reference: ActiveValue::Set(receipt.reference.clone()),
            note: ActiveValue::Set(receipt.note.clone()),
            balance_before: ActiveValue::Set(receipt.balance_before.minor()),
            balance_after: ActiveValue::Set(receipt.balance_after.minor()),
            occurred_at: ActiveValue::Set(receipt.occurred_at),
        }
    }
}

impl TryFrom<Model> for Receipt {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let invalid_id =
            |what: &str| LedgerError::CorruptRow(format!("invalid {what} id on receive row"));
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| invalid_id("receipt"))?,
            user_id: model.user_id,
            account_id: Uuid::parse_str(&model.account_id).map_err(|_| invalid_id("account"))?,
            amount: Money::new(model.amount),
            currency: Currency::try_from(model.currency.as_str()).unwrap_or_default(),
            payer: model.payer,
            reference: model.reference,
            note: model.note,
            balance_before: Money::new(model.balance_before),
            balance_after: Money::new(model.balance_after),
            occurred_at: model.occurred_at,
        })
    }
}
