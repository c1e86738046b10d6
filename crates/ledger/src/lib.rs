//! Bank ledger service for Tillbook.
//!
//! The [`Ledger`] owns no in-memory state: it is a repository over the row
//! store, so reads always reflect committed writes. Money movements (transfer
//! between own accounts, receive from an external payer) write their audit row
//! and the balance updates inside a single database transaction.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseConnection, DatabaseTransaction, QueryFilter,
    QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

pub use accounts::{Account, AccountStatus, AccountType};
pub use currency::Currency;
pub use entries::{Direction, Entry};
pub use error::LedgerError;
pub use money::Money;
pub use receipts::Receipt;
pub use transfers::Transfer;

mod accounts;
mod codes;
mod currency;
mod entries;
mod error;
mod money;
mod receipts;
mod transfers;

type ResultLedger<T> = Result<T, LedgerError>;

/// Input for [`Ledger::create_account`].
///
/// `code: None` asks the ledger to generate one.
#[derive(Clone, Debug, Default)]
pub struct NewAccount {
    pub code: Option<String>,
    pub name: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<AccountType>,
    pub currency: Currency,
    pub opening_balance: Money,
}

/// Field updates for [`Ledger::update_account`]. `None` leaves a field as is.
#[derive(Clone, Debug, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub balance: Option<Money>,
}

#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// All accounts of a user, ordered by creation time ascending.
    pub async fn accounts(&self, user_id: &str) -> ResultLedger<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Account::try_from).collect()
    }

    /// Looks up one account by its user-facing code.
    pub async fn account_by_code(&self, user_id: &str, code: &str) -> ResultLedger<Account> {
        let model = self.find_account(&self.database, user_id, code).await?;
        Account::try_from(model)
    }

    /// Sum of all non-archived account balances.
    pub async fn total_balance(&self, user_id: &str) -> ResultLedger<Money> {
        let accounts = self.accounts(user_id).await?;
        Ok(accounts
            .iter()
            .filter(|account| !account.is_archived())
            .fold(Money::ZERO, |total, account| total + account.balance))
    }

    /// All statement entries of a user, newest first.
    ///
    /// Each transfer row contributes an outflow and an inflow entry, each
    /// receive row a single inflow entry. Rows whose account no longer exists
    /// are skipped.
    pub async fn entries(&self, user_id: &str) -> ResultLedger<Vec<Entry>> {
        let accounts = self.accounts(user_id).await?;
        let codes = entries::code_lookup(&accounts);

        let transfer_models = transfers::Entity::find()
            .filter(transfers::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;
        let receipt_models = receipts::Entity::find()
            .filter(receipts::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(transfer_models.len() * 2 + receipt_models.len());
        for model in transfer_models {
            let transfer = Transfer::try_from(model)?;
            out.extend(entries::expand_transfer(&transfer, &codes));
        }
        for model in receipt_models {
            let receipt = Receipt::try_from(model)?;
            out.extend(entries::expand_receipt(&receipt, &codes));
        }

        out.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(out)
    }

    /// Statement entries for one account, newest first.
    pub async fn account_entries(&self, user_id: &str, code: &str) -> ResultLedger<Vec<Entry>> {
        // Existence check first, so an unknown code fails loudly instead of
        // returning an empty statement.
        self.find_account(&self.database, user_id, code).await?;

        let mut entries = self.entries(user_id).await?;
        entries.retain(|entry| entry.account_code == code);
        Ok(entries)
    }

    /// Generates an account code that is not yet taken by this user.
    ///
    /// Candidates are timestamp+random (see `codes`); each is checked against
    /// existing rows. Fails with [`LedgerError::CodeGeneration`] after ten
    /// failed attempts.
    pub async fn generate_unique_code(&self, user_id: &str) -> ResultLedger<String> {
        for _ in 0..codes::MAX_ATTEMPTS {
            let candidate = codes::candidate();
            let taken = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(user_id))
                .filter(accounts::Column::Code.eq(candidate.as_str()))
                .one(&self.database)
                .await?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
        }
        Err(LedgerError::CodeGeneration(codes::MAX_ATTEMPTS))
    }

    /// Creates an account with status Active and the supplied opening balance.
    ///
    /// An explicitly supplied code is checked for prior existence before
    /// anything is written; two different users may use the same code.
    pub async fn create_account(
        &self,
        user_id: &str,
        new_account: NewAccount,
    ) -> ResultLedger<Account> {
        let name = normalize_required(&new_account.name, "account name")?;

        let code = match new_account.code {
            Some(code) => {
                let code = normalize_required(&code, "account code")?;
                let exists = accounts::Entity::find()
                    .filter(accounts::Column::UserId.eq(user_id))
                    .filter(accounts::Column::Code.eq(code.as_str()))
                    .one(&self.database)
                    .await?
                    .is_some();
                if exists {
                    return Err(LedgerError::ExistingCode(code));
                }
                code
            }
            None => self.generate_unique_code(user_id).await?,
        };

        let mut account = Account::new(
            user_id.to_string(),
            code,
            name,
            new_account.currency,
            new_account.opening_balance,
            Utc::now(),
        );
        account.bank_name = normalize_optional(new_account.bank_name.as_deref());
        account.account_number = normalize_optional(new_account.account_number.as_deref());
        account.account_type = new_account.account_type;

        accounts::ActiveModel::from(&account)
            .insert(&self.database)
            .await?;

        tracing::info!(code = %account.code, user = user_id, "account created");
        Ok(account)
    }

    /// Archives an account. Balance and history stay untouched.
    pub async fn archive_account(&self, user_id: &str, code: &str) -> ResultLedger<()> {
        self.set_status(user_id, code, AccountStatus::Archived).await
    }

    /// Returns an archived account to the active list.
    pub async fn unarchive_account(&self, user_id: &str, code: &str) -> ResultLedger<()> {
        self.set_status(user_id, code, AccountStatus::Active).await
    }

    async fn set_status(
        &self,
        user_id: &str,
        code: &str,
        status: AccountStatus,
    ) -> ResultLedger<()> {
        let model = self.find_account(&self.database, user_id, code).await?;
        let active = accounts::ActiveModel {
            id: ActiveValue::Set(model.id),
            status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }

    /// Deletes an account. Dependent transfer and receive rows are removed by
    /// the store's cascade rules.
    pub async fn delete_account(&self, user_id: &str, code: &str) -> ResultLedger<()> {
        let model = self.find_account(&self.database, user_id, code).await?;
        accounts::Entity::delete_by_id(model.id)
            .exec(&self.database)
            .await?;
        tracing::info!(code, user = user_id, "account deleted");
        Ok(())
    }

    /// Updates name, bank fields and/or balance of an account.
    pub async fn update_account(
        &self,
        user_id: &str,
        code: &str,
        update: AccountUpdate,
    ) -> ResultLedger<Account> {
        let model = self.find_account(&self.database, user_id, code).await?;

        let mut active = accounts::ActiveModel {
            id: ActiveValue::Set(model.id.clone()),
            ..Default::default()
        };
        if let Some(name) = update.name {
            active.name = ActiveValue::Set(normalize_required(&name, "account name")?);
        }
        if let Some(bank_name) = update.bank_name {
            active.bank_name = ActiveValue::Set(normalize_optional(Some(&bank_name)));
        }
        if let Some(account_number) = update.account_number {
            active.account_number = ActiveValue::Set(normalize_optional(Some(&account_number)));
        }
        if let Some(balance) = update.balance {
            active.balance = ActiveValue::Set(balance.minor());
        }

        let updated = active.update(&self.database).await?;
        Account::try_from(updated)
    }

    /// Moves `amount` between two accounts of the same user.
    ///
    /// Preconditions are checked in order: both accounts exist, the
    /// Credit/Debit type guard passes, the currencies match, and the source
    /// holds at least `amount`. The audit row and both balance updates are
    /// committed in one database transaction, so a failure at any step leaves
    /// no trace.
    pub async fn transfer_funds(
        &self,
        user_id: &str,
        from_code: &str,
        to_code: &str,
        amount: Money,
        note: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> ResultLedger<Transfer> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "transfer amount must be positive".to_string(),
            ));
        }
        if from_code == to_code {
            return Err(LedgerError::InvalidAmount(
                "source and target accounts must differ".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;

        let source_model = self.find_account(&db_tx, user_id, from_code).await?;
        let target_model = self.find_account(&db_tx, user_id, to_code).await?;
        let source = Account::try_from(source_model)?;
        let target = Account::try_from(target_model)?;

        match (source.account_type, target.account_type) {
            (Some(AccountType::Credit), Some(AccountType::Debit)) => {
                return Err(LedgerError::CreditToDebitTransfer);
            }
            (Some(AccountType::Debit), Some(AccountType::Credit)) => {
                return Err(LedgerError::DebitToCreditTransfer);
            }
            _ => {}
        }

        if source.currency != target.currency {
            return Err(LedgerError::CurrencyMismatch(format!(
                "source is {}, target is {}",
                source.currency.code(),
                target.currency.code()
            )));
        }

        if source.balance < amount {
            return Err(LedgerError::InsufficientFunds(source.code));
        }

        let transfer = Transfer {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            from_account_id: source.id,
            to_account_id: target.id,
            amount,
            currency: source.currency,
            source_balance_before: source.balance,
            source_balance_after: source.balance - amount,
            target_balance_before: target.balance,
            target_balance_after: target.balance + amount,
            note: normalize_optional(note),
            occurred_at,
        };

        transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;
        set_balance(&db_tx, source.id, transfer.source_balance_after).await?;
        set_balance(&db_tx, target.id, transfer.target_balance_after).await?;

        db_tx.commit().await?;

        tracing::info!(
            from = from_code,
            to = to_code,
            amount = amount.minor(),
            user = user_id,
            "transfer committed"
        );
        Ok(transfer)
    }

    /// Records money received from an external payer on one account.
    ///
    /// The only precondition beyond a positive amount and a non-empty payer is
    /// that the account exists; there is no upper bound.
    pub async fn receive_money(
        &self,
        user_id: &str,
        code: &str,
        amount: Money,
        payer: &str,
        reference: Option<&str>,
        note: Option<&str>,
        occurred_at: DateTime<Utc>,
    ) -> ResultLedger<Receipt> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "received amount must be positive".to_string(),
            ));
        }
        let payer = normalize_required(payer, "payer")?;

        let db_tx = self.database.begin().await?;

        let model = self.find_account(&db_tx, user_id, code).await?;
        let account = Account::try_from(model)?;

        let receipt = Receipt {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            account_id: account.id,
            amount,
            currency: account.currency,
            payer,
            reference: normalize_optional(reference),
            note: normalize_optional(note),
            balance_before: account.balance,
            balance_after: account.balance + amount,
            occurred_at,
        };

        receipts::ActiveModel::from(&receipt).insert(&db_tx).await?;
        set_balance(&db_tx, account.id, receipt.balance_after).await?;

        db_tx.commit().await?;

        tracing::info!(
            code,
            amount = amount.minor(),
            user = user_id,
            "receipt committed"
        );
        Ok(receipt)
    }

    async fn find_account<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        code: &str,
    ) -> ResultLedger<accounts::Model> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::Code.eq(code))
            .one(conn)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
    }
}

async fn set_balance(
    db_tx: &DatabaseTransaction,
    account_id: Uuid,
    balance: Money,
) -> ResultLedger<()> {
    let active = accounts::ActiveModel {
        id: ActiveValue::Set(account_id.to_string()),
        balance: ActiveValue::Set(balance.minor()),
        ..Default::default()
    };
    active.update(db_tx).await?;
    Ok(())
}

fn normalize_required(value: &str, label: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
