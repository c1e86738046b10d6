//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Tillbook:
//!
//! - `users`: row scoping (auth lives outside this system)
//! - `accounts`: cash/bank accounts with denormalized balances
//! - `transfer_transactions`: audit rows for account-to-account transfers
//! - `receive_transactions`: audit rows for money received from payers

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    FullName,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    UserId,
    Code,
    Name,
    BankName,
    AccountNumber,
    AccountType,
    Currency,
    Balance,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum TransferTransactions {
    Table,
    Id,
    UserId,
    FromAccountId,
    ToAccountId,
    Amount,
    Currency,
    SourceBalanceBefore,
    SourceBalanceAfter,
    TargetBalanceBefore,
    TargetBalanceAfter,
    Note,
    OccurredAt,
}

#[derive(Iden)]
enum ReceiveTransactions {
    Table,
    Id,
    UserId,
    AccountId,
    Amount,
    Currency,
    Payer,
    Reference,
    Note,
    BalanceBefore,
    BalanceAfter,
    OccurredAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::UserId).string().not_null())
                    .col(ColumnDef::new(Accounts::Code).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::BankName).string())
                    .col(ColumnDef::new(Accounts::AccountNumber).string())
                    .col(ColumnDef::new(Accounts::AccountType).string())
                    .col(
                        ColumnDef::new(Accounts::Currency)
                            .string()
                            .not_null()
                            .default("IDR"),
                    )
                    .col(ColumnDef::new(Accounts::Balance).big_integer().not_null())
                    .col(
                        ColumnDef::new(Accounts::Status)
                            .string()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-user_id")
                            .from(Accounts::Table, Accounts::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-code-unique")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-user_id-created_at")
                    .table(Accounts::Table)
                    .col(Accounts::UserId)
                    .col(Accounts::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transfer transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransferTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransferTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::FromAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::ToAccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::SourceBalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::SourceBalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::TargetBalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransferTransactions::TargetBalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransferTransactions::Note).string())
                    .col(
                        ColumnDef::new(TransferTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfer_transactions-from_account_id")
                            .from(
                                TransferTransactions::Table,
                                TransferTransactions::FromAccountId,
                            )
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfer_transactions-to_account_id")
                            .from(
                                TransferTransactions::Table,
                                TransferTransactions::ToAccountId,
                            )
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfer_transactions-user_id-occurred_at")
                    .table(TransferTransactions::Table)
                    .col(TransferTransactions::UserId)
                    .col(TransferTransactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Receive transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ReceiveTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReceiveTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::AccountId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::Payer)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReceiveTransactions::Reference).string())
                    .col(ColumnDef::new(ReceiveTransactions::Note).string())
                    .col(
                        ColumnDef::new(ReceiveTransactions::BalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReceiveTransactions::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-receive_transactions-account_id")
                            .from(ReceiveTransactions::Table, ReceiveTransactions::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-receive_transactions-user_id-occurred_at")
                    .table(ReceiveTransactions::Table)
                    .col(ReceiveTransactions::UserId)
                    .col(ReceiveTransactions::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ReceiveTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransferTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
