use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use ledger::{
    AccountStatus, AccountType, AccountUpdate, Currency, Direction, Ledger, LedgerError, Money,
    NewAccount,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> (Ledger, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["dina", "bram"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, full_name) VALUES (?, ?)",
            vec![user.into(), Option::<String>::None.into()],
        ))
        .await
        .unwrap();
    }
    let ledger = Ledger::builder().database(db.clone()).build();
    (ledger, db)
}

fn new_account(code: &str, balance: i64, account_type: Option<AccountType>) -> NewAccount {
    NewAccount {
        code: Some(code.to_string()),
        name: format!("Account {code}"),
        account_type,
        currency: Currency::Idr,
        opening_balance: Money::new(balance),
        ..Default::default()
    }
}

async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn transfer_conserves_money() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 1_000_000, Some(AccountType::Debit)))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("A002", 0, Some(AccountType::Debit)))
        .await
        .unwrap();

    let transfer = ledger
        .transfer_funds(
            "dina",
            "A001",
            "A002",
            Money::new(300_000),
            Some("rent"),
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(transfer.source_balance_before, Money::new(1_000_000));
    assert_eq!(transfer.source_balance_after, Money::new(700_000));
    assert_eq!(transfer.target_balance_before, Money::ZERO);
    assert_eq!(transfer.target_balance_after, Money::new(300_000));

    let source_delta = transfer.source_balance_after - transfer.source_balance_before;
    let target_delta = transfer.target_balance_after - transfer.target_balance_before;
    assert_eq!(source_delta + target_delta, Money::ZERO);

    let source = ledger.account_by_code("dina", "A001").await.unwrap();
    let target = ledger.account_by_code("dina", "A002").await.unwrap();
    assert_eq!(source.balance, Money::new(700_000));
    assert_eq!(target.balance, Money::new(300_000));

    let source_entries = ledger.account_entries("dina", "A001").await.unwrap();
    assert_eq!(source_entries.len(), 1);
    assert_eq!(source_entries[0].direction, Direction::Outflow);
    assert_eq!(source_entries[0].amount, Money::new(300_000));
    assert_eq!(source_entries[0].description, "Transfer to A002");

    let target_entries = ledger.account_entries("dina", "A002").await.unwrap();
    assert_eq!(target_entries.len(), 1);
    assert_eq!(target_entries[0].direction, Direction::Inflow);
    assert_eq!(target_entries[0].amount, Money::new(300_000));
}

#[tokio::test]
async fn insufficient_funds_leaves_balances_unchanged() {
    let (ledger, db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 1_000, None))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("A002", 0, None))
        .await
        .unwrap();

    let err = ledger
        .transfer_funds("dina", "A001", "A002", Money::new(1_001), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::InsufficientFunds("A001".to_string()));

    let source = ledger.account_by_code("dina", "A001").await.unwrap();
    let target = ledger.account_by_code("dina", "A002").await.unwrap();
    assert_eq!(source.balance, Money::new(1_000));
    assert_eq!(target.balance, Money::ZERO);
    assert_eq!(count_rows(&db, "transfer_transactions").await, 0);
}

#[tokio::test]
async fn credit_debit_guard_blocks_both_directions() {
    let (ledger, db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("C001", 1_000_000, Some(AccountType::Credit)))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("D001", 1_000_000, Some(AccountType::Debit)))
        .await
        .unwrap();

    let err = ledger
        .transfer_funds("dina", "C001", "D001", Money::new(100), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::CreditToDebitTransfer);

    let err = ledger
        .transfer_funds("dina", "D001", "C001", Money::new(100), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DebitToCreditTransfer);

    // Guard fires before any balance mutation.
    let credit = ledger.account_by_code("dina", "C001").await.unwrap();
    let debit = ledger.account_by_code("dina", "D001").await.unwrap();
    assert_eq!(credit.balance, Money::new(1_000_000));
    assert_eq!(debit.balance, Money::new(1_000_000));
    assert_eq!(count_rows(&db, "transfer_transactions").await, 0);
}

#[tokio::test]
async fn type_guard_is_checked_before_funds() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("C001", 50, Some(AccountType::Credit)))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("D001", 0, Some(AccountType::Debit)))
        .await
        .unwrap();

    // The source is both mistyped and underfunded; the type mismatch wins.
    let err = ledger
        .transfer_funds("dina", "C001", "D001", Money::new(100), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::CreditToDebitTransfer);

    let err = ledger
        .transfer_funds("dina", "D001", "C001", Money::new(100), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::DebitToCreditTransfer);
}

#[tokio::test]
async fn transfer_rejects_same_account_and_nonpositive_amount() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 1_000, None))
        .await
        .unwrap();

    assert!(
        ledger
            .transfer_funds("dina", "A001", "A001", Money::new(10), None, Utc::now())
            .await
            .is_err()
    );
    assert!(
        ledger
            .transfer_funds("dina", "A001", "A002", Money::ZERO, None, Utc::now())
            .await
            .is_err()
    );
    assert!(
        ledger
            .transfer_funds("dina", "A001", "A002", Money::new(-5), None, Utc::now())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn transfer_to_missing_account_fails() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 1_000, None))
        .await
        .unwrap();

    let err = ledger
        .transfer_funds("dina", "A001", "A999", Money::new(100), None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound("A999".to_string()));
}

#[tokio::test]
async fn receive_money_adds_exactly_one_row() {
    let (ledger, db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 50_000, None))
        .await
        .unwrap();

    let receipt = ledger
        .receive_money(
            "dina",
            "A001",
            Money::new(150_000),
            "PT Maju",
            Some("INV-12"),
            None,
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(receipt.balance_before, Money::new(50_000));
    assert_eq!(receipt.balance_after, Money::new(200_000));

    let account = ledger.account_by_code("dina", "A001").await.unwrap();
    assert_eq!(account.balance, Money::new(200_000));
    assert_eq!(count_rows(&db, "receive_transactions").await, 1);

    let entries = ledger.account_entries("dina", "A001").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].direction, Direction::Inflow);
    assert_eq!(entries[0].description, "PT Maju");
    assert_eq!(entries[0].reference.as_deref(), Some("INV-12"));
}

#[tokio::test]
async fn receive_rejects_empty_payer() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 0, None))
        .await
        .unwrap();

    let err = ledger
        .receive_money("dina", "A001", Money::new(100), "  ", None, None, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation("payer must not be empty".to_string())
    );
}

#[tokio::test]
async fn explicit_duplicate_code_fails_without_insert() {
    let (ledger, db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 0, None))
        .await
        .unwrap();

    let err = ledger
        .create_account("dina", new_account("A001", 0, None))
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::ExistingCode("A001".to_string()));
    assert_eq!(count_rows(&db, "accounts").await, 1);

    // A different user may reuse the same code.
    ledger
        .create_account("bram", new_account("A001", 0, None))
        .await
        .unwrap();
    assert_eq!(count_rows(&db, "accounts").await, 2);
}

#[tokio::test]
async fn generated_codes_are_unique_digit_strings() {
    let (ledger, _db) = ledger_with_db().await;

    let account = ledger
        .create_account(
            "dina",
            NewAccount {
                name: "Kas".to_string(),
                currency: Currency::Idr,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(account.code.len(), 10);
    assert!(account.code.starts_with('1'));
    assert!(account.code.chars().all(|c| c.is_ascii_digit()));

    let other = ledger.generate_unique_code("dina").await.unwrap();
    assert_ne!(other, account.code);
}

#[tokio::test]
async fn archive_unarchive_round_trip_preserves_fields() {
    let (ledger, _db) = ledger_with_db().await;
    let created = ledger
        .create_account(
            "dina",
            NewAccount {
                code: Some("A001".to_string()),
                name: "Giro".to_string(),
                bank_name: Some("Bank Nusantara".to_string()),
                account_number: Some("007-123".to_string()),
                account_type: Some(AccountType::Debit),
                currency: Currency::Idr,
                opening_balance: Money::new(42_000),
            },
        )
        .await
        .unwrap();

    ledger
        .receive_money("dina", "A001", Money::new(8_000), "payer", None, None, Utc::now())
        .await
        .unwrap();

    ledger.archive_account("dina", "A001").await.unwrap();
    let archived = ledger.account_by_code("dina", "A001").await.unwrap();
    assert_eq!(archived.status, AccountStatus::Archived);
    assert_eq!(archived.balance, Money::new(50_000));

    // Archived accounts drop out of the active total only.
    assert_eq!(ledger.total_balance("dina").await.unwrap(), Money::ZERO);
    assert_eq!(ledger.account_entries("dina", "A001").await.unwrap().len(), 1);

    ledger.unarchive_account("dina", "A001").await.unwrap();
    let restored = ledger.account_by_code("dina", "A001").await.unwrap();

    assert_eq!(restored.id, created.id);
    assert_eq!(restored.code, created.code);
    assert_eq!(restored.name, created.name);
    assert_eq!(restored.bank_name, created.bank_name);
    assert_eq!(restored.account_number, created.account_number);
    assert_eq!(restored.account_type, created.account_type);
    assert_eq!(restored.status, AccountStatus::Active);
    assert_eq!(restored.balance, Money::new(50_000));
    assert_eq!(ledger.account_entries("dina", "A001").await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_account_changes_only_given_fields() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 10_000, None))
        .await
        .unwrap();

    let updated = ledger
        .update_account(
            "dina",
            "A001",
            AccountUpdate {
                name: Some("Petty cash".to_string()),
                balance: Some(Money::new(-2_500)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Petty cash");
    assert_eq!(updated.balance, Money::new(-2_500));
    assert_eq!(updated.code, "A001");
}

#[tokio::test]
async fn delete_account_cascades_ledger_rows() {
    let (ledger, db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 500_000, None))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("A002", 0, None))
        .await
        .unwrap();

    ledger
        .transfer_funds("dina", "A001", "A002", Money::new(100_000), None, Utc::now())
        .await
        .unwrap();
    ledger
        .receive_money("dina", "A002", Money::new(5_000), "payer", None, None, Utc::now())
        .await
        .unwrap();

    ledger.delete_account("dina", "A002").await.unwrap();

    assert_eq!(count_rows(&db, "accounts").await, 1);
    assert_eq!(count_rows(&db, "transfer_transactions").await, 0);
    assert_eq!(count_rows(&db, "receive_transactions").await, 0);

    // The surviving account keeps its post-transfer balance.
    let source = ledger.account_by_code("dina", "A001").await.unwrap();
    assert_eq!(source.balance, Money::new(400_000));
    assert!(ledger.entries("dina").await.unwrap().is_empty());
}

#[tokio::test]
async fn entries_are_scoped_per_user_and_sorted() {
    let (ledger, _db) = ledger_with_db().await;
    ledger
        .create_account("dina", new_account("A001", 1_000_000, None))
        .await
        .unwrap();
    ledger
        .create_account("dina", new_account("A002", 0, None))
        .await
        .unwrap();
    ledger
        .create_account("bram", new_account("B001", 0, None))
        .await
        .unwrap();

    let earlier = Utc::now() - chrono::Duration::days(1);
    ledger
        .transfer_funds("dina", "A001", "A002", Money::new(100), None, earlier)
        .await
        .unwrap();
    ledger
        .receive_money("dina", "A002", Money::new(200), "payer", None, None, Utc::now())
        .await
        .unwrap();
    ledger
        .receive_money("bram", "B001", Money::new(300), "other", None, None, Utc::now())
        .await
        .unwrap();

    let entries = ledger.entries("dina").await.unwrap();
    assert_eq!(entries.len(), 3);
    // Newest first: the receipt precedes both transfer legs.
    assert_eq!(entries[0].description, "payer");
    assert!(entries.iter().all(|e| e.account_code != "B001"));

    let statement = ledger.account_entries("dina", "A002").await.unwrap();
    assert_eq!(statement.len(), 2);

    let err = ledger.account_entries("dina", "B001").await.unwrap_err();
    assert_eq!(err, LedgerError::AccountNotFound("B001".to_string()));
}

#[tokio::test]
async fn accounts_listed_in_creation_order() {
    let (ledger, _db) = ledger_with_db().await;
    for code in ["A003", "A001", "A002"] {
        ledger
            .create_account("dina", new_account(code, 0, None))
            .await
            .unwrap();
        // created_at keeps sub-second precision; a short gap is enough to
        // make the ordering unambiguous.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let accounts = ledger.accounts("dina").await.unwrap();
    let codes: Vec<&str> = accounts.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["A003", "A001", "A002"]);
}
