use std::error::Error;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use ledger::{AccountType, AccountUpdate, Currency, Ledger, Money, NewAccount};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub full_name: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "tillbook_admin")]
#[command(about = "Operator utilities for the Tillbook ledger")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./tillbook.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Account(Account),
    /// Move money between two of the user's accounts.
    Transfer(TransferArgs),
    /// Record money received from an external payer.
    Receive(ReceiveArgs),
    /// Print the statement entries of one account, newest first.
    Statement(StatementArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: Option<String>,
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create(AccountCreateArgs),
    List(AccountListArgs),
    Archive(AccountRefArgs),
    Unarchive(AccountRefArgs),
    Delete(AccountRefArgs),
    Edit(AccountEditArgs),
}

#[derive(Args, Debug)]
struct AccountCreateArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    name: String,
    /// Explicit account code; generated when omitted.
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    bank_name: Option<String>,
    #[arg(long)]
    account_number: Option<String>,
    /// "debit" or "credit".
    #[arg(long = "type")]
    account_type: Option<String>,
    #[arg(long, default_value = "IDR")]
    currency: String,
    #[arg(long, default_value = "0")]
    opening_balance: String,
}

#[derive(Args, Debug)]
struct AccountListArgs {
    #[arg(long)]
    user: String,
    /// Include archived accounts.
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct AccountRefArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    code: String,
}

#[derive(Args, Debug)]
struct AccountEditArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    code: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    bank_name: Option<String>,
    #[arg(long)]
    account_number: Option<String>,
    #[arg(long)]
    balance: Option<String>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    amount: String,
    #[arg(long)]
    note: Option<String>,
    /// Value date (YYYY-MM-DD); defaults to now.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct ReceiveArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    code: String,
    #[arg(long)]
    amount: String,
    #[arg(long)]
    payer: String,
    #[arg(long)]
    reference: Option<String>,
    #[arg(long)]
    note: Option<String>,
    /// Value date (YYYY-MM-DD); defaults to now.
    #[arg(long)]
    date: Option<String>,
}

#[derive(Args, Debug)]
struct StatementArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    code: String,
}

fn parse_date(raw: Option<&str>) -> Result<DateTime<Utc>, Box<dyn Error + Send + Sync>> {
    match raw {
        None => Ok(Utc::now()),
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
            let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid date")?;
            Ok(midnight.and_utc())
        }
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tillbook_admin=info,ledger=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let db = connect_db(&cli.database_url).await?;

    if let Err(err) = run(cli.command, db).await {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    command: Command,
    db: DatabaseConnection,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let ledger = Ledger::builder().database(db.clone()).build();

    match command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if users::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                return Err(format!("user already exists: {}", args.username).into());
            }

            let user = users::ActiveModel {
                username: Set(args.username.clone()),
                full_name: Set(args.full_name),
            };
            users::Entity::insert(user).exec(&db).await?;
            println!("created user: {}", args.username);
        }
        Command::Account(Account { command }) => run_account(command, &ledger).await?,
        Command::Transfer(args) => {
            let source = ledger.account_by_code(&args.user, &args.from).await?;
            let amount = Money::parse(&args.amount, source.currency)?;
            let occurred_at = parse_date(args.date.as_deref())?;

            let transfer = ledger
                .transfer_funds(
                    &args.user,
                    &args.from,
                    &args.to,
                    amount,
                    args.note.as_deref(),
                    occurred_at,
                )
                .await?;

            println!(
                "transferred {} from {} ({} -> {}) to {} ({} -> {})",
                transfer.amount.format(transfer.currency),
                args.from,
                transfer.source_balance_before.format(transfer.currency),
                transfer.source_balance_after.format(transfer.currency),
                args.to,
                transfer.target_balance_before.format(transfer.currency),
                transfer.target_balance_after.format(transfer.currency),
            );
        }
        Command::Receive(args) => {
            let account = ledger.account_by_code(&args.user, &args.code).await?;
            let amount = Money::parse(&args.amount, account.currency)?;
            let occurred_at = parse_date(args.date.as_deref())?;

            let receipt = ledger
                .receive_money(
                    &args.user,
                    &args.code,
                    amount,
                    &args.payer,
                    args.reference.as_deref(),
                    args.note.as_deref(),
                    occurred_at,
                )
                .await?;

            println!(
                "received {} from {} on {} (balance {} -> {})",
                receipt.amount.format(receipt.currency),
                receipt.payer,
                args.code,
                receipt.balance_before.format(receipt.currency),
                receipt.balance_after.format(receipt.currency),
            );
        }
        Command::Statement(args) => {
            let account = ledger.account_by_code(&args.user, &args.code).await?;
            let entries = ledger.account_entries(&args.user, &args.code).await?;

            println!(
                "{} {} - balance {}",
                account.code,
                account.name,
                account.balance.format(account.currency)
            );
            for entry in entries {
                let sign = match entry.direction {
                    ledger::Direction::Inflow => "+",
                    ledger::Direction::Outflow => "-",
                };
                println!(
                    "{}  {}{}  {}{}",
                    entry.occurred_at.format("%Y-%m-%d"),
                    sign,
                    entry.amount.format(account.currency),
                    entry.description,
                    entry
                        .reference
                        .as_deref()
                        .map(|r| format!(" [{r}]"))
                        .unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

async fn run_account(
    command: AccountCommand,
    ledger: &Ledger,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        AccountCommand::Create(args) => {
            let currency = Currency::try_from(args.currency.as_str())?;
            let account_type = args
                .account_type
                .as_deref()
                .map(AccountType::try_from)
                .transpose()?;
            let opening_balance = Money::parse(&args.opening_balance, currency)?;

            let account = ledger
                .create_account(
                    &args.user,
                    NewAccount {
                        code: args.code,
                        name: args.name,
                        bank_name: args.bank_name,
                        account_number: args.account_number,
                        account_type,
                        currency,
                        opening_balance,
                    },
                )
                .await?;
            println!("created account {} ({})", account.code, account.name);
        }
        AccountCommand::List(args) => {
            let accounts = ledger.accounts(&args.user).await?;
            for account in accounts {
                if account.is_archived() && !args.all {
                    continue;
                }
                println!(
                    "{}  {}  {}{}",
                    account.code,
                    account.name,
                    account.balance.format(account.currency),
                    if account.is_archived() {
                        "  (archived)"
                    } else {
                        ""
                    },
                );
            }
            let total = ledger.total_balance(&args.user).await?;
            println!("total: {}", total.format(Currency::default()));
        }
        AccountCommand::Archive(args) => {
            ledger.archive_account(&args.user, &args.code).await?;
            println!("archived account {}", args.code);
        }
        AccountCommand::Unarchive(args) => {
            ledger.unarchive_account(&args.user, &args.code).await?;
            println!("unarchived account {}", args.code);
        }
        AccountCommand::Delete(args) => {
            ledger.delete_account(&args.user, &args.code).await?;
            println!("deleted account {}", args.code);
        }
        AccountCommand::Edit(args) => {
            let balance = match args.balance {
                Some(raw) => {
                    let account = ledger.account_by_code(&args.user, &args.code).await?;
                    Some(Money::parse(&raw, account.currency)?)
                }
                None => None,
            };

            let account = ledger
                .update_account(
                    &args.user,
                    &args.code,
                    AccountUpdate {
                        name: args.name,
                        bank_name: args.bank_name,
                        account_number: args.account_number,
                        balance,
                    },
                )
                .await?;
            println!("updated account {}", account.code);
        }
    }

    Ok(())
}
