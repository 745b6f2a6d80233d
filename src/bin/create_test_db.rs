use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use fintrack::{
    BudgetInput, PasswordHash, PendingTransaction, PeriodKind, TransactionType, ValidatedPassword,
    count_users, create_budget, create_transaction, create_user, default_dates, ensure_category,
    initialize_db,
};

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo";

/// A utility for creating a demo database for the fintrack server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    if count_users(&conn)? > 0 {
        eprintln!("The database at {output_path:#?} already has users!");
        exit(1);
    }

    println!("Creating demo user {DEMO_EMAIL} with the password \"{DEMO_PASSWORD}\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(DEMO_EMAIL, password_hash, &conn)?;

    println!("Creating transactions...");

    let now = OffsetDateTime::now_utc();
    let today = now.date();
    let transactions = [
        ("Salary", "Salary", 3200.0, 25, TransactionType::Income),
        ("Rent", "Housing", 1400.0, 24, TransactionType::Expense),
        ("Supermarket", "Groceries", 142.35, 20, TransactionType::Expense),
        ("Bus pass", "Transport", 60.0, 18, TransactionType::Expense),
        ("Electricity", "Utilities", 95.2, 12, TransactionType::Expense),
        ("Coffee", "Eating out", 5.5, 6, TransactionType::Expense),
        ("Supermarket", "Groceries", 87.1, 5, TransactionType::Expense),
        ("Freelance work", "Side income", 450.0, 3, TransactionType::Income),
        ("Dinner with friends", "Eating out", 64.0, 1, TransactionType::Expense),
        ("Salary", "Salary", 3200.0, 55, TransactionType::Income),
        ("Rent", "Housing", 1400.0, 54, TransactionType::Expense),
        ("Supermarket", "Groceries", 120.4, 48, TransactionType::Expense),
    ];

    for (description, category, amount, days_ago, type_) in transactions {
        let pending = PendingTransaction::new(
            Uuid::new_v4(),
            description,
            category,
            amount,
            today - Duration::days(days_ago),
            type_,
        )?;
        create_transaction(user.id, &pending, now, &conn)?;
        ensure_category(user.id, category, type_, &conn)?;
    }

    println!("Creating monthly budget...");

    let (start_date, end_date) = default_dates(PeriodKind::Monthly, today);
    create_budget(
        user.id,
        &BudgetInput {
            amount: 2000.0,
            period: PeriodKind::Monthly,
            start_date,
            end_date,
        },
        now,
        &conn,
    )?;

    println!("Success!");

    Ok(())
}
