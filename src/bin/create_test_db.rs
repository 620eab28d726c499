use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, macros::datetime};

use finloopr::{
    Category, PasswordHash, Status, Transaction, ValidatedPassword, create_transaction,
    create_user, import_transactions, initialize_db,
};

const DEMO_EMAIL: &str = "demo@loopr.com";
const DEMO_PASSWORD: &str = "demo123";
const DEMO_NAME: &str = "Demo User";

const SAMPLE_USERS: [&str; 5] = ["user_001", "user_002", "user_003", "user_004", "user_005"];
const SAMPLE_TRANSACTION_COUNT: usize = 240;

/// A utility for creating a test database for the FinLoopr REST API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// A JSON file with an array of transactions to import instead of the sample data.
    #[arg(long)]
    transactions: Option<String>,
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

    println!("Creating demo user {DEMO_EMAIL}...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    create_user(DEMO_EMAIL, DEMO_NAME, password_hash, &conn)?;

    match args.transactions {
        Some(path) => {
            println!("Importing transactions from {path}...");
            let json = fs::read_to_string(&path)?;
            let count = import_transactions(&json, &conn)?;
            println!("Imported {count} transactions.");
        }
        None => {
            println!("Creating {SAMPLE_TRANSACTION_COUNT} sample transactions...");
            let sql_transaction = conn.unchecked_transaction()?;

            for transaction in sample_transactions() {
                create_transaction(&transaction, &sql_transaction)?;
            }

            sql_transaction.commit()?;
        }
    }

    println!("Success!");

    Ok(())
}

/// Two years of transactions spread over the sample users.
///
/// The values follow a fixed pattern so every generated database is identical.
fn sample_transactions() -> Vec<Transaction> {
    let start = datetime!(2023-01-01 09:00 UTC);

    (0..SAMPLE_TRANSACTION_COUNT)
        .map(|i| {
            let user_id = SAMPLE_USERS[i % SAMPLE_USERS.len()];
            let category = if i % 3 == 0 {
                Category::Revenue
            } else {
                Category::Expense
            };
            let status = if i % 4 == 0 {
                Status::Pending
            } else {
                Status::Paid
            };
            let cents = (i * 7919 + 1301) % 150_000 + 500;

            Transaction {
                id: format!("{}", i + 1),
                date: start + Duration::hours(73 * i as i64),
                amount: cents as f64 / 100.0,
                category,
                status,
                user_id: user_id.to_owned(),
                user_profile: Some(format!("https://i.pravatar.cc/150?u={user_id}")),
            }
        })
        .collect()
}
