//! The transaction model and its database access.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction as SqlTransaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// Alias for the string IDs used by transactions.
pub type TransactionId = String;

/// Whether a transaction brings money in or takes money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Money received.
    Revenue,
    /// Money spent.
    Expense,
}

/// Whether a transaction has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The transaction has been settled.
    Paid,
    /// The transaction is awaiting settlement.
    Pending,
}

/// Implements the string conversions and SQLite mappings shared by the
/// transaction enums.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The name of the variant as stored and sent over the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::ValidationError(format!(
                        concat!("unknown ", $label, " \"{}\""),
                        other
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(self.as_str().into())
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
            }
        }
    };
}

text_enum!(Category, "category", { Revenue => "Revenue", Expense => "Expense" });
text_enum!(Status, "status", { Paid => "Paid", Pending => "Pending" });

/// A single revenue or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The unique ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// The amount of money. Only the magnitude is meaningful, see [Transaction::category].
    pub amount: f64,
    /// Whether the amount is revenue or an expense.
    pub category: Category,
    /// Whether the transaction has been settled.
    pub status: Status,
    /// The ID of the person the transaction belongs to, e.g. "user_001".
    pub user_id: String,
    /// A URL to the person's profile picture.
    #[serde(default)]
    pub user_profile: Option<String>,
}

/// Create the transaction table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL,
                user_id TEXT NOT NULL,
                user_profile TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Insert `transaction` into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred, e.g. the ID is already taken.
pub fn create_transaction(transaction: &Transaction, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO \"transaction\" (id, date, amount, category, status, user_id, user_profile)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            &transaction.id,
            transaction.date,
            transaction.amount,
            transaction.category,
            transaction.status,
            &transaction.user_id,
            &transaction.user_profile,
        ),
    )?;

    Ok(())
}

/// Get every transaction in the order they were inserted.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_all_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, date, amount, category, status, user_id, user_profile \
            FROM \"transaction\" ORDER BY rowid ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get the IDs of everyone who has at least one transaction, sorted.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_unique_user_ids(connection: &Connection) -> Result<Vec<String>, Error> {
    connection
        .prepare("SELECT DISTINCT user_id FROM \"transaction\" ORDER BY user_id ASC")?
        .query_map([], |row| row.get(0))?
        .map(|id_result| id_result.map_err(Error::from))
        .collect()
}

/// Import transactions from a JSON array, e.g. a dump of the original data set.
///
/// All transactions are inserted in one database transaction, so either all
/// of them are imported or none are.
///
/// Returns the number of imported transactions.
///
/// # Errors
///
/// Returns a [Error::ValidationError] if `json` is not an array of transactions,
/// or a [Error::SqlError] if an insert failed.
pub fn import_transactions(json: &str, connection: &Connection) -> Result<usize, Error> {
    let transactions: Vec<Transaction> = serde_json::from_str(json)
        .map_err(|error| Error::ValidationError(format!("could not parse transactions: {error}")))?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    for transaction in &transactions {
        create_transaction(transaction, &sql_transaction)?;
    }

    sql_transaction.commit()?;
    tracing::info!("Imported {} transactions", transactions.len());

    Ok(transactions.len())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        status: row.get(4)?,
        user_id: row.get(5)?,
        user_profile: row.get(6)?,
    })
}
