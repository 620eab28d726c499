//! Transactions and the pipeline that shapes them for the client.
//!
//! This module contains:
//! - The `Transaction` model and its database functions
//! - Filtering, sorting and paging of transaction lists
//! - Projecting transactions onto export columns and writing CSV
//! - The HTTP handlers for listing and exporting transactions

mod core;
mod export;
mod filter;
mod handlers;
mod query;
mod users;

pub use core::{
    Category, Status, Transaction, create_transaction, create_transaction_table,
    get_all_transactions, import_transactions,
};
pub use export::{ExportColumn, ExportRow, ExportValue, parse_columns, project, write_csv};
pub use filter::{SortDirection, SortField, TransactionFilter, TransactionFilterQuery};
pub use handlers::{get_export_preview, get_transactions, get_unique_users, post_export};
pub use query::{filter_transactions, format_user_name, query};
pub use users::UserSummary;
