//! FinLoopr is the backend for a personal-finance dashboard.
//!
//! This library provides a JSON REST API for registering and logging in users,
//! summarising revenue and expenses, and browsing and exporting transactions.
//!
//! The data pipeline behind the API is exposed as plain functions so that the
//! same semantics can be reused by any client:
//! - [aggregate] buckets monthly records into month, quarter or year series.
//! - [query] filters, sorts and paginates transactions.
//! - [project] and [write_csv] shape transactions for export.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod dashboard;
mod db;
mod debounce;
mod endpoints;
mod error;
mod extract;
mod logging;
mod pagination;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    Account, PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_email,
    update_password,
};
pub use dashboard::{BucketedPoint, DashboardSummary, MonthlyRecord, Period, aggregate, summarize};
pub use db::initialize as initialize_db;
pub use debounce::{DEFAULT_QUIET_PERIOD, Debouncer, RequestGeneration, RequestTicket};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::{PaginatedResult, Pagination, PaginationConfig, paginate};
pub use routing::{build_router, cors_layer};
pub use transaction::{
    Category, ExportColumn, ExportRow, ExportValue, SortDirection, SortField, Status,
    Transaction, TransactionFilter, TransactionFilterQuery, UserSummary, create_transaction,
    filter_transactions, format_user_name, import_transactions, parse_columns, project, query,
    write_csv,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
