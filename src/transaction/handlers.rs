//! Transaction HTTP handlers.
//!
//! This module contains:
//! - The paged transaction list
//! - The list of users to filter by
//! - The export preview and the CSV export

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    db::acquire_lock,
    extract::{AppJson, AppQuery},
    pagination::{PaginatedResult, PaginationConfig},
    timezone::get_local_date,
    transaction::{
        core::{Transaction, get_all_transactions, get_unique_user_ids},
        export::{parse_columns, project, write_csv},
        filter::{TransactionFilter, TransactionFilterQuery},
        query::{filter_transactions, query},
        users::UserSummary,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The default and maximum page sizes.
    pub pagination_config: PaginationConfig,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The number of transactions an export would contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreview {
    /// The number of transactions matching the filter.
    pub total_transactions: usize,
}

/// The body of an export request.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    /// The filter to apply. Paging is ignored, every match is exported.
    #[serde(default)]
    pub filters: TransactionFilterQuery,
    /// The names of the columns to export, in order.
    pub columns: Vec<String>,
}

const FILE_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Get one page of transactions matching the filter in the query string.
pub async fn get_transactions(
    State(state): State<TransactionState>,
    AppQuery(filter_query): AppQuery<TransactionFilterQuery>,
) -> Result<Json<PaginatedResult<Transaction>>, Error> {
    let filter = filter_query.into_filter(&state.pagination_config)?;
    let transactions = load_transactions(&state)?;

    Ok(Json(query(&transactions, &filter)))
}

/// Get everyone who has transactions, sorted by ID.
pub async fn get_unique_users(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<UserSummary>>, Error> {
    let user_ids = {
        let connection = acquire_lock(&state.db_connection)?;
        get_unique_user_ids(&connection)
            .inspect_err(|error| tracing::error!("could not get user IDs: {error}"))?
    };

    Ok(Json(user_ids.into_iter().map(UserSummary::new).collect()))
}

/// Count the transactions that an export with the same filter would contain.
pub async fn get_export_preview(
    State(state): State<TransactionState>,
    AppQuery(filter_query): AppQuery<TransactionFilterQuery>,
) -> Result<Json<ExportPreview>, Error> {
    let filter = filter_query.into_filter(&state.pagination_config)?;
    let transactions = load_transactions(&state)?;

    Ok(Json(ExportPreview {
        total_transactions: filter_transactions(&transactions, &filter).len(),
    }))
}

/// Export every transaction matching the filter as a CSV attachment.
///
/// The file is named after today's date in the server's timezone, e.g.
/// "transactions-2024-01-31.csv".
pub async fn post_export(
    State(state): State<TransactionState>,
    AppJson(request): AppJson<ExportRequest>,
) -> Result<Response, Error> {
    let columns = parse_columns(&request.columns)?;
    let filter: TransactionFilter = request.filters.into_filter(&state.pagination_config)?;

    let transactions = load_transactions(&state)?;
    let matches = filter_transactions(&transactions, &filter);
    let csv = write_csv(&columns, &project(&matches, &columns))
        .inspect_err(|error| tracing::error!("could not write export: {error}"))?;

    let file_date = get_local_date(&state.local_timezone)?
        .format(FILE_DATE_FORMAT)
        .map_err(|error| Error::SerializationError(error.to_string()))?;

    tracing::info!(
        "Exported {} transactions with columns {:?}",
        matches.len(),
        request.columns
    );

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"transactions-{file_date}.csv\""),
            ),
        ],
        csv,
    )
        .into_response())
}

fn load_transactions(state: &TransactionState) -> Result<Vec<Transaction>, Error> {
    let connection = acquire_lock(&state.db_connection)?;

    get_all_transactions(&connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))
}
