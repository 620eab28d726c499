//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The summary endpoint with totals and the monthly breakdown
//! - The chart endpoint that buckets the monthly breakdown by period

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    dashboard::{
        aggregation::{BucketedPoint, Period, aggregate},
        summary::{DashboardSummary, summarize},
    },
    db::acquire_lock,
    extract::AppQuery,
    transaction::get_all_transactions,
};

/// The state needed for the dashboard endpoints.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for the chart endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// One of "month", "quarter" or "year". Defaults to "month".
    pub period: Option<String>,
}

/// Get the revenue, expense and balance totals with the monthly breakdown.
pub async fn get_dashboard_summary(
    State(state): State<DashboardState>,
) -> Result<Json<DashboardSummary>, Error> {
    let summary = load_summary(&state)?;

    Ok(Json(summary))
}

/// Get the monthly breakdown bucketed by the requested period.
pub async fn get_dashboard_chart(
    State(state): State<DashboardState>,
    AppQuery(query): AppQuery<ChartQuery>,
) -> Result<Json<Vec<BucketedPoint>>, Error> {
    let period = match query.period.as_deref() {
        None | Some("") => Period::default(),
        Some(period) => period.parse()?,
    };

    let summary = load_summary(&state)?;
    let points = aggregate(&summary.monthly_data, period)
        .inspect_err(|error| tracing::error!("could not aggregate monthly data: {error}"))?;

    Ok(Json(points))
}

fn load_summary(state: &DashboardState) -> Result<DashboardSummary, Error> {
    let transactions = {
        let connection = acquire_lock(&state.db_connection)?;
        get_all_transactions(&connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    Ok(summarize(&transactions))
}
