//! Dashboard module
//!
//! Provides the financial summary and the period-bucketed chart series.

mod aggregation;
mod handlers;
mod summary;

pub use aggregation::{BucketedPoint, MonthlyRecord, Period, aggregate};
pub use handlers::{get_dashboard_chart, get_dashboard_summary};
pub use summary::{DashboardSummary, summarize};
