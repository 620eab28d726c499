//! Period aggregation of monthly revenue and expenses for charts.
//!
//! Monthly records are bucketed by month, quarter or year and returned in
//! chronological order.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

/// The revenue and expenses for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    /// The month in the format "YYYY-MM".
    pub month: String,
    /// The total revenue for the month.
    pub revenue: f64,
    /// The total expenses for the month.
    pub expenses: f64,
}

/// The revenue and expenses for one bucket of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedPoint {
    /// The bucket label, e.g. "Jan 24", "Q1 2024" or "2024".
    pub label: String,
    /// The summed revenue of the records in the bucket.
    pub revenue: f64,
    /// The summed expenses of the records in the bucket.
    pub expenses: f64,
}

/// The size of the buckets used by [aggregate].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One bucket per monthly record.
    #[default]
    Month,
    /// Calendar quarters, January to March is Q1.
    Quarter,
    /// Calendar years.
    Year,
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(Error::ValidationError(format!(
                "unknown period \"{other}\", expected one of month, quarter or year"
            ))),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        };

        f.write_str(name)
    }
}

const MONTH_START_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Aggregate `records` into chronologically ordered buckets of `period`.
///
/// - [Period::Month] keeps one point per record, labelled like "Jan 24".
/// - [Period::Quarter] sums records per calendar quarter, labelled like "Q1 2024".
/// - [Period::Year] sums records per calendar year, labelled like "2024".
///
/// # Errors
/// Returns [Error::MalformedInput] if any record's month is not in the format "YYYY-MM".
/// No partial result is returned.
pub fn aggregate(records: &[MonthlyRecord], period: Period) -> Result<Vec<BucketedPoint>, Error> {
    let mut parsed = records
        .iter()
        .map(|record| parse_month(&record.month).map(|month| (month, record)))
        .collect::<Result<Vec<_>, _>>()?;

    let points = match period {
        Period::Month => {
            // Stable, so records for the same month keep their input order.
            parsed.sort_by_key(|(month, _)| *month);

            parsed
                .into_iter()
                .map(|(month, record)| BucketedPoint {
                    label: format_month_label(month),
                    revenue: record.revenue,
                    expenses: record.expenses,
                })
                .collect()
        }
        Period::Quarter => sum_by(&parsed, |month| (month.year(), quarter_of(month.month())))
            .into_iter()
            .map(|((year, quarter), (revenue, expenses))| BucketedPoint {
                label: format!("Q{quarter} {year:04}"),
                revenue,
                expenses,
            })
            .collect(),
        Period::Year => sum_by(&parsed, |month| month.year())
            .into_iter()
            .map(|(year, (revenue, expenses))| BucketedPoint {
                label: format!("{year:04}"),
                revenue,
                expenses,
            })
            .collect(),
    };

    Ok(points)
}

/// Parse "YYYY-MM" into the first day of that month.
fn parse_month(raw_month: &str) -> Result<Date, Error> {
    Date::parse(&format!("{raw_month}-01"), MONTH_START_FORMAT)
        .map_err(|_| Error::MalformedInput(raw_month.to_owned()))
}

/// The 1-based calendar quarter of `month`.
fn quarter_of(month: Month) -> u8 {
    (u8::from(month) - 1) / 3 + 1
}

/// Sum revenue and expenses keyed by `key`, ordered by key.
fn sum_by<K: Ord>(
    records: &[(Date, &MonthlyRecord)],
    key: impl Fn(Date) -> K,
) -> BTreeMap<K, (f64, f64)> {
    let mut totals = BTreeMap::new();

    for (month, record) in records {
        let (revenue, expenses) = totals.entry(key(*month)).or_insert((0.0, 0.0));
        *revenue += record.revenue;
        *expenses += record.expenses;
    }

    totals
}

/// Format a month as a three-letter abbreviation and two-digit year, e.g. "Jan 24".
fn format_month_label(date: Date) -> String {
    let month = match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    };

    format!("{month} {:02}", date.year().rem_euclid(100))
}
