//! Column projection of transactions and CSV serialization for export.

use std::{fmt::Display, str::FromStr};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{Error, transaction::core::Transaction};

/// A transaction field that can be included in an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportColumn {
    /// The transaction ID.
    Id,
    /// The transaction timestamp.
    Date,
    /// The amount with two decimal places.
    Amount,
    /// "Revenue" or "Expense".
    Category,
    /// "Paid" or "Pending".
    Status,
    /// The ID of the user the transaction belongs to.
    UserId,
    /// The URL of the user's profile picture, may be empty.
    UserProfile,
}

impl ExportColumn {
    /// Every column in the order they appear on a transaction.
    pub const ALL: [ExportColumn; 7] = [
        ExportColumn::Id,
        ExportColumn::Date,
        ExportColumn::Amount,
        ExportColumn::Category,
        ExportColumn::Status,
        ExportColumn::UserId,
        ExportColumn::UserProfile,
    ];

    /// The column name used in requests and in the CSV header.
    pub fn name(&self) -> &'static str {
        match self {
            ExportColumn::Id => "id",
            ExportColumn::Date => "date",
            ExportColumn::Amount => "amount",
            ExportColumn::Category => "category",
            ExportColumn::Status => "status",
            ExportColumn::UserId => "user_id",
            ExportColumn::UserProfile => "user_profile",
        }
    }
}

impl Display for ExportColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportColumn::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| {
                Error::ValidationError(format!(
                    "unknown export column \"{s}\", expected one of id, date, amount, \
                    category, status, user_id or user_profile"
                ))
            })
    }
}

/// A single cell of an exported row.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    /// Written as is.
    Text(String),
    /// Written with two decimal places.
    Number(f64),
    /// Written as an RFC 3339 timestamp.
    Date(OffsetDateTime),
    /// Written as an empty field.
    Empty,
}

impl ExportValue {
    /// Format the value as it should appear in a CSV field.
    ///
    /// # Errors
    ///
    /// Returns a [Error::SerializationError] if a date cannot be formatted as RFC 3339,
    /// e.g. because its year is outside 0 to 9999.
    pub fn render(&self) -> Result<String, Error> {
        match self {
            ExportValue::Text(text) => Ok(text.clone()),
            ExportValue::Number(number) => Ok(format!("{number:.2}")),
            ExportValue::Date(date) => date
                .format(&Rfc3339)
                .map_err(|error| Error::SerializationError(error.to_string())),
            ExportValue::Empty => Ok(String::new()),
        }
    }
}

/// One transaction reduced to the selected columns, in the selected order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// The column and value pairs.
    pub cells: Vec<(ExportColumn, ExportValue)>,
}

impl ExportRow {
    /// Get the value of `column`, if it was selected.
    pub fn get(&self, column: ExportColumn) -> Option<&ExportValue> {
        self.cells
            .iter()
            .find(|(cell_column, _)| *cell_column == column)
            .map(|(_, value)| value)
    }
}

/// Convert column names into export columns.
///
/// Duplicate names are dropped, keeping the first occurrence.
///
/// # Errors
///
/// Returns a [Error::ValidationError] if a name is unknown or if `names` is empty.
pub fn parse_columns<S: AsRef<str>>(names: &[S]) -> Result<Vec<ExportColumn>, Error> {
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        let column: ExportColumn = name.as_ref().parse()?;

        if !columns.contains(&column) {
            columns.push(column);
        }
    }

    if columns.is_empty() {
        return Err(Error::ValidationError(
            "select at least one column to export".to_owned(),
        ));
    }

    Ok(columns)
}

/// Reduce each transaction to `columns`, keeping the order of both.
pub fn project(transactions: &[Transaction], columns: &[ExportColumn]) -> Vec<ExportRow> {
    transactions
        .iter()
        .map(|transaction| ExportRow {
            cells: columns
                .iter()
                .map(|column| (*column, export_value(transaction, *column)))
                .collect(),
        })
        .collect()
}

fn export_value(transaction: &Transaction, column: ExportColumn) -> ExportValue {
    match column {
        ExportColumn::Id => ExportValue::Text(transaction.id.clone()),
        ExportColumn::Date => ExportValue::Date(transaction.date),
        ExportColumn::Amount => ExportValue::Number(transaction.amount),
        ExportColumn::Category => ExportValue::Text(transaction.category.to_string()),
        ExportColumn::Status => ExportValue::Text(transaction.status.to_string()),
        ExportColumn::UserId => ExportValue::Text(transaction.user_id.clone()),
        ExportColumn::UserProfile => match &transaction.user_profile {
            Some(user_profile) => ExportValue::Text(user_profile.clone()),
            None => ExportValue::Empty,
        },
    }
}

/// Write a header of `columns` followed by `rows` as CSV.
///
/// Fields are only quoted when needed and records end with CRLF.
///
/// # Errors
///
/// Returns a [Error::CsvError] if the CSV could not be written, or a
/// [Error::SerializationError] if a value could not be formatted.
pub fn write_csv(columns: &[ExportColumn], rows: &[ExportRow]) -> Result<Vec<u8>, Error> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(ExportColumn::name))?;

    for row in rows {
        let record = row
            .cells
            .iter()
            .map(|(_, value)| value.render())
            .collect::<Result<Vec<_>, _>>()?;

        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))
}
