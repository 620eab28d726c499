//! The filter, sort and page options for listing transactions.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{
    Error, PaginationConfig,
    transaction::core::{Category, Status},
};

/// The transaction field to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Sort by ID as text.
    Id,
    /// Sort chronologically.
    #[default]
    Date,
    /// Sort numerically by amount.
    Amount,
    /// Sort by the category name.
    Category,
    /// Sort by the status name.
    Status,
    /// Sort by the user ID as text.
    UserId,
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "date" => Ok(SortField::Date),
            "amount" => Ok(SortField::Amount),
            "category" => Ok(SortField::Category),
            "status" => Ok(SortField::Status),
            "user_id" => Ok(SortField::UserId),
            other => Err(Error::ValidationError(format!(
                "cannot sort by \"{other}\", expected one of id, date, amount, category, status or user_id"
            ))),
        }
    }
}

/// The direction to sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest or earliest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Largest or latest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            other => Err(Error::ValidationError(format!(
                "invalid sort order \"{other}\", expected asc or desc"
            ))),
        }
    }
}

/// A validated set of constraints, sort order and page for listing transactions.
///
/// Fields set to `None` do not constrain the results.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// Text to look for in the user's display name, the category or the status.
    pub search: Option<String>,
    /// Only include transactions in this category.
    pub category: Option<Category>,
    /// Only include transactions with this status.
    pub status: Option<Status>,
    /// Only include transactions belonging to this user.
    pub user_id: Option<String>,
    /// Only include transactions on or after this UTC date.
    pub date_from: Option<Date>,
    /// Only include transactions on or before this UTC date.
    pub date_to: Option<Date>,
    /// The field to sort by.
    pub sort_by: SortField,
    /// The direction to sort in.
    pub sort_order: SortDirection,
    /// The 1-based page to return.
    pub page: u64,
    /// The maximum number of transactions per page.
    pub limit: u64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            status: None,
            user_id: None,
            date_from: None,
            date_to: None,
            sort_by: SortField::default(),
            sort_order: SortDirection::default(),
            page: 1,
            limit: PaginationConfig::default().default_page_size,
        }
    }
}

impl TransactionFilter {
    /// The number of constraints that are set, ignoring sorting and paging.
    ///
    /// An empty search string does not count.
    pub fn active_filter_count(&self) -> usize {
        [
            self.search.as_deref().is_some_and(|search| !search.is_empty()),
            self.category.is_some(),
            self.status.is_some(),
            self.user_id.as_deref().is_some_and(|user_id| !user_id.is_empty()),
            self.date_from.is_some(),
            self.date_to.is_some(),
        ]
        .into_iter()
        .filter(|is_active| *is_active)
        .count()
    }
}

/// The filter as sent by a client, either as URL query parameters or in a JSON body.
///
/// Every field is optional and an empty string is treated as if the field was
/// not sent. Use [TransactionFilterQuery::into_filter] to validate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilterQuery {
    /// Free text search.
    #[serde(default)]
    pub search: Option<String>,
    /// "Revenue" or "Expense".
    #[serde(default)]
    pub category: Option<String>,
    /// "Paid" or "Pending".
    #[serde(default)]
    pub status: Option<String>,
    /// The user ID, e.g. "user_001".
    #[serde(default, rename = "user_id")]
    pub user_id: Option<String>,
    /// A date "YYYY-MM-DD" or an RFC 3339 timestamp.
    #[serde(default)]
    pub date_from: Option<String>,
    /// A date "YYYY-MM-DD" or an RFC 3339 timestamp.
    #[serde(default)]
    pub date_to: Option<String>,
    /// One of the [SortField] names.
    #[serde(default)]
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    #[serde(default)]
    pub sort_order: Option<String>,
    /// The 1-based page number.
    #[serde(default, deserialize_with = "text_or_number")]
    pub page: Option<String>,
    /// The page size.
    #[serde(default, deserialize_with = "text_or_number")]
    pub limit: Option<String>,
}

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

impl TransactionFilterQuery {
    /// Validate the query and convert it into a [TransactionFilter].
    ///
    /// Missing fields take the defaults of [TransactionFilter], except the page
    /// size which defaults to `config.default_page_size`.
    ///
    /// # Errors
    ///
    /// Returns a [Error::ValidationError] if a field cannot be parsed, if the page
    /// or page size is zero, if the page size exceeds `config.max_page_size`, or
    /// if `dateFrom` is after `dateTo`.
    pub fn into_filter(self, config: &PaginationConfig) -> Result<TransactionFilter, Error> {
        let date_from = non_empty(self.date_from)
            .map(|date| parse_filter_date(&date, "dateFrom"))
            .transpose()?;
        let date_to = non_empty(self.date_to)
            .map(|date| parse_filter_date(&date, "dateTo"))
            .transpose()?;

        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(Error::ValidationError(format!(
                    "dateFrom ({from}) must not be after dateTo ({to})"
                )));
            }
        }

        let page = non_empty(self.page)
            .map(|page| parse_positive(&page, "page"))
            .transpose()?
            .unwrap_or(1);
        let limit = non_empty(self.limit)
            .map(|limit| parse_positive(&limit, "limit"))
            .transpose()?
            .unwrap_or(config.default_page_size);

        if limit > config.max_page_size {
            return Err(Error::ValidationError(format!(
                "limit must be at most {}, got {limit}",
                config.max_page_size
            )));
        }

        Ok(TransactionFilter {
            search: non_empty(self.search),
            category: non_empty(self.category).map(|c| c.parse()).transpose()?,
            status: non_empty(self.status).map(|s| s.parse()).transpose()?,
            user_id: non_empty(self.user_id),
            date_from,
            date_to,
            sort_by: non_empty(self.sort_by)
                .map(|field| field.parse())
                .transpose()?
                .unwrap_or_default(),
            sort_order: non_empty(self.sort_order)
                .map(|order| order.parse())
                .transpose()?
                .unwrap_or_default(),
            page,
            limit,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Parse a date in the format "YYYY-MM-DD", or the UTC date of an RFC 3339 timestamp.
fn parse_filter_date(text: &str, field: &str) -> Result<Date, Error> {
    Date::parse(text, DATE_FORMAT)
        .or_else(|_| {
            OffsetDateTime::parse(text, &Rfc3339)
                .map(|date_time| date_time.to_offset(UtcOffset::UTC).date())
        })
        .map_err(|_| {
            Error::ValidationError(format!(
                "invalid {field} \"{text}\", expected a date like 2024-01-31"
            ))
        })
}

fn parse_positive(text: &str, field: &str) -> Result<u64, Error> {
    match text.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(Error::ValidationError(format!(
            "{field} must be a whole number of at least 1, got \"{text}\""
        ))),
    }
}

/// JSON clients send page numbers as numbers while query strings carry text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(u64),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}
