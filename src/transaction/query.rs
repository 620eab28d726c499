//! Filtering, sorting and paging of transactions.

use std::cmp::Ordering;

use time::UtcOffset;

use crate::{
    pagination::{PaginatedResult, paginate},
    transaction::{
        core::Transaction,
        filter::{SortDirection, SortField, TransactionFilter},
    },
};

/// Turn a user ID into a display name, e.g. "john_doe" becomes "John Doe".
///
/// Underscores become spaces and the first letter or digit of each word is
/// upper-cased.
pub fn format_user_name(user_id: &str) -> String {
    let mut display_name = String::with_capacity(user_id.len());
    let mut at_word_start = true;

    for c in user_id.chars().map(|c| if c == '_' { ' ' } else { c }) {
        let is_word_char = c.is_ascii_alphanumeric();

        if is_word_char && at_word_start {
            display_name.push(c.to_ascii_uppercase());
        } else {
            display_name.push(c);
        }

        at_word_start = !is_word_char;
    }

    display_name
}

/// Apply the constraints and sort order of `filter` to `transactions`, ignoring the page.
///
/// The sort is stable, so transactions that compare equal keep their relative
/// order from `transactions` in both directions.
pub fn filter_transactions(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> Vec<Transaction> {
    let search = filter
        .search
        .as_deref()
        .filter(|search| !search.is_empty())
        .map(str::to_lowercase);

    let mut matches: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| matches_filter(transaction, filter, search.as_deref()))
        .cloned()
        .collect();

    matches.sort_by(|a, b| {
        let ordering = compare_by(a, b, filter.sort_by);

        match filter.sort_order {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    matches
}

/// Filter, sort and then page `transactions` according to `filter`.
///
/// The page totals count every transaction that matched the filter.
pub fn query(
    transactions: &[Transaction],
    filter: &TransactionFilter,
) -> PaginatedResult<Transaction> {
    paginate(
        filter_transactions(transactions, filter),
        filter.page,
        filter.limit,
    )
}

/// `search` must already be lower case.
fn matches_filter(
    transaction: &Transaction,
    filter: &TransactionFilter,
    search: Option<&str>,
) -> bool {
    if let Some(search) = search {
        let found = format_user_name(&transaction.user_id)
            .to_lowercase()
            .contains(search)
            || transaction.category.as_str().to_lowercase().contains(search)
            || transaction.status.as_str().to_lowercase().contains(search);

        if !found {
            return false;
        }
    }

    if filter
        .category
        .is_some_and(|category| category != transaction.category)
        || filter.status.is_some_and(|status| status != transaction.status)
    {
        return false;
    }

    if let Some(user_id) = filter.user_id.as_deref() {
        if !user_id.is_empty() && user_id != transaction.user_id {
            return false;
        }
    }

    let date = transaction.date.to_offset(UtcOffset::UTC).date();

    filter.date_from.is_none_or(|from| date >= from) && filter.date_to.is_none_or(|to| date <= to)
}

fn compare_by(a: &Transaction, b: &Transaction, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Date => a.date.cmp(&b.date),
        SortField::Amount => a.amount.total_cmp(&b.amount),
        SortField::Category => a.category.as_str().cmp(b.category.as_str()),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::UserId => a.user_id.cmp(&b.user_id),
    }
}
