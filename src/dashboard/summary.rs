//! Totals and monthly breakdown shown at the top of the dashboard.

use std::collections::BTreeMap;

use serde::Serialize;
use time::UtcOffset;

use crate::{
    dashboard::aggregation::MonthlyRecord,
    transaction::{Category, Transaction},
};

/// The revenue, expenses and balance across all transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The sum of all revenue.
    pub total_revenue: f64,
    /// The sum of all expenses, as a positive number.
    pub total_expenses: f64,
    /// Revenue minus expenses.
    pub total_balance: f64,
    /// Revenue and expenses per calendar month (UTC), oldest first.
    pub monthly_data: Vec<MonthlyRecord>,
}

/// Summarise `transactions` into totals and a monthly breakdown.
///
/// The sign of a stored amount is ignored, the category decides whether it
/// counts as revenue or as an expense.
pub fn summarize(transactions: &[Transaction]) -> DashboardSummary {
    let mut monthly_totals: BTreeMap<(i32, u8), (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let date = transaction.date.to_offset(UtcOffset::UTC).date();
        let (revenue, expenses) = monthly_totals
            .entry((date.year(), u8::from(date.month())))
            .or_insert((0.0, 0.0));

        match transaction.category {
            Category::Revenue => *revenue += transaction.amount.abs(),
            Category::Expense => *expenses += transaction.amount.abs(),
        }
    }

    let monthly_data: Vec<MonthlyRecord> = monthly_totals
        .into_iter()
        .map(|((year, month), (revenue, expenses))| MonthlyRecord {
            month: format!("{year:04}-{month:02}"),
            revenue,
            expenses,
        })
        .collect();

    let total_revenue: f64 = monthly_data.iter().map(|record| record.revenue).sum();
    let total_expenses: f64 = monthly_data.iter().map(|record| record.expenses).sum();

    DashboardSummary {
        total_revenue,
        total_expenses,
        total_balance: total_revenue - total_expenses,
        monthly_data,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use crate::{
        dashboard::{aggregation::MonthlyRecord, summary::summarize},
        transaction::{Category, Status},
        test_utils::transaction,
    };

    #[test]
    fn empty_transactions_give_zero_summary() {
        let got = summarize(&[]);

        assert_eq!(got.total_revenue, 0.0);
        assert_eq!(got.total_expenses, 0.0);
        assert_eq!(got.total_balance, 0.0);
        assert!(got.monthly_data.is_empty());
    }

    #[test]
    fn totals_use_category_not_sign() {
        let transactions = vec![
            transaction(
                "1",
                datetime!(2024-01-05 10:00 UTC),
                500.0,
                Category::Revenue,
                Status::Paid,
                "user_001",
            ),
            transaction(
                "2",
                datetime!(2024-01-06 10:00 UTC),
                -120.0,
                Category::Expense,
                Status::Paid,
                "user_001",
            ),
            transaction(
                "3",
                datetime!(2024-02-01 00:00 UTC),
                80.0,
                Category::Expense,
                Status::Pending,
                "user_002",
            ),
        ];

        let got = summarize(&transactions);

        assert_eq!(got.total_revenue, 500.0);
        assert_eq!(got.total_expenses, 200.0);
        assert_eq!(got.total_balance, 300.0);
    }

    #[test]
    fn monthly_data_is_grouped_and_sorted() {
        let transactions = vec![
            transaction(
                "1",
                datetime!(2024-03-31 23:00 UTC),
                10.0,
                Category::Revenue,
                Status::Paid,
                "user_001",
            ),
            transaction(
                "2",
                datetime!(2023-12-01 00:00 UTC),
                5.0,
                Category::Expense,
                Status::Paid,
                "user_001",
            ),
            transaction(
                "3",
                datetime!(2024-03-01 00:00 UTC),
                2.0,
                Category::Expense,
                Status::Paid,
                "user_002",
            ),
        ];

        let got = summarize(&transactions);

        assert_eq!(
            got.monthly_data,
            vec![
                MonthlyRecord {
                    month: "2023-12".to_owned(),
                    revenue: 0.0,
                    expenses: 5.0,
                },
                MonthlyRecord {
                    month: "2024-03".to_owned(),
                    revenue: 10.0,
                    expenses: 2.0,
                },
            ]
        );
    }

    #[test]
    fn months_use_utc_dates() {
        let transactions = vec![transaction(
            "1",
            datetime!(2024-04-01 01:00 +13:00),
            10.0,
            Category::Revenue,
            Status::Paid,
            "user_001",
        )];

        let got = summarize(&transactions);

        assert_eq!(got.monthly_data[0].month, "2024-03");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let got = serde_json::to_value(summarize(&[])).unwrap();

        assert_eq!(
            got,
            serde_json::json!({
                "totalRevenue": 0.0,
                "totalExpenses": 0.0,
                "totalBalance": 0.0,
                "monthlyData": []
            })
        );
    }
}
