//! Pure aggregation over transaction records.
//!
//! Amounts are summed in Rust rather than SQL so the fixed-point decimals
//! stay exact. Each function takes the full record set for a user and
//! derives one report view; none of them mutate anything.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::{
    budget::{first_of_month, month_format},
    category::Category,
    database_id::CategoryId,
    transaction::TransactionType,
};

/// The slice of a transaction the reports need.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Whether money came in or went out.
    pub transaction_type: TransactionType,
    /// The amount, a positive magnitude.
    pub amount: Decimal,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The calendar date the money moved.
    pub date: Date,
}

/// Income, expenses, and savings over some period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    /// The sum of income amounts.
    pub total_income: Decimal,
    /// The sum of expense amounts.
    pub total_expenses: Decimal,
    /// Income minus expenses.
    pub net_savings: Decimal,
}

/// Income, expenses, and savings for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// The month, as "YYYY-MM" on the wire.
    #[serde(with = "month_format")]
    pub month: Date,
    /// The sum of income amounts in the month.
    pub income: Decimal,
    /// The sum of expense amounts in the month.
    pub expenses: Decimal,
    /// Income minus expenses for the month.
    pub savings: Decimal,
}

/// Whether spending in a category is within its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetStatus {
    /// Spending is within the budget, or there is no budget to exceed.
    #[serde(rename = "OK")]
    Ok,
    /// A budget exists and spending has gone past it.
    Exceeded,
}

/// Budget versus actual spending for one category in the current month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    /// The category's ID.
    pub category_id: CategoryId,
    /// The category's display name.
    pub category: String,
    /// The sum of this month's expenses in the category.
    pub expenditure: Decimal,
    /// The budget amount for this month, or zero if none is set.
    pub budget: Decimal,
    /// Budget minus expenditure.
    pub balance: Decimal,
    /// Whether the budget has been exceeded.
    pub status: BudgetStatus,
}

/// The full dashboard response: every report view in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Totals over the entire transaction log.
    pub all_time_summary: PeriodSummary,
    /// Totals restricted to the calendar month containing "now".
    pub current_month_summary: PeriodSummary,
    /// Budget versus actual for every category, one row each.
    pub category_summary: Vec<CategorySummary>,
    /// Totals per calendar month, oldest first.
    pub monthly_history: Vec<MonthlyTotals>,
}

fn two_dp(mut value: Decimal) -> Decimal {
    value.rescale(2);
    value
}

/// Sum income and expenses over `records`.
///
/// An empty record set yields zeros, not an error.
pub fn period_summary(records: &[TransactionRecord]) -> PeriodSummary {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;

    for record in records {
        match record.transaction_type {
            TransactionType::Income => total_income += record.amount,
            TransactionType::Expense => total_expenses += record.amount,
        }
    }

    PeriodSummary {
        total_income: two_dp(total_income),
        total_expenses: two_dp(total_expenses),
        net_savings: two_dp(total_income - total_expenses),
    }
}

/// Sum income and expenses over the records that fall in the calendar
/// month containing `today`.
pub fn month_summary(records: &[TransactionRecord], today: Date) -> PeriodSummary {
    let month = first_of_month(today);
    let in_month: Vec<TransactionRecord> = records
        .iter()
        .filter(|record| first_of_month(record.date) == month)
        .cloned()
        .collect();

    period_summary(&in_month)
}

/// Group `records` by calendar month and sum each side per month, oldest
/// month first.
///
/// Both figures start at zero for every month that appears, so a month
/// with only income still reports zero expenses and vice versa.
pub fn monthly_history(records: &[TransactionRecord]) -> Vec<MonthlyTotals> {
    let mut totals: BTreeMap<Date, (Decimal, Decimal)> = BTreeMap::new();

    for record in records {
        let entry = totals
            .entry(first_of_month(record.date))
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match record.transaction_type {
            TransactionType::Income => entry.0 += record.amount,
            TransactionType::Expense => entry.1 += record.amount,
        }
    }

    totals
        .into_iter()
        .map(|(month, (income, expenses))| MonthlyTotals {
            month,
            income: two_dp(income),
            expenses: two_dp(expenses),
            savings: two_dp(income - expenses),
        })
        .collect()
}

/// Compute budget versus actual for every category, one row per category
/// regardless of whether the category saw any transactions this month.
///
/// The status is [BudgetStatus::Exceeded] only when a budget exists and
/// the month's expenditure has gone past it; a category with no budget is
/// always [BudgetStatus::Ok].
pub fn category_summaries(
    categories: &[Category],
    budgets: &HashMap<CategoryId, Decimal>,
    records: &[TransactionRecord],
    today: Date,
) -> Vec<CategorySummary> {
    let month = first_of_month(today);

    let mut expenditure_by_category: HashMap<CategoryId, Decimal> = HashMap::new();
    for record in records {
        if record.transaction_type == TransactionType::Expense
            && first_of_month(record.date) == month
        {
            *expenditure_by_category
                .entry(record.category_id)
                .or_insert(Decimal::ZERO) += record.amount;
        }
    }

    categories
        .iter()
        .map(|category| {
            let expenditure = expenditure_by_category
                .get(&category.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let budget = budgets.get(&category.id).copied();
            let status = match budget {
                Some(budget) if expenditure > budget => BudgetStatus::Exceeded,
                _ => BudgetStatus::Ok,
            };
            let budget = budget.unwrap_or(Decimal::ZERO);

            CategorySummary {
                category_id: category.id,
                category: category.name.clone(),
                expenditure: two_dp(expenditure),
                budget: two_dp(budget),
                balance: two_dp(budget - expenditure),
                status,
            }
        })
        .collect()
}
