//! Budgets: a monthly spending limit for a category, unique per
//! (user, category, calendar month).

mod core;
mod endpoints;

pub use self::core::{
    Budget, NewBudget, budget_amounts_for_month, create_budget, create_budget_table,
    delete_budget, first_of_month, format_month, get_budget, list_budgets, parse_month,
    update_budget,
};
pub use endpoints::{
    create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint, list_budgets_endpoint,
    update_budget_endpoint,
};

pub(crate) use self::core::month_format;
