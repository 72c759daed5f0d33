//! Categories: user-defined labels that classify transactions as a kind of
//! income or expense.

mod core;
mod endpoints;

pub use self::core::{
    Category, CategoryKind, NewCategory, create_category, create_category_table, delete_category,
    get_category, list_categories, update_category,
};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
