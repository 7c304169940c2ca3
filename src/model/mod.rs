//! Types that represent the Budgeting API data model, such as `Transaction` and `CategoryGroup`.
mod amount;
mod budget;
mod category;
mod transaction;

pub use amount::{format_milliunits, Milliunits};
pub use budget::Budget;
pub use category::{Category, CategoryGroup, CREDIT_CARD_PAYMENTS, INTERNAL_MASTER_CATEGORY};
pub use transaction::{Subtransaction, Transaction};
