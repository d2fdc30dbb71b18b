//! Table checks.
//!
//! Each check compares one kind of introspected metadata for one table with
//! the table's model and returns every [`Violation`](crate::Violation) it
//! finds. Checks never stop at the first problem and never call each other.

mod attributes;
mod foreign_keys;
mod indexes;
mod order_states;

pub use attributes::check_attributes;
pub use foreign_keys::check_foreign_keys;
pub use indexes::check_indexes;
pub use order_states::{DEFAULT_AUDIT_COLUMNS, OrderStateRules, check_order_states};
