use crate::Violation;
use plumb_schema::{OrderState, TableDescription};
use std::collections::BTreeSet;

/// Timestamp columns on the orders table that record bookkeeping, not a
/// lifecycle state.
pub const DEFAULT_AUDIT_COLUMNS: &[&str] = &[
    "touched_at",
    "issue_at",
    "updated_at",
    "deleted_at",
    "created_at",
    "inspected_at",
];

/// How the orders table relates to the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderStateRules {
    /// Table whose timestamp columns track the lifecycle
    pub table: String,
    /// Substring that marks a column as a timestamp
    pub timestamp_marker: String,
    /// Timestamp columns that aren't lifecycle states
    pub audit_columns: Vec<String>,
    /// The lifecycle, in order
    pub states: Vec<OrderState>,
}

impl Default for OrderStateRules {
    fn default() -> Self {
        Self {
            table: "orders".to_string(),
            timestamp_marker: "_at".to_string(),
            audit_columns: DEFAULT_AUDIT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            states: Vec::new(),
        }
    }
}

impl OrderStateRules {
    /// Default rules for the given lifecycle.
    pub fn new(states: Vec<OrderState>) -> Self {
        Self {
            states,
            ..Default::default()
        }
    }

    pub fn applies_to(&self, table: &str) -> bool {
        self.table == table
    }
}

/// Check that the orders table has exactly one timestamp column per
/// lifecycle state that declares one.
pub fn check_order_states(columns: &TableDescription, rules: &OrderStateRules) -> Vec<Violation> {
    let live: BTreeSet<&str> = columns
        .keys()
        .map(String::as_str)
        .filter(|name| name.contains(rules.timestamp_marker.as_str()))
        .filter(|name| !rules.audit_columns.iter().any(|audit| audit == name))
        .collect();

    let declared: BTreeSet<&str> = rules
        .states
        .iter()
        .filter_map(|state| state.dt_column.as_deref())
        .collect();

    if live == declared {
        return Vec::new();
    }

    vec![Violation::StateColumnMismatch {
        columns: live.into_iter().map(str::to_string).collect(),
        states: declared.into_iter().map(str::to_string).collect(),
    }]
}
