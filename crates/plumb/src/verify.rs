//! The verification run.
//!
//! A run pairs every live table with the model declaring it and checks the
//! pairs in three sequential passes, tables in lexicographic order:
//!
//! 1. columns against attributes (plus the order lifecycle on the orders table)
//! 2. foreign keys
//! 3. indexes
//!
//! A failure in one table never stops the others. Tables without a model are
//! reported as notices and don't affect the verdict. Two models declaring the
//! same table fail that table; the first one registered is still checked.

use crate::check::{
    OrderStateRules, check_attributes, check_foreign_keys, check_indexes, check_order_states,
};
use crate::introspect::{Introspector, ModelRegistry};
use crate::report::{Check, VerificationReport};
use crate::{Error, Result};
use plumb_config::Config;
use plumb_schema::{OrderState, RawModel};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Tables a run ignores entirely.
#[derive(Default)]
pub enum Exclude {
    #[default]
    Nothing,
    /// Exactly these table names.
    Tables(BTreeSet<String>),
    /// Any table the predicate accepts.
    Matching(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Exclude {
    pub fn tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Exclude::Tables(tables.into_iter().map(Into::into).collect())
    }

    pub fn matching(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Exclude::Matching(Box::new(predicate))
    }

    pub fn contains(&self, table: &str) -> bool {
        match self {
            Exclude::Nothing => false,
            Exclude::Tables(tables) => tables.contains(table),
            Exclude::Matching(predicate) => predicate(table),
        }
    }
}

impl fmt::Debug for Exclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclude::Nothing => f.write_str("Nothing"),
            Exclude::Tables(tables) => f.debug_tuple("Tables").field(tables).finish(),
            Exclude::Matching(_) => f.write_str("Matching(..)"),
        }
    }
}

/// Options for a verification run.
#[derive(Debug, Default)]
pub struct VerifyOptions {
    pub exclude: Exclude,
    pub order_states: OrderStateRules,
}

impl VerifyOptions {
    /// Options from a loaded configuration file.
    ///
    /// The order lifecycle isn't part of the file; set it with
    /// [`VerifyOptions::order_states`].
    pub fn from_config(config: &Config) -> Self {
        let mut rules = OrderStateRules::default();
        if let Some(table) = &config.orders_table {
            rules.table = table.clone();
        }
        if let Some(marker) = &config.timestamp_marker {
            rules.timestamp_marker = marker.clone();
        }
        if let Some(audit_columns) = &config.audit_columns {
            rules.audit_columns = audit_columns.clone();
        }

        let exclude = match &config.exclude {
            Some(tables) if !tables.is_empty() => Exclude::tables(tables.iter().cloned()),
            _ => Exclude::Nothing,
        };

        Self {
            exclude,
            order_states: rules,
        }
    }

    pub fn exclude(mut self, exclude: Exclude) -> Self {
        self.exclude = exclude;
        self
    }

    /// Set the order lifecycle the orders table is checked against.
    pub fn order_states(mut self, states: Vec<OrderState>) -> Self {
        self.order_states.states = states;
        self
    }
}

/// Verify the live schema against the registered models.
///
/// Only fails if the table list itself can't be read; everything after that
/// is recorded in the report.
pub async fn verify<I, R>(
    introspector: &I,
    registry: &R,
    options: &VerifyOptions,
) -> Result<VerificationReport>
where
    I: Introspector,
    R: ModelRegistry + ?Sized,
{
    let dialect = introspector.dialect();
    let mut live = introspector.list_tables().await?;
    live.sort();
    live.dedup();

    let mut models: HashMap<String, RawModel> = HashMap::new();
    let mut duplicates: BTreeSet<String> = BTreeSet::new();
    for model in registry.list_models() {
        match models.entry(model.table_name.clone()) {
            Entry::Occupied(_) => {
                duplicates.insert(model.table_name);
            }
            Entry::Vacant(slot) => {
                slot.insert(model);
            }
        }
    }

    let mut pairs: Vec<(&str, &RawModel)> = Vec::new();
    let mut unmatched: Vec<&str> = Vec::new();
    for table in &live {
        if options.exclude.contains(table) {
            tracing::debug!(table = %table, "excluded from verification");
            continue;
        }
        match models.get(table) {
            Some(model) => pairs.push((table.as_str(), model)),
            None => unmatched.push(table.as_str()),
        }
    }

    tracing::debug!(%dialect, tables = pairs.len(), "verifying schema");

    let mut report = VerificationReport::new(dialect);
    for (table, _) in &pairs {
        report.begin_table(table);
    }
    for table in &duplicates {
        if !options.exclude.contains(table) {
            report.duplicate_model(table);
        }
    }

    for (table, model) in &pairs {
        tracing::debug!(table, "checking attributes");
        match introspector.describe_table(table).await {
            Ok(columns) => {
                report.record(
                    table,
                    Check::Attributes,
                    check_attributes(dialect, &columns, model),
                );
                if options.order_states.applies_to(table) {
                    report.record(
                        table,
                        Check::OrderStates,
                        check_order_states(&columns, &options.order_states),
                    );
                }
            }
            Err(err) => report.introspection_failed(table, Check::Attributes, &err),
        }
    }

    for (table, model) in &pairs {
        tracing::debug!(table, "checking foreign keys");
        match introspector.list_foreign_keys(table).await {
            Ok(fks) => {
                report.record(
                    table,
                    Check::ForeignKeys,
                    check_foreign_keys(dialect, &fks, model),
                );
            }
            Err(err) => report.introspection_failed(table, Check::ForeignKeys, &err),
        }
    }

    for (table, model) in &pairs {
        tracing::debug!(table, "checking indexes");
        match introspector.list_indexes(table).await {
            Ok(indexes) => {
                report.record(
                    table,
                    Check::Indexes,
                    check_indexes(dialect, &indexes, model),
                );
            }
            Err(err) => report.introspection_failed(table, Check::Indexes, &err),
        }
    }

    for table in unmatched {
        report.unmatched(table);
    }

    Ok(report)
}

/// Load `.config/plumb.styx` from the current directory or a parent.
pub fn load_config() -> Result<Config> {
    let (config, path) = plumb_config::load()?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Parse the configured dialect name.
pub fn dialect_from_config(config: &Config) -> Result<Option<plumb_schema::Dialect>> {
    match config.dialect.as_deref() {
        None => Ok(None),
        Some(name) => plumb_schema::Dialect::parse(name)
            .map(Some)
            .ok_or_else(|| Error::UnknownDialect(name.to_string())),
    }
}
