//! The two sources a verification run reads from.

use crate::Result;
use plumb_schema::{
    Dialect, IntrospectedForeignKey, IntrospectedIndex, RawModel, TableDescription,
    collect_models,
};
use std::future::Future;

/// Live schema metadata.
///
/// Every call must reflect the database at call time; the verifier never
/// caches results between calls.
pub trait Introspector: Sync {
    /// Dialect of the database being introspected.
    fn dialect(&self) -> Dialect;

    /// Names of all tables.
    fn list_tables(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Columns of `table`, keyed by column name.
    fn describe_table(&self, table: &str)
    -> impl Future<Output = Result<TableDescription>> + Send;

    /// Foreign-key constraints on `table`, one entry per constrained column.
    fn list_foreign_keys(
        &self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<IntrospectedForeignKey>>> + Send;

    /// Indexes on `table`, including ones the database created implicitly.
    fn list_indexes(&self, table: &str)
    -> impl Future<Output = Result<Vec<IntrospectedIndex>>> + Send;
}

/// Declared model metadata.
pub trait ModelRegistry {
    fn list_models(&self) -> Vec<RawModel>;
}

impl ModelRegistry for [RawModel] {
    fn list_models(&self) -> Vec<RawModel> {
        self.to_vec()
    }
}

impl ModelRegistry for Vec<RawModel> {
    fn list_models(&self) -> Vec<RawModel> {
        self.clone()
    }
}

/// Models registered with `inventory::submit!(ModelDef::new(...))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registered;

impl ModelRegistry for Registered {
    fn list_models(&self) -> Vec<RawModel> {
        collect_models()
    }
}
