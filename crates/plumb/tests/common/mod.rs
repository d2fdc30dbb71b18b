#![allow(dead_code)]

use plumb::{
    AttrType, Dialect, Error, IntrospectedColumn, IntrospectedForeignKey, IntrospectedIndex,
    Introspector, ModelAttribute, ModelIndex, OrderState, RawModel, TableDescription,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Route tracing output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One table as the in-memory database reports it.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: TableDescription,
    pub foreign_keys: Vec<IntrospectedForeignKey>,
    pub indexes: Vec<IntrospectedIndex>,
}

/// Which introspection call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Call {
    ListTables,
    Describe,
    ForeignKeys,
    Indexes,
}

/// An introspector backed by plain data, counting every call it receives.
#[derive(Debug)]
pub struct MemoryIntrospector {
    pub dialect: Dialect,
    pub tables: BTreeMap<String, MemoryTable>,
    failing: BTreeSet<(Call, String)>,
    stalling: BTreeSet<String>,
    calls: AtomicUsize,
    list_tables_calls: AtomicUsize,
}

impl MemoryIntrospector {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: BTreeMap::new(),
            failing: BTreeSet::new(),
            stalling: BTreeSet::new(),
            calls: AtomicUsize::new(0),
            list_tables_calls: AtomicUsize::new(0),
        }
    }

    pub fn table(mut self, name: &str, table: MemoryTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    /// Make `call` fail for `table` (`"*"` for `ListTables`).
    pub fn failing(mut self, call: Call, table: &str) -> Self {
        self.failing.insert((call, table.to_string()));
        self
    }

    /// Make `describe_table` hang for an hour on `table`.
    pub fn stalling(mut self, table: &str) -> Self {
        self.stalling.insert(table.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn list_tables_calls(&self) -> usize {
        self.list_tables_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, call: Call, table: &str) -> plumb::Result<&MemoryTable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&(call, table.to_string())) {
            return Err(Error::Introspection(format!("{:?} failed for {}", call, table)));
        }
        self.tables
            .get(table)
            .ok_or_else(|| Error::Introspection(format!("no table {}", table)))
    }
}

impl Introspector for MemoryIntrospector {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn list_tables(&self) -> plumb::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.list_tables_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&(Call::ListTables, "*".to_string())) {
            return Err(Error::Introspection("connection refused".to_string()));
        }
        Ok(self.tables.keys().rev().cloned().collect())
    }

    async fn describe_table(&self, table: &str) -> plumb::Result<TableDescription> {
        if self.stalling.contains(table) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        Ok(self.enter(Call::Describe, table)?.columns.clone())
    }

    async fn list_foreign_keys(&self, table: &str) -> plumb::Result<Vec<IntrospectedForeignKey>> {
        Ok(self.enter(Call::ForeignKeys, table)?.foreign_keys.clone())
    }

    async fn list_indexes(&self, table: &str) -> plumb::Result<Vec<IntrospectedIndex>> {
        Ok(self.enter(Call::Indexes, table)?.indexes.clone())
    }
}

pub fn customers_model() -> RawModel {
    RawModel::new("customers")
        .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
        .attribute(ModelAttribute::new("email", AttrType::VarChar(255)).not_null().unique())
        .attribute(ModelAttribute::new("signed_up_on", AttrType::Date))
}

pub fn orders_model() -> RawModel {
    RawModel::new("orders")
        .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
        .attribute(
            ModelAttribute::new("customer_id", AttrType::BigInt)
                .not_null()
                .references("customers", "id"),
        )
        .attribute(ModelAttribute::new("created_at", AttrType::DateTime).not_null())
        .attribute(ModelAttribute::new("issued_at", AttrType::DateTime))
        .attribute(ModelAttribute::new("paid_at", AttrType::DateTime))
        .index(ModelIndex::new(["customer_id", "created_at"]))
}

pub fn lifecycle() -> Vec<OrderState> {
    vec![
        OrderState::new("pending"),
        OrderState::with_column("issued", "issued_at"),
        OrderState::with_column("paid", "paid_at"),
    ]
}

/// Postgres tables that agree with [`customers_model`] and [`orders_model`].
pub fn postgres_db() -> MemoryIntrospector {
    const TS: &str = "TIMESTAMP WITH TIME ZONE";

    let customers = MemoryTable {
        columns: [
            ("id", IntrospectedColumn::new("BIGINT").pk().not_null()),
            ("email", IntrospectedColumn::new("CHARACTER VARYING(255)").not_null()),
            ("signed_up_on", IntrospectedColumn::new("DATE")),
        ]
        .into_iter()
        .map(|(name, col)| (name.to_string(), col))
        .collect(),
        foreign_keys: vec![],
        indexes: vec![
            IntrospectedIndex::new("customers_pkey", ["id"]).primary(),
            IntrospectedIndex::new("customers_email_key", ["email"]).unique(),
        ],
    };

    let orders = MemoryTable {
        columns: [
            ("id", IntrospectedColumn::new("BIGINT").pk().not_null()),
            ("customer_id", IntrospectedColumn::new("BIGINT").not_null()),
            ("created_at", IntrospectedColumn::new(TS).not_null().default_value("now()")),
            ("issued_at", IntrospectedColumn::new(TS)),
            ("paid_at", IntrospectedColumn::new(TS)),
        ]
        .into_iter()
        .map(|(name, col)| (name.to_string(), col))
        .collect(),
        foreign_keys: vec![IntrospectedForeignKey::new("customer_id", "customers", "id")],
        indexes: vec![
            IntrospectedIndex::new("orders_pkey", ["id"]).primary(),
            IntrospectedIndex::new("orders_customer_id_created_at", ["customer_id", "created_at"]),
        ],
    };

    MemoryIntrospector::new(Dialect::Postgres)
        .table("customers", customers)
        .table("orders", orders)
}

pub fn models() -> Vec<RawModel> {
    vec![customers_model(), orders_model()]
}
