//! Introspection of a live Postgres schema through `pg_catalog`.

use crate::introspect::Introspector;
use crate::{Error, Result};
use plumb_config::Config;
use plumb_schema::{
    Dialect, IntrospectedColumn, IntrospectedForeignKey, IntrospectedIndex, TableDescription,
};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Row};
use tracing::Instrument;

const LIST_TABLES: &str = r#"
SELECT c.relname::text
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
ORDER BY c.relname
"#;

const DESCRIBE_TABLE: &str = r#"
SELECT
    a.attname::text,
    upper(format_type(a.atttypid, a.atttypmod)),
    NOT a.attnotnull,
    EXISTS (
        SELECT 1 FROM pg_index i
        WHERE i.indrelid = c.oid AND i.indisprimary AND a.attnum = ANY(i.indkey)
    ),
    pg_get_expr(d.adbin, d.adrelid)
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum
"#;

const LIST_FOREIGN_KEYS: &str = r#"
SELECT a.attname::text, rc.relname::text, ra.attname::text
FROM pg_constraint con
JOIN pg_class c ON c.oid = con.conrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_class rc ON rc.oid = con.confrelid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(col, ref)
JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.col
JOIN pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.ref
WHERE con.contype = 'f' AND n.nspname = $1 AND c.relname = $2
ORDER BY con.conname, a.attnum
"#;

const LIST_INDEXES: &str = r#"
SELECT
    ic.relname::text,
    ARRAY(
        SELECT pg_get_indexdef(i.indexrelid, k, true)
        FROM generate_series(1, i.indnkeyatts::int) AS k
        ORDER BY k
    ),
    i.indisunique,
    i.indisprimary
FROM pg_index i
JOIN pg_class ic ON ic.oid = i.indexrelid
JOIN pg_class c ON c.oid = i.indrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relname = $2
ORDER BY ic.relname
"#;

/// Reads table metadata from a Postgres schema.
///
/// Borrows the client; the caller owns the connection and its lifetime.
pub struct PgIntrospector<'a> {
    client: &'a Client,
    schema: String,
}

impl<'a> PgIntrospector<'a> {
    /// Introspect the `public` schema.
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            schema: "public".to_string(),
        }
    }

    /// Introspect the schema named in the configuration, if any.
    pub fn from_config(client: &'a Client, config: &Config) -> Self {
        match &config.schema {
            Some(schema) => Self::new(client).with_schema(schema.clone()),
            None => Self::new(client),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<Row>> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql.trim(),
            params = params.len(),
            rows = tracing::field::Empty,
        );
        let rows = self
            .client
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }
}

impl Introspector for PgIntrospector<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self.query(LIST_TABLES, &[&self.schema]).await?;
        rows.iter()
            .map(|row| row.try_get::<_, String>(0).map_err(Error::from))
            .collect()
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescription> {
        let rows = self.query(DESCRIBE_TABLE, &[&self.schema, &table]).await?;
        if rows.is_empty() {
            return Err(Error::Introspection(format!(
                "table {}.{} not found",
                self.schema, table
            )));
        }

        let mut columns = TableDescription::new();
        for row in &rows {
            let name: String = row.try_get(0)?;
            let ty: String = row.try_get(1)?;
            let allow_null: bool = row.try_get(2)?;
            let primary_key: bool = row.try_get(3)?;
            let default_value: Option<String> = row.try_get(4)?;

            columns.insert(
                name,
                IntrospectedColumn {
                    ty,
                    allow_null,
                    primary_key,
                    default_value,
                },
            );
        }
        Ok(columns)
    }

    async fn list_foreign_keys(&self, table: &str) -> Result<Vec<IntrospectedForeignKey>> {
        let rows = self
            .query(LIST_FOREIGN_KEYS, &[&self.schema, &table])
            .await?;
        let mut fks = Vec::with_capacity(rows.len());
        for row in &rows {
            let column: String = row.try_get(0)?;
            let references_table: String = row.try_get(1)?;
            let references_column: String = row.try_get(2)?;
            fks.push(IntrospectedForeignKey::new(
                column,
                references_table,
                references_column,
            ));
        }
        Ok(fks)
    }

    async fn list_indexes(&self, table: &str) -> Result<Vec<IntrospectedIndex>> {
        let rows = self.query(LIST_INDEXES, &[&self.schema, &table]).await?;
        let mut indexes = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            let columns: Vec<String> = row.try_get(1)?;
            let unique: bool = row.try_get(2)?;
            let primary: bool = row.try_get(3)?;

            let mut index = IntrospectedIndex::new(name, columns);
            if primary {
                index = index.primary();
            } else if unique {
                index = index.unique();
            }
            indexes.push(index);
        }
        Ok(indexes)
    }
}
