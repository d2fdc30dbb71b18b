//! Schema types for plumb.
//!
//! This crate holds both sides of a verification run:
//! - what the application declares ([`RawModel`], [`ModelAttribute`], [`ModelIndex`])
//! - what the live database reports ([`IntrospectedColumn`],
//!   [`IntrospectedForeignKey`], [`IntrospectedIndex`])
//!
//! Models are plain values. They can be handed to the verifier directly, or
//! registered statically with [`ModelDef`] and gathered with [`collect_models`].
//!
//! ```ignore
//! fn user_model() -> RawModel {
//!     RawModel::new("users")
//!         .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
//!         .attribute(ModelAttribute::new("email", AttrType::VarChar(255)).not_null().unique())
//! }
//!
//! plumb_schema::inventory::submit!(ModelDef::new(user_model));
//! ```

use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;

// Re-exported so registering crates don't need their own inventory dependency.
pub use inventory;


/// SQL dialects plumb can verify against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Postgres and wire-compatible databases.
    Postgres,
    /// MySQL and MariaDB.
    MySql,
}

impl Dialect {
    /// Parse a dialect name as it appears in configuration.
    ///
    /// Accepts `postgres`, `postgresql`, `pg`, `mysql` and `mariadb`, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Some(Dialect::Postgres),
            "mysql" | "mariadb" => Some(Dialect::MySql),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract column types a model attribute can declare.
///
/// Not every type is representable in every dialect; the mapping to DDL
/// strings lives in `plumb::mapper`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// Fixed-length string
    Char(u32),
    /// Variable-length string
    VarChar(u32),
    TinyInt,
    Integer,
    BigInt,
    /// Calendar date without time
    Date,
    /// Date and time (with zone where the dialect supports it)
    DateTime,
    Text,
    Json,
    Boolean,
    /// Exact numeric with precision and scale
    Decimal { precision: u32, scale: u32 },
    Uuid,
    Float,
    Blob,
    /// Enumerated string values
    Enum(Vec<String>),
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Char(len) => write!(f, "char({})", len),
            AttrType::VarChar(len) => write!(f, "varchar({})", len),
            AttrType::TinyInt => write!(f, "tinyint"),
            AttrType::Integer => write!(f, "integer"),
            AttrType::BigInt => write!(f, "bigint"),
            AttrType::Date => write!(f, "date"),
            AttrType::DateTime => write!(f, "datetime"),
            AttrType::Text => write!(f, "text"),
            AttrType::Json => write!(f, "json"),
            AttrType::Boolean => write!(f, "boolean"),
            AttrType::Decimal { precision, scale } => {
                write!(f, "decimal({}, {})", precision, scale)
            }
            AttrType::Uuid => write!(f, "uuid"),
            AttrType::Float => write!(f, "float"),
            AttrType::Blob => write!(f, "blob"),
            AttrType::Enum(values) => write!(f, "enum({})", values.join(", ")),
        }
    }
}

/// A foreign-key reference declared on a model attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Referenced table
    pub table: String,
    /// Referenced column
    pub key: String,
}

impl Reference {
    pub fn new(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.key)
    }
}

/// A column as declared by the application's model layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAttribute {
    /// Physical column name
    pub field_name: String,
    /// Declared type
    pub ty: AttrType,
    /// Whether this attribute is (part of) the primary key
    pub primary_key: bool,
    /// Declared nullability; `None` means the model didn't say, which is nullable
    pub allow_null: Option<bool>,
    /// Whether this attribute carries a single-column unique constraint
    pub unique: bool,
    /// Foreign-key reference, if any
    pub reference: Option<Reference>,
}

impl ModelAttribute {
    pub fn new(field_name: impl Into<String>, ty: AttrType) -> Self {
        Self {
            field_name: field_name.into(),
            ty,
            primary_key: false,
            allow_null: None,
            unique: false,
            reference: None,
        }
    }

    /// Mark as primary key.
    pub fn pk(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = Some(false);
        self
    }

    pub fn nullable(mut self) -> Self {
        self.allow_null = Some(true);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declare a foreign-key reference to `table.key`.
    pub fn references(mut self, table: impl Into<String>, key: impl Into<String>) -> Self {
        self.reference = Some(Reference::new(table, key));
        self
    }

    /// Effective nullability, defaulting to nullable when undeclared.
    pub fn allows_null(&self) -> bool {
        self.allow_null.unwrap_or(true)
    }
}

/// An index declared alongside a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIndex {
    /// Field names, in declaration order
    pub fields: Vec<String>,
    /// Whether this is a unique index
    pub unique: bool,
}

impl ModelIndex {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// A unique index over `fields`.
    pub fn unique<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            unique: true,
            ..Self::new(fields)
        }
    }

    /// Field names as an order-insensitive set.
    pub fn field_set(&self) -> BTreeSet<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

/// Everything a model declares about its table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawModel {
    /// Table name
    pub table_name: String,
    /// Attributes keyed by attribute name, in declaration order
    pub attributes: IndexMap<String, ModelAttribute>,
    /// Declared indexes (composite or not)
    pub indexes: Vec<ModelIndex>,
}

impl RawModel {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute keyed by its field name.
    pub fn attribute(mut self, attr: ModelAttribute) -> Self {
        self.attributes.insert(attr.field_name.clone(), attr);
        self
    }

    /// Add an attribute under an explicit attribute name.
    ///
    /// Models whose attribute names differ from their column names use this.
    pub fn attribute_named(mut self, name: impl Into<String>, attr: ModelAttribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    pub fn index(mut self, index: ModelIndex) -> Self {
        self.indexes.push(index);
        self
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&ModelAttribute> {
        self.attributes.get(name)
    }

    /// Names of the attributes flagged as primary key.
    pub fn primary_keys(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.primary_key)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.get(name).is_some_and(|attr| attr.primary_key)
    }

    /// Find the declared index covering exactly `fields`, ignoring order.
    pub fn find_index(&self, fields: &BTreeSet<&str>) -> Option<&ModelIndex> {
        self.indexes.iter().find(|idx| &idx.field_set() == fields)
    }
}

/// A column as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectedColumn {
    /// Dialect-native type string, e.g. `CHARACTER VARYING(255)` or `TINYINT(1)`
    pub ty: String,
    pub allow_null: bool,
    pub primary_key: bool,
    /// Default value expression, if any
    pub default_value: Option<String>,
}

impl IntrospectedColumn {
    /// A nullable, non-key column of type `ty`.
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            allow_null: true,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn pk(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default_value = Some(expr.into());
        self
    }
}

/// Columns of one table keyed by column name, in ordinal order.
pub type TableDescription = IndexMap<String, IntrospectedColumn>;

/// A foreign-key constraint as reported by the live database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntrospectedForeignKey {
    /// Column in this table
    pub column: String,
    /// Referenced table
    pub references_table: String,
    /// Referenced column
    pub references_column: String,
}

impl IntrospectedForeignKey {
    pub fn new(
        column: impl Into<String>,
        references_table: impl Into<String>,
        references_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: references_table.into(),
            references_column: references_column.into(),
        }
    }
}

/// An index as reported by the live database, including auto-generated ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectedIndex {
    /// Index name
    pub name: String,
    /// Column names, unquoted, in index order
    pub columns: Vec<String>,
    pub unique: bool,
    /// Whether this index backs the primary key
    pub primary: bool,
}

impl IntrospectedIndex {
    /// A plain index. Column names are unquoted.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|c| unquote_ident(c.as_ref()))
                .collect(),
            unique: false,
            primary: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as the primary-key index (implies unique).
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    /// Column names as an order-insensitive set.
    pub fn field_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

/// Strip identifier quoting as catalogs sometimes report it.
///
/// Handles Postgres double quotes (`"col"`, with `""` escapes) and MySQL
/// backticks (`` `col` ``, with ``` `` ``` escapes). Unquoted names are trimmed
/// and returned as-is.
pub fn unquote_ident(ident: &str) -> String {
    let s = ident.trim();
    if s.len() >= 2 {
        if s.starts_with('"') && s.ends_with('"') {
            return s[1..s.len() - 1].replace("\"\"", "\"");
        }
        if s.starts_with('`') && s.ends_with('`') {
            return s[1..s.len() - 1].replace("``", "`");
        }
    }
    s.to_string()
}

/// One state of the order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    /// State name, e.g. `paid`
    pub name: String,
    /// Timestamp column recording when an order entered this state
    pub dt_column: Option<String>,
}

impl OrderState {
    /// A state without a backing timestamp column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dt_column: None,
        }
    }

    /// A state recorded in `column`.
    pub fn with_column(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dt_column: Some(column.into()),
        }
    }
}

// =============================================================================
// Model registration
// =============================================================================

/// A statically registered model.
///
/// Submit one per model with `inventory::submit!` and gather them all with
/// [`collect_models`].
pub struct ModelDef {
    build: fn() -> RawModel,
}

impl ModelDef {
    pub const fn new(build: fn() -> RawModel) -> Self {
        Self { build }
    }

    pub fn to_model(&self) -> RawModel {
        (self.build)()
    }
}

inventory::collect!(ModelDef);

/// Collect every registered model, sorted by table name.
pub fn collect_models() -> Vec<RawModel> {
    let mut models: Vec<RawModel> = inventory::iter::<ModelDef>
        .into_iter()
        .map(ModelDef::to_model)
        .collect();
    models.sort_by(|a, b| a.table_name.cmp(&b.table_name));
    models
}
