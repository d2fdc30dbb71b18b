//! Model attribute types to dialect DDL strings.
//!
//! The strings produced here must be exactly what each database reports when
//! a table is described, parameters included: Postgres reports
//! `CHARACTER VARYING(255)` where MySQL reports `VARCHAR(255)`. There is no
//! fallback between dialects.

use plumb_schema::{AttrType, Dialect, ModelAttribute};

/// UUIDs are stored as strings in MySQL: 36 canonical characters plus margin.
const MYSQL_UUID_LEN: u32 = 40;

/// The declared type has no representation in the dialect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{dialect} has no mapping for {ty}")]
pub struct UnsupportedType {
    pub dialect: Dialect,
    pub ty: AttrType,
}

/// Map an attribute to the DDL type string `dialect` reports for it.
pub fn map_type(dialect: Dialect, attr: &ModelAttribute) -> Result<String, UnsupportedType> {
    let mapped = match dialect {
        Dialect::Postgres => postgres_type(&attr.ty),
        Dialect::MySql => mysql_type(&attr.ty),
    };

    mapped.ok_or_else(|| {
        tracing::warn!(
            field = %attr.field_name,
            declaration = ?attr,
            %dialect,
            "unsupported attribute type"
        );
        UnsupportedType {
            dialect,
            ty: attr.ty.clone(),
        }
    })
}

fn postgres_type(ty: &AttrType) -> Option<String> {
    let ddl = match ty {
        AttrType::VarChar(len) => format!("CHARACTER VARYING({})", len),
        AttrType::BigInt => "BIGINT".to_string(),
        AttrType::Integer => "INTEGER".to_string(),
        AttrType::DateTime => "TIMESTAMP WITH TIME ZONE".to_string(),
        AttrType::Date => "DATE".to_string(),
        AttrType::Char(_)
        | AttrType::TinyInt
        | AttrType::Text
        | AttrType::Json
        | AttrType::Boolean
        | AttrType::Decimal { .. }
        | AttrType::Uuid
        | AttrType::Float
        | AttrType::Blob
        | AttrType::Enum(_) => return None,
    };
    Some(ddl)
}

fn mysql_type(ty: &AttrType) -> Option<String> {
    let ddl = match ty {
        AttrType::Char(len) => format!("CHAR({})", len),
        AttrType::VarChar(len) => format!("VARCHAR({})", len),
        AttrType::BigInt => "BIGINT".to_string(),
        AttrType::TinyInt => "TINYINT".to_string(),
        AttrType::Integer => "INT".to_string(),
        AttrType::Date => "DATE".to_string(),
        AttrType::DateTime => "DATETIME".to_string(),
        AttrType::Text => "TEXT".to_string(),
        AttrType::Json => "JSON".to_string(),
        AttrType::Boolean => "TINYINT(1)".to_string(),
        AttrType::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
        AttrType::Uuid => format!("VARCHAR({})", MYSQL_UUID_LEN),
        AttrType::Float | AttrType::Blob | AttrType::Enum(_) => return None,
    };
    Some(ddl)
}
