//! Schema violations.
//!
//! Every check returns a list of [`Violation`]s for one table. The table name
//! itself lives on the [`Diagnostic`](crate::Diagnostic) that wraps a violation.

use plumb_schema::{AttrType, Dialect, Reference};
use std::fmt;

/// A single way a table diverges from its model.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// The declared type has no DDL mapping in this dialect.
    UnsupportedType {
        column: String,
        declared: AttrType,
        dialect: Dialect,
    },
    /// The database has a column the model doesn't declare.
    UndeclaredColumn { column: String },
    /// The mapped DDL type differs from the database type.
    ///
    /// `expected` is `None` when the declared type couldn't be mapped.
    TypeMismatch {
        column: String,
        expected: Option<String>,
        actual: String,
    },
    /// The attribute found for a column names a different field.
    FieldNameMismatch { column: String, field_name: String },
    PrimaryKeyMismatch {
        column: String,
        model: bool,
        database: bool,
    },
    NullabilityMismatch {
        column: String,
        model: bool,
        database: bool,
    },
    /// The database has a foreign key the model doesn't declare.
    UndeclaredForeignKey {
        column: String,
        references_table: String,
        references_column: String,
    },
    /// The declared reference points at a different key.
    ForeignKeyTargetMismatch {
        column: String,
        declared: Reference,
        actual_table: String,
        actual_column: String,
    },
    /// A primary-key index covers a column the model doesn't mark as primary key.
    PrimaryKeyIndexMismatch { index: String, column: String },
    /// A multi-column index with no matching declared index.
    CompositeIndexUndeclared { index: String, columns: Vec<String> },
    /// The declared index and the database disagree on uniqueness.
    UniqueFlagMismatch {
        index: String,
        declared: bool,
        actual: bool,
    },
    /// The column is declared unique but its index isn't.
    ExpectedUniqueIndex { index: String, column: String },
    /// An index on a foreign-key column in a dialect that doesn't create one implicitly.
    UnexplainedForeignKeyIndex {
        index: String,
        column: String,
        dialect: Dialect,
    },
    /// Nothing in the model accounts for this index.
    UnexplainedIndex { index: String, columns: Vec<String> },
    /// Timestamp columns on the orders table don't match the lifecycle states.
    StateColumnMismatch {
        columns: Vec<String>,
        states: Vec<String>,
    },
}

/// The kind of a [`Violation`], without its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationKind {
    UnsupportedType,
    UndeclaredColumn,
    TypeMismatch,
    FieldNameMismatch,
    PrimaryKeyMismatch,
    NullabilityMismatch,
    UndeclaredForeignKey,
    ForeignKeyTargetMismatch,
    PrimaryKeyIndexMismatch,
    CompositeIndexUndeclared,
    UniqueFlagMismatch,
    ExpectedUniqueIndex,
    UnexplainedForeignKeyIndex,
    UnexplainedIndex,
    StateColumnMismatch,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::UnsupportedType => "UnsupportedType",
            ViolationKind::UndeclaredColumn => "UndeclaredColumn",
            ViolationKind::TypeMismatch => "TypeMismatch",
            ViolationKind::FieldNameMismatch => "FieldNameMismatch",
            ViolationKind::PrimaryKeyMismatch => "PrimaryKeyMismatch",
            ViolationKind::NullabilityMismatch => "NullabilityMismatch",
            ViolationKind::UndeclaredForeignKey => "UndeclaredForeignKey",
            ViolationKind::ForeignKeyTargetMismatch => "ForeignKeyTargetMismatch",
            ViolationKind::PrimaryKeyIndexMismatch => "PrimaryKeyIndexMismatch",
            ViolationKind::CompositeIndexUndeclared => "CompositeIndexUndeclared",
            ViolationKind::UniqueFlagMismatch => "UniqueFlagMismatch",
            ViolationKind::ExpectedUniqueIndex => "ExpectedUniqueIndex",
            ViolationKind::UnexplainedForeignKeyIndex => "UnexplainedForeignKeyIndex",
            ViolationKind::UnexplainedIndex => "UnexplainedIndex",
            ViolationKind::StateColumnMismatch => "StateColumnMismatch",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Violation::UnsupportedType { .. } => ViolationKind::UnsupportedType,
            Violation::UndeclaredColumn { .. } => ViolationKind::UndeclaredColumn,
            Violation::TypeMismatch { .. } => ViolationKind::TypeMismatch,
            Violation::FieldNameMismatch { .. } => ViolationKind::FieldNameMismatch,
            Violation::PrimaryKeyMismatch { .. } => ViolationKind::PrimaryKeyMismatch,
            Violation::NullabilityMismatch { .. } => ViolationKind::NullabilityMismatch,
            Violation::UndeclaredForeignKey { .. } => ViolationKind::UndeclaredForeignKey,
            Violation::ForeignKeyTargetMismatch { .. } => ViolationKind::ForeignKeyTargetMismatch,
            Violation::PrimaryKeyIndexMismatch { .. } => ViolationKind::PrimaryKeyIndexMismatch,
            Violation::CompositeIndexUndeclared { .. } => ViolationKind::CompositeIndexUndeclared,
            Violation::UniqueFlagMismatch { .. } => ViolationKind::UniqueFlagMismatch,
            Violation::ExpectedUniqueIndex { .. } => ViolationKind::ExpectedUniqueIndex,
            Violation::UnexplainedForeignKeyIndex { .. } => {
                ViolationKind::UnexplainedForeignKeyIndex
            }
            Violation::UnexplainedIndex { .. } => ViolationKind::UnexplainedIndex,
            Violation::StateColumnMismatch { .. } => ViolationKind::StateColumnMismatch,
        }
    }
}

fn nullability(allow_null: bool) -> &'static str {
    if allow_null { "nullable" } else { "not null" }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnsupportedType {
                column,
                declared,
                dialect,
            } => write!(f, "{}: {} has no {} mapping", column, declared, dialect),
            Violation::UndeclaredColumn { column } => {
                write!(f, "{}: column is not declared by the model", column)
            }
            Violation::TypeMismatch {
                column,
                expected: Some(expected),
                actual,
            } => write!(f, "{}: model maps to {}, database has {}", column, expected, actual),
            Violation::TypeMismatch {
                column,
                expected: None,
                actual,
            } => write!(f, "{}: model type is unmappable, database has {}", column, actual),
            Violation::FieldNameMismatch { column, field_name } => {
                write!(f, "{}: attribute declares field `{}`", column, field_name)
            }
            Violation::PrimaryKeyMismatch {
                column,
                model,
                database,
            } => write!(
                f,
                "{}: primary key is {} in the model, {} in the database",
                column, model, database
            ),
            Violation::NullabilityMismatch {
                column,
                model,
                database,
            } => write!(
                f,
                "{}: {} in the model, {} in the database",
                column,
                nullability(*model),
                nullability(*database)
            ),
            Violation::UndeclaredForeignKey {
                column,
                references_table,
                references_column,
            } => write!(
                f,
                "{} -> {}.{}: foreign key is not declared by the model",
                column, references_table, references_column
            ),
            Violation::ForeignKeyTargetMismatch {
                column,
                declared,
                actual_table,
                actual_column,
            } => write!(
                f,
                "{}: model references {}, database references {}.{}",
                column, declared, actual_table, actual_column
            ),
            Violation::PrimaryKeyIndexMismatch { index, column } => write!(
                f,
                "{}: primary key index covers {}, which the model doesn't mark as primary key",
                index, column
            ),
            Violation::CompositeIndexUndeclared { index, columns } => write!(
                f,
                "{} ({}): composite index is not declared by the model",
                index,
                columns.join(", ")
            ),
            Violation::UniqueFlagMismatch {
                index,
                declared,
                actual,
            } => write!(
                f,
                "{}: unique is {} in the model, {} in the database",
                index, declared, actual
            ),
            Violation::ExpectedUniqueIndex { index, column } => write!(
                f,
                "{}: {} is declared unique but the index is not",
                index, column
            ),
            Violation::UnexplainedForeignKeyIndex {
                index,
                column,
                dialect,
            } => write!(
                f,
                "{}: index on foreign key {} is not implied by {}",
                index, column, dialect
            ),
            Violation::UnexplainedIndex { index, columns } => write!(
                f,
                "{} ({}): no declared index or unique attribute explains it",
                index,
                columns.join(", ")
            ),
            Violation::StateColumnMismatch { columns, states } => write!(
                f,
                "timestamp columns [{}] don't match state columns [{}]",
                columns.join(", "),
                states.join(", ")
            ),
        }
    }
}
