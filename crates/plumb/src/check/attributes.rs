use crate::Violation;
use crate::mapper::map_type;
use plumb_schema::{Dialect, RawModel, TableDescription};

/// Compare a table's columns with the model's attributes.
///
/// Columns are visited in the order the database reports them. A column with
/// no attribute gets a single [`Violation::UndeclaredColumn`]; everything else
/// is checked for type, field name, primary key and nullability.
pub fn check_attributes(
    dialect: Dialect,
    columns: &TableDescription,
    model: &RawModel,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (name, column) in columns {
        let Some(attr) = model.get(name) else {
            violations.push(Violation::UndeclaredColumn {
                column: name.clone(),
            });
            continue;
        };

        match map_type(dialect, attr) {
            Ok(expected) if expected == column.ty => {}
            Ok(expected) => violations.push(Violation::TypeMismatch {
                column: name.clone(),
                expected: Some(expected),
                actual: column.ty.clone(),
            }),
            Err(unsupported) => {
                violations.push(Violation::UnsupportedType {
                    column: name.clone(),
                    declared: unsupported.ty,
                    dialect,
                });
                violations.push(Violation::TypeMismatch {
                    column: name.clone(),
                    expected: None,
                    actual: column.ty.clone(),
                });
            }
        }

        if attr.field_name != *name {
            violations.push(Violation::FieldNameMismatch {
                column: name.clone(),
                field_name: attr.field_name.clone(),
            });
        }

        if attr.primary_key != column.primary_key {
            violations.push(Violation::PrimaryKeyMismatch {
                column: name.clone(),
                model: attr.primary_key,
                database: column.primary_key,
            });
        }

        if attr.allows_null() != column.allow_null {
            violations.push(Violation::NullabilityMismatch {
                column: name.clone(),
                model: attr.allows_null(),
                database: column.allow_null,
            });
        }
    }

    violations
}
