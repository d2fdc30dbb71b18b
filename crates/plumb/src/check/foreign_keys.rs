use crate::Violation;
use plumb_schema::{Dialect, IntrospectedForeignKey, RawModel};

/// Compare a table's foreign keys with the references its model declares.
///
/// A declared reference matches only when both the target table and the
/// target column agree.
///
/// MySQL foreign keys are not validated: the catalog we read there doesn't
/// reliably enumerate them, so this returns no violations for that dialect.
pub fn check_foreign_keys(
    dialect: Dialect,
    foreign_keys: &[IntrospectedForeignKey],
    model: &RawModel,
) -> Vec<Violation> {
    if dialect == Dialect::MySql {
        return Vec::new();
    }

    let mut violations = Vec::new();

    for fk in foreign_keys {
        match model.get(&fk.column).and_then(|attr| attr.reference.as_ref()) {
            None => violations.push(Violation::UndeclaredForeignKey {
                column: fk.column.clone(),
                references_table: fk.references_table.clone(),
                references_column: fk.references_column.clone(),
            }),
            Some(reference)
                if reference.table != fk.references_table
                    || reference.key != fk.references_column =>
            {
                violations.push(Violation::ForeignKeyTargetMismatch {
                    column: fk.column.clone(),
                    declared: reference.clone(),
                    actual_table: fk.references_table.clone(),
                    actual_column: fk.references_column.clone(),
                })
            }
            Some(_) => {}
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use plumb_schema::{AttrType, ModelAttribute};

    fn posts_model() -> RawModel {
        RawModel::new("posts")
            .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
            .attribute(
                ModelAttribute::new("author_id", AttrType::BigInt)
                    .not_null()
                    .references("users", "id"),
            )
            .attribute(ModelAttribute::new("category_id", AttrType::BigInt))
    }

    #[test]
    fn test_declared_foreign_key_passes() {
        let fks = vec![IntrospectedForeignKey::new("author_id", "users", "id")];
        assert!(check_foreign_keys(Dialect::Postgres, &fks, &posts_model()).is_empty());
    }

    #[test]
    fn test_missing_reference_is_flagged() {
        let fks = vec![IntrospectedForeignKey::new("category_id", "categories", "id")];
        let violations = check_foreign_keys(Dialect::Postgres, &fks, &posts_model());
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndeclaredForeignKey { column, references_table, .. }
                if column == "category_id" && references_table == "categories"
        ));
    }

    #[test]
    fn test_foreign_key_on_unknown_column_is_flagged() {
        let fks = vec![IntrospectedForeignKey::new("ghost_id", "ghosts", "id")];
        let violations = check_foreign_keys(Dialect::Postgres, &fks, &posts_model());
        assert!(matches!(
            &violations[..],
            [Violation::UndeclaredForeignKey { column, .. }] if column == "ghost_id"
        ));
    }

    #[test]
    fn test_target_key_mismatch() {
        let fks = vec![IntrospectedForeignKey::new("author_id", "users", "uuid")];
        let violations = check_foreign_keys(Dialect::Postgres, &fks, &posts_model());
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::ForeignKeyTargetMismatch { column, declared, actual_column, .. }
                if column == "author_id" && declared.key == "id" && actual_column == "uuid"
        ));
    }

    #[test]
    fn test_target_table_mismatch() {
        let fks = vec![IntrospectedForeignKey::new("author_id", "admins", "id")];
        let violations = check_foreign_keys(Dialect::Postgres, &fks, &posts_model());
        assert!(matches!(
            &violations[..],
            [Violation::ForeignKeyTargetMismatch { declared, actual_table, actual_column, .. }]
                if declared.table == "users" && actual_table == "admins" && actual_column == "id"
        ));
    }

    #[test]
    fn test_mysql_is_never_flagged() {
        let fks = vec![
            IntrospectedForeignKey::new("category_id", "categories", "id"),
            IntrospectedForeignKey::new("author_id", "users", "uuid"),
        ];
        assert!(check_foreign_keys(Dialect::MySql, &fks, &posts_model()).is_empty());
    }
}
