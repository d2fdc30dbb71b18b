use crate::Violation;
use plumb_schema::{Dialect, IntrospectedIndex, RawModel};

/// Compare a table's indexes with what its model explains.
///
/// Primary-key indexes must only cover primary-key attributes. Every other
/// index must be accounted for, tried in this order:
///
/// 1. a declared index over the same columns (in any order), whose unique
///    flag must match;
/// 2. a single column declared `unique`, whose index must be unique;
/// 3. a single foreign-key column, which only MySQL indexes implicitly.
///
/// Declared indexes win over the inferred explanations, so a declared
/// non-unique index on a `unique` column is judged by the declaration.
pub fn check_indexes(
    dialect: Dialect,
    indexes: &[IntrospectedIndex],
    model: &RawModel,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for index in indexes {
        if index.primary {
            for column in &index.columns {
                if !model.is_primary_key(column) {
                    violations.push(Violation::PrimaryKeyIndexMismatch {
                        index: index.name.clone(),
                        column: column.clone(),
                    });
                }
            }
            continue;
        }

        let fields = index.field_set();

        if let Some(declared) = model.find_index(&fields) {
            if declared.unique != index.unique {
                violations.push(Violation::UniqueFlagMismatch {
                    index: index.name.clone(),
                    declared: declared.unique,
                    actual: index.unique,
                });
            }
            continue;
        }

        if fields.len() > 1 {
            violations.push(Violation::CompositeIndexUndeclared {
                index: index.name.clone(),
                columns: index.columns.clone(),
            });
            continue;
        }

        let attr = fields.first().and_then(|column| model.get(column));
        match attr {
            Some(attr) if attr.unique => {
                if !index.unique {
                    violations.push(Violation::ExpectedUniqueIndex {
                        index: index.name.clone(),
                        column: attr.field_name.clone(),
                    });
                }
            }
            Some(attr) if attr.reference.is_some() => {
                // MySQL creates an index for every foreign key.
                if dialect != Dialect::MySql {
                    violations.push(Violation::UnexplainedForeignKeyIndex {
                        index: index.name.clone(),
                        column: attr.field_name.clone(),
                        dialect,
                    });
                }
            }
            _ => violations.push(Violation::UnexplainedIndex {
                index: index.name.clone(),
                columns: index.columns.clone(),
            }),
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViolationKind;
    use plumb_schema::{AttrType, ModelAttribute, ModelIndex};

    fn orders_model() -> RawModel {
        RawModel::new("orders")
            .attribute(ModelAttribute::new("id", AttrType::BigInt).pk().not_null())
            .attribute(ModelAttribute::new("number", AttrType::VarChar(32)).not_null().unique())
            .attribute(
                ModelAttribute::new("customer_id", AttrType::BigInt)
                    .not_null()
                    .references("customers", "id"),
            )
            .attribute(ModelAttribute::new("shop_id", AttrType::BigInt).not_null())
            .attribute(ModelAttribute::new("created_at", AttrType::DateTime).not_null())
            .index(ModelIndex::new(["shop_id", "created_at"]))
    }

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(Violation::kind).collect()
    }

    #[test]
    fn test_primary_index_on_primary_key_passes() {
        let indexes = vec![IntrospectedIndex::new("orders_pkey", ["id"]).primary()];
        assert!(check_indexes(Dialect::Postgres, &indexes, &orders_model()).is_empty());
    }

    #[test]
    fn test_primary_index_on_other_column() {
        let indexes = vec![IntrospectedIndex::new("orders_pkey", ["id", "shop_id"]).primary()];
        let violations = check_indexes(Dialect::Postgres, &indexes, &orders_model());
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::PrimaryKeyIndexMismatch { column, .. } if column == "shop_id"
        ));
    }

    #[test]
    fn test_declared_composite_index_in_any_order() {
        let indexes = vec![IntrospectedIndex::new(
            "orders_created_at_shop_id",
            ["created_at", "shop_id"],
        )];
        assert!(check_indexes(Dialect::Postgres, &indexes, &orders_model()).is_empty());
    }

    #[test]
    fn test_undeclared_composite_index() {
        let indexes = vec![IntrospectedIndex::new(
            "orders_customer_id_created_at",
            ["customer_id", "created_at"],
        )];
        let violations = check_indexes(Dialect::Postgres, &indexes, &orders_model());
        assert_eq!(kinds(&violations), vec![ViolationKind::CompositeIndexUndeclared]);
    }

    #[test]
    fn test_undeclared_composite_index_on_unique_columns() {
        let model = orders_model().attribute(
            ModelAttribute::new("external_ref", AttrType::VarChar(64)).unique(),
        );
        let indexes =
            vec![IntrospectedIndex::new("orders_number_external_ref", ["number", "external_ref"]).unique()];
        let violations = check_indexes(Dialect::MySql, &indexes, &model);
        assert_eq!(kinds(&violations), vec![ViolationKind::CompositeIndexUndeclared]);
    }

    #[test]
    fn test_declared_index_unique_flag_mismatch() {
        let indexes = vec![
            IntrospectedIndex::new("orders_shop_id_created_at", ["shop_id", "created_at"]).unique(),
        ];
        let violations = check_indexes(Dialect::Postgres, &indexes, &orders_model());
        assert!(matches!(
            &violations[..],
            [Violation::UniqueFlagMismatch { declared: false, actual: true, .. }]
        ));
    }

    #[test]
    fn test_declared_index_takes_precedence_over_unique_attribute() {
        // `number` is declared unique, but an explicit non-unique index on it
        // is judged by the declaration alone.
        let model = orders_model().index(ModelIndex::new(["number"]));
        let indexes = vec![IntrospectedIndex::new("orders_number", ["number"])];
        assert!(check_indexes(Dialect::Postgres, &indexes, &model).is_empty());
    }

    #[test]
    fn test_unique_attribute_index() {
        let unique = vec![IntrospectedIndex::new("orders_number_key", ["number"]).unique()];
        assert!(check_indexes(Dialect::Postgres, &unique, &orders_model()).is_empty());

        let plain = vec![IntrospectedIndex::new("orders_number", ["number"])];
        let violations = check_indexes(Dialect::Postgres, &plain, &orders_model());
        assert!(matches!(
            &violations[..],
            [Violation::ExpectedUniqueIndex { column, .. }] if column == "number"
        ));
    }

    #[test]
    fn test_foreign_key_index_only_implied_by_mysql() {
        let indexes = vec![IntrospectedIndex::new("customer_id", ["customer_id"])];

        assert!(check_indexes(Dialect::MySql, &indexes, &orders_model()).is_empty());

        let violations = check_indexes(Dialect::Postgres, &indexes, &orders_model());
        assert!(matches!(
            &violations[..],
            [Violation::UnexplainedForeignKeyIndex { column, dialect: Dialect::Postgres, .. }]
                if column == "customer_id"
        ));
    }

    #[test]
    fn test_unexplained_index() {
        let indexes = vec![IntrospectedIndex::new("orders_shop_id", ["shop_id"])];
        let violations = check_indexes(Dialect::MySql, &indexes, &orders_model());
        assert_eq!(kinds(&violations), vec![ViolationKind::UnexplainedIndex]);
    }

    #[test]
    fn test_index_on_unknown_column() {
        let indexes = vec![IntrospectedIndex::new("orders_ghost", ["\"ghost\""])];
        let violations = check_indexes(Dialect::Postgres, &indexes, &orders_model());
        assert!(matches!(
            &violations[..],
            [Violation::UnexplainedIndex { columns, .. }] if columns == &["ghost".to_string()]
        ));
    }

    #[test]
    fn test_quoted_columns_match_declarations() {
        let indexes = vec![IntrospectedIndex::new(
            "orders_shop_created",
            ["`created_at`", "`shop_id`"],
        )];
        assert!(check_indexes(Dialect::MySql, &indexes, &orders_model()).is_empty());
    }
}
