//! Dynamic partial-update builder.
//!
//! # Responsibility
//! - Turn an `UpdateTemplate` into one `UPDATE ... SET ... WHERE id IN :ids`
//!   statement covering only the present fields.
//! - Leave the id list unbound so callers can rebind it per chunk.
//!
//! # Invariants
//! - Store-managed columns (`id`, `created_at`, `updated_at`) are never set.
//! - Only columns declared by the target `Entity` can appear in `SET`.
//! - The builder never executes anything.

use super::error::{RepoError, RepoResult};
use crate::model::patch::{FieldValue, UpdateTemplate};
use crate::model::RecordId;
use crate::store::{id_list_params, BoundStatement, Entity, MANAGED_COLUMNS};
use log::debug;
use rusqlite::types::Value;

/// Parameterized update whose `:ids` parameter is bound per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpdate {
    table: &'static str,
    assignments: Vec<(String, Value)>,
}

impl PreparedUpdate {
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Columns written by this update, in template order.
    pub fn columns(&self) -> Vec<&str> {
        self.assignments
            .iter()
            .map(|(column, _)| column.as_str())
            .collect()
    }

    /// Statement text with the id list still unbound.
    pub fn sql(&self) -> String {
        format!("{} WHERE id IN :ids", self.update_head())
    }

    /// Binds one chunk of ids, producing an executable statement.
    pub fn bind_ids(&self, ids: &[RecordId]) -> BoundStatement {
        let (placeholders, id_params) = id_list_params(ids);
        let mut params: Vec<(String, Value)> = self
            .assignments
            .iter()
            .map(|(column, value)| (format!(":{column}"), value.clone()))
            .collect();
        params.extend(id_params);

        BoundStatement {
            sql: format!("{} WHERE id IN ({placeholders})", self.update_head()),
            params,
        }
    }

    fn update_head(&self) -> String {
        let set_clause = self
            .assignments
            .iter()
            .map(|(column, _)| format!("{column} = :{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {} SET {set_clause}", self.table)
    }
}

/// Builds the partial update for entity `E` from `template`.
///
/// # Errors
/// - `Validation` when the template targets another table or names a column
///   `E` does not declare.
/// - `NoUpdatableFields` when nothing settable is present.
pub fn build_update<E: Entity>(template: &UpdateTemplate) -> RepoResult<PreparedUpdate> {
    if template.table() != E::TABLE {
        return Err(RepoError::Validation(format!(
            "update template targets `{}` but entity table is `{}`",
            template.table(),
            E::TABLE
        )));
    }

    let mut assignments = Vec::new();
    for (field, value) in template.fields() {
        if MANAGED_COLUMNS.contains(&field) {
            debug!(
                "event=update_build module=repo status=skip table={} field={field}",
                E::TABLE
            );
            continue;
        }
        if !E::COLUMNS.contains(&field) {
            return Err(RepoError::Validation(format!(
                "unknown column `{field}` for `{}`",
                E::TABLE
            )));
        }
        assignments.push((field.to_string(), to_sql_value(value)));
    }

    if assignments.is_empty() {
        return Err(RepoError::NoUpdatableFields { table: E::TABLE });
    }

    Ok(PreparedUpdate {
        table: E::TABLE,
        assignments,
    })
}

fn to_sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Integer(value) => Value::Integer(*value),
        FieldValue::Text(value) => Value::Text(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::build_update;
    use crate::model::department::Department;
    use crate::model::employee::Employee;
    use crate::model::patch::UpdateTemplate;
    use crate::repo::RepoError;
    use rusqlite::types::Value;

    #[test]
    fn empty_template_is_rejected() {
        let template = UpdateTemplate::new("employees");
        let err = build_update::<Employee>(&template).unwrap_err();
        assert!(matches!(
            err,
            RepoError::NoUpdatableFields { table: "employees" }
        ));
    }

    #[test]
    fn managed_columns_alone_count_as_nothing_to_set() {
        let mut template = UpdateTemplate::new("employees");
        template
            .set("id", 5_i64)
            .set("created_at", 1_i64)
            .set("updated_at", 2_i64);

        let err = build_update::<Employee>(&template).unwrap_err();
        assert!(matches!(err, RepoError::NoUpdatableFields { .. }));
    }

    #[test]
    fn single_field_sets_only_that_column() {
        let mut template = UpdateTemplate::new("employees");
        template.set("job_title", "Staff Engineer");

        let update = build_update::<Employee>(&template).unwrap();
        assert_eq!(update.columns(), vec!["job_title"]);
        assert_eq!(
            update.sql(),
            "UPDATE employees SET job_title = :job_title WHERE id IN :ids"
        );
    }

    #[test]
    fn bind_ids_expands_the_id_list() {
        let mut template = UpdateTemplate::new("employees");
        template.set("phone", "555-0100").set_null("address");

        let update = build_update::<Employee>(&template).unwrap();
        let bound = update.bind_ids(&[3, 4]);

        assert_eq!(
            bound.sql,
            "UPDATE employees SET phone = :phone, address = :address WHERE id IN (:ids_0, :ids_1)"
        );
        assert_eq!(bound.params[1], (":address".to_string(), Value::Null));
        assert_eq!(bound.params.len(), 4);
    }

    #[test]
    fn unknown_columns_and_foreign_tables_are_rejected() {
        let mut unknown = UpdateTemplate::new("employees");
        unknown.set("salary; DROP TABLE employees", 1_i64);
        assert!(matches!(
            build_update::<Employee>(&unknown),
            Err(RepoError::Validation(_))
        ));

        let mut other_table = UpdateTemplate::new("employees");
        other_table.set("name", "Finance");
        assert!(matches!(
            build_update::<Department>(&other_table),
            Err(RepoError::Validation(_))
        ));
    }
}
