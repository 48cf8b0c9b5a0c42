//! `Entity` mappings for the records tables.

use super::{Entity, StoreError, StoreResult};
use crate::model::department::Department;
use crate::model::employee::{Employee, EmploymentStatus};
use crate::model::RecordId;
use rusqlite::types::Value;
use rusqlite::Row;

impl Entity for Department {
    const TABLE: &'static str = "departments";
    const COLUMNS: &'static [&'static str] = &["name"];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn check_insertable(&self) -> Result<(), String> {
        self.validate().map_err(|err| err.to_string())
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone())]
    }

    fn from_row(row: &Row<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Entity for Employee {
    const TABLE: &'static str = "employees";
    const COLUMNS: &'static [&'static str] = &[
        "full_name",
        "employee_number",
        "job_title",
        "employment_status",
        "address",
        "phone",
        "email",
        "department_id",
    ];

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn check_insertable(&self) -> Result<(), String> {
        self.validate().map_err(|err| err.to_string())
    }

    fn insert_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.full_name.clone()),
            Value::Integer(self.employee_number),
            Value::Text(self.job_title.clone()),
            Value::Text(self.employment_status.as_str().to_string()),
            Value::Text(self.address.clone()),
            Value::Text(self.phone.clone()),
            Value::Text(self.email.clone()),
            Value::Integer(self.department_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> StoreResult<Self> {
        let status_text: String = row.get("employment_status")?;
        let employment_status = EmploymentStatus::parse(&status_text).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "invalid employment status `{status_text}` in employees.employment_status"
            ))
        })?;

        Ok(Self {
            id: Some(row.get("id")?),
            full_name: row.get("full_name")?,
            employee_number: row.get("employee_number")?,
            job_title: row.get("job_title")?,
            employment_status,
            address: row.get("address")?,
            phone: row.get("phone")?,
            email: row.get("email")?,
            department_id: row.get("department_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
