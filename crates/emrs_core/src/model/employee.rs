//! Employee record.
//!
//! # Invariants
//! - Every business field is required; blank text is rejected by `validate()`.
//! - `employee_number` is unique across all employees.
//! - `department_id` references an existing department.

use super::patch::{Patch, UpdateTemplate};
use super::RecordId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Contract type of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentStatus {
    PartTime,
    FullTime,
    FixedTerm,
    Internship,
    Temporary,
}

impl EmploymentStatus {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartTime => "PART_TIME",
            Self::FullTime => "FULL_TIME",
            Self::FixedTerm => "FIXED_TERM",
            Self::Internship => "INTERNSHIP",
            Self::Temporary => "TEMPORARY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PART_TIME" => Some(Self::PartTime),
            "FULL_TIME" => Some(Self::FullTime),
            "FIXED_TERM" => Some(Self::FixedTerm),
            "INTERNSHIP" => Some(Self::Internship),
            "TEMPORARY" => Some(Self::Temporary),
            _ => None,
        }
    }
}

/// Canonical employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// `None` until the store assigns an identifier on flush.
    pub id: Option<RecordId>,
    pub full_name: String,
    /// Business-facing employee number (distinct from the row id).
    pub employee_number: i64,
    pub job_title: String,
    pub employment_status: EmploymentStatus,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub department_id: RecordId,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds, set by the store on insert.
    pub updated_at: Option<i64>,
}

impl Employee {
    /// Validates the record before it is queued for persistence.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        let required = [
            ("full_name", self.full_name.as_str()),
            ("job_title", self.job_title.as_str()),
            ("address", self.address.as_str()),
            ("phone", self.phone.as_str()),
            ("email", self.email.as_str()),
        ];
        check_text_fields(required)?;
        check_email(&self.email)
    }
}

fn check_text_fields<'a>(
    fields: impl IntoIterator<Item = (&'static str, &'a str)>,
) -> Result<(), EmployeeValidationError> {
    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(EmployeeValidationError::BlankField(field));
        }
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), EmployeeValidationError> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(EmployeeValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    BlankField(&'static str),
    InvalidEmail(String),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "employee field `{field}` must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid employee email: `{value}`"),
        }
    }
}

impl Error for EmployeeValidationError {}

/// Typed sparse update for employees.
///
/// Fields left as `Patch::Unset` are never written. All employee columns are
/// `NOT NULL`, so `Patch::Null` is passed through and surfaces as a store
/// constraint error rather than being silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeePatch {
    pub full_name: Patch<String>,
    pub employee_number: Patch<i64>,
    pub job_title: Patch<String>,
    pub employment_status: Patch<EmploymentStatus>,
    pub address: Patch<String>,
    pub phone: Patch<String>,
    pub email: Patch<String>,
    pub department_id: Patch<RecordId>,
}

impl EmployeePatch {
    /// Applies the insert-time field rules to every `Patch::Set` value.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        let set_text = [
            ("full_name", &self.full_name),
            ("job_title", &self.job_title),
            ("address", &self.address),
            ("phone", &self.phone),
            ("email", &self.email),
        ]
        .into_iter()
        .filter_map(|(field, patch)| match patch {
            Patch::Set(value) => Some((field, value.as_str())),
            _ => None,
        });
        check_text_fields(set_text)?;

        if let Patch::Set(email) = &self.email {
            check_email(email)?;
        }
        Ok(())
    }

    /// Converts this patch into the column-keyed template consumed by the
    /// update builder.
    pub fn into_template(self) -> UpdateTemplate {
        let mut template = UpdateTemplate::new("employees");
        template.apply("full_name", self.full_name);
        template.apply("employee_number", self.employee_number);
        template.apply("job_title", self.job_title);
        template.apply(
            "employment_status",
            self.employment_status.map(|status| status.as_str().to_string()),
        );
        template.apply("address", self.address);
        template.apply("phone", self.phone);
        template.apply("email", self.email);
        template.apply("department_id", self.department_id);
        template
    }
}
