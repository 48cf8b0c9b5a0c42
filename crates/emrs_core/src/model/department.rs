//! Department record.

use super::RecordId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Organisational unit employees belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// `None` until the store assigns an identifier on flush.
    pub id: Option<RecordId>,
    /// Unique display name.
    pub name: String,
    /// Unix epoch milliseconds, set by the store on insert.
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds, set by the store on insert.
    pub updated_at: Option<i64>,
}

impl Department {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Rejects departments that cannot be persisted.
    pub fn validate(&self) -> Result<(), DepartmentValidationError> {
        if self.name.trim().is_empty() {
            return Err(DepartmentValidationError::BlankName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentValidationError {
    BlankName,
}

impl Display for DepartmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "department name must not be blank"),
        }
    }
}

impl Error for DepartmentValidationError {}
