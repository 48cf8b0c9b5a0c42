//! Error taxonomy for the batch persistence core.

use crate::db::DbError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Caller input rejected before reaching the store.
    Validation(String),
    /// Partial-update template carries nothing to set.
    NoUpdatableFields { table: &'static str },
    /// Page index negative or page size not positive.
    InvalidPageRequest { page: i64, size: i64 },
    /// Any failure from the underlying relational store.
    Store(StoreError),
}

impl RepoError {
    /// True when the store rejected the write on a schema constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(StoreError::Db(err)) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "validation failed: {message}"),
            Self::NoUpdatableFields { table } => {
                write!(f, "update template for `{table}` has no fields to set")
            }
            Self::InvalidPageRequest { page, size } => write!(
                f,
                "invalid page request page={page} size={size}; page must be >= 0 and size > 0"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Store(StoreError::Db(value))
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(StoreError::from(value))
    }
}
