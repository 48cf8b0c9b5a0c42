//! Sparse partial-update representation.
//!
//! # Responsibility
//! - Distinguish "not mentioned" from "explicitly null" for every field.
//! - Carry the touched columns of one table as an explicit, ordered mapping.
//!
//! # Invariants
//! - A field absent from `UpdateTemplate` is never written by an update.
//! - `FieldValue::Null` in a template is an intentional null, not an absence.

/// Tri-state field used by typed patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Caller did not mention the field.
    #[default]
    Unset,
    /// Caller explicitly cleared the field.
    Null,
    /// Caller supplied a new value.
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Unset => Patch::Unset,
            Self::Null => Patch::Null,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `None` maps to `Unset`; use `Patch::Null` for an explicit null.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

/// Column value carried by an update template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Column-keyed sparse update for one table.
///
/// Constructed by the caller and consumed read-only by the update builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTemplate {
    table: &'static str,
    fields: Vec<(String, FieldValue)>,
}

impl UpdateTemplate {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            fields: Vec::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Marks `field` present with `value`, replacing any earlier value.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field.to_string(), value)),
        }
        self
    }

    /// Marks `field` present with an explicit null.
    pub fn set_null(&mut self, field: &str) -> &mut Self {
        self.set(field, FieldValue::Null)
    }

    /// Removes `field` so the update leaves its column untouched.
    pub fn unset(&mut self, field: &str) -> &mut Self {
        self.fields.retain(|(name, _)| name != field);
        self
    }

    /// Applies one tri-state patch field.
    pub fn apply<T: Into<FieldValue>>(&mut self, field: &str, patch: Patch<T>) -> &mut Self {
        match patch {
            Patch::Unset => self.unset(field),
            Patch::Null => self.set_null(field),
            Patch::Set(value) => self.set(field, value),
        }
    }

    pub fn is_present(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Present field names in the order they were first set.
    pub fn present_fields(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
