//! Field-keyed validation errors for forms.
//!
//! Forms render each message next to the input it belongs to, so errors are
//! collected per field rather than failing on the first problem.

use std::collections::BTreeMap;
use std::fmt;

/// Validation failures keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Check a required, length-limited text field.
    pub fn require_text(&mut self, field: &'static str, label: &str, value: &str, max: usize) {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, format!("{label} is required"));
        } else if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }

    /// Check an optional, length-limited text field.
    pub fn limit_text(&mut self, field: &'static str, label: &str, value: Option<&str>, max: usize) {
        if value.is_some_and(|v| v.trim().chars().count() > max) {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Trim `value` and map an empty result to `None`.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
