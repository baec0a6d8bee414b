//! Field-level request validation.
//!
//! Each request DTO has an explicit `validate()` that either yields the typed
//! command the engine works with or every field error found.

use serde::Serialize;

use crate::domain::{MAX_DESCRIPTION_LEN, OwnerId};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    #[serde(rename = "error")]
    pub message: String,
}

/// All field errors of one request, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failing field.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// True if `field` has at least one error.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Required UUID field.
pub(crate) fn owner_id(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<OwnerId> {
    if raw.trim().is_empty() {
        errors.add(field, "cannot be blank");
        return None;
    }
    match raw.trim().parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "must be a valid UUID");
            None
        }
    }
}

pub(crate) fn description(errors: &mut ValidationErrors, raw: &str) {
    if raw.chars().count() > MAX_DESCRIPTION_LEN {
        errors.add(
            "description",
            format!("the length must be no more than {}", MAX_DESCRIPTION_LEN),
        );
    }
}

/// Treats `Some("")` the same as a missing field.
pub(crate) fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("owner_id", "must be a valid UUID");
        errors.add("amount", "cannot be blank");

        assert_eq!(
            errors.to_string(),
            "owner_id: must be a valid UUID; amount: cannot be blank"
        );
        assert_eq!(errors.len(), 2);
        assert!(errors.has("amount"));
    }

    #[test]
    fn test_serializes_as_field_list() {
        let errors = ValidationErrors::single("owner_id", "must be a valid UUID");
        let json = serde_json::to_value(&errors).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{ "field": "owner_id", "error": "must be a valid UUID" }])
        );
    }

    #[test]
    fn test_owner_id_rule() {
        let mut errors = ValidationErrors::new();
        assert!(owner_id(&mut errors, "owner_id", "").is_none());
        assert!(owner_id(&mut errors, "sender_id", "0123456789").is_none());
        assert!(owner_id(&mut errors, "recipient_id", "615f3e76-37d3-11ec-8d3d-0242ac130003").is_some());

        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["cannot be blank", "must be a valid UUID"]);
    }

    #[test]
    fn test_description_rule_counts_characters() {
        let mut errors = ValidationErrors::new();
        description(&mut errors, &"ж".repeat(MAX_DESCRIPTION_LEN));
        assert!(errors.is_empty());

        description(&mut errors, &"x".repeat(MAX_DESCRIPTION_LEN + 1));
        assert!(errors.has("description"));
    }
}
