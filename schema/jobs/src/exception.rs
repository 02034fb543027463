use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub type SchemaResult<T> = Result<T, SchemaValidationError>;

/// Failure to construct a schema instance from raw input.
///
/// Carries one [`Violation`] per broken field so the API layer can turn a
/// single validation pass into a complete client-facing diagnostic.
/// Nothing is retried or recovered at this layer.
#[derive(Debug, Error)]
#[error("{schema} failed validation: {}", format_violations(.violations))]
pub struct SchemaValidationError {
    /// Name of the schema that rejected the input.
    pub schema: &'static str,
    pub violations: Vec<Violation>,
}

impl SchemaValidationError {
    pub fn new(schema: &'static str, violations: Vec<Violation>) -> Self {
        Self { schema, violations }
    }

    pub fn single(schema: &'static str, violation: Violation) -> Self {
        Self::new(schema, vec![violation])
    }
}

/// A single field-level constraint breach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted path of the field from the schema root, e.g. `inputs.data1.uuid`.
    pub path: String,
    /// Human-readable constraint that was not met.
    pub expected: String,
    /// The offending value; `None` when the key was absent.
    pub received: Option<Value>,
}

impl Violation {
    pub fn missing(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            received: None,
        }
    }

    pub fn mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        received: &Value,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            received: Some(received.clone()),
        }
    }

    /// Re-roots the path under `prefix` when a nested value fails.
    pub(crate) fn prefixed(self, prefix: &str) -> Self {
        let path = if self.path.is_empty() {
            prefix.to_owned()
        } else if self.path.starts_with('[') {
            format!("{prefix}{}", self.path)
        } else {
            format!("{prefix}.{}", self.path)
        };
        Self { path, ..self }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        match &self.received {
            Some(value) => write!(f, "`{path}`: expected {}, got `{value}`", self.expected),
            None => write!(f, "`{path}`: expected {}, but the field is missing", self.expected),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
