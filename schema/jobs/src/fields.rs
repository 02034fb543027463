use std::fmt;

use schemars::JsonSchema;
use serde::Serialize;

/// Opaque, client-safe form of an internal database identifier.
///
/// Encoded identifiers are the only identifier representation allowed to
/// cross the API boundary; they are never interpreted by this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct EncodedDatabaseId(String);

impl EncodedDatabaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EncodedDatabaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EncodedDatabaseId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for EncodedDatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Internal numeric form of a database identifier.
///
/// Payload fields declared with this type expect the API router to have
/// decoded the client token before the payload is constructed; the two
/// representations must never mix on one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct DecodedDatabaseId(i64);

impl DecodedDatabaseId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for DecodedDatabaseId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for DecodedDatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn identifiers_serialize_transparently() {
        let encoded = serde_json::to_value(EncodedDatabaseId::new("f2db41e1fa331b3e")).unwrap();
        assert_eq!(encoded, json!("f2db41e1fa331b3e"));
        let decoded = serde_json::to_value(DecodedDatabaseId::new(42)).unwrap();
        assert_eq!(decoded, json!(42));
    }
}
