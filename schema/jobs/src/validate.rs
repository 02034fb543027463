//! Construction and serialization operations shared by every wire schema.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::exception::{SchemaResult, SchemaValidationError, Violation};
use crate::fields::{DecodedDatabaseId, EncodedDatabaseId};
use crate::model::{DatasetSourceType, JobState};

/// Boundary contract of one wire schema.
///
/// [`Schema::from_value`] either yields a fully validated instance or a
/// [`SchemaValidationError`] listing every field that broke a constraint.
/// Serialization is plain serde; [`Schema::to_value_compact`] additionally
/// drops fields equal to their declared default, for callers that want the
/// compact wire form instead of the full one.
pub trait Schema: Serialize + Sized {
    /// Schema name used in validation errors.
    const NAME: &'static str;

    fn from_value(value: &Value) -> SchemaResult<Self>;

    fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    fn to_value_compact(&self) -> Result<Value, serde_json::Error> {
        let mut value = self.to_value()?;
        if let Value::Object(fields) = &mut value {
            Self::prune_defaults(fields);
        }
        Ok(value)
    }

    /// Removes top-level fields equal to their declared default. Schemas
    /// without defaulted fields keep the no-op.
    fn prune_defaults(_fields: &mut Map<String, Value>) {}
}

/// Drops `key` when it serialized as `null`.
pub(crate) fn prune_null(fields: &mut Map<String, Value>, key: &str) {
    if matches!(fields.get(key), Some(Value::Null)) {
        fields.remove(key);
    }
}

/// Drops `key` when it serialized as an empty object.
pub(crate) fn prune_empty_object(fields: &mut Map<String, Value>, key: &str) {
    if matches!(fields.get(key), Some(Value::Object(map)) if map.is_empty()) {
        fields.remove(key);
    }
}

/// Field-by-field reader over one raw JSON object.
///
/// Getters record a [`Violation`] instead of failing fast, so a single
/// pass reports every broken field. Required getters return a placeholder
/// on error; the placeholder never escapes because [`ObjectReader::finish`]
/// fails whenever a violation was recorded. Typed required getters record
/// a violation for an explicit `null` as well as for an absent key, and
/// typed optional getters map both to the declared default; the opaque
/// [`ObjectReader::raw`] getters accept `null` as a value and react to key
/// absence only.
pub struct ObjectReader<'a> {
    schema: &'static str,
    fields: &'a Map<String, Value>,
    claimed: HashSet<&'static str>,
    violations: Vec<Violation>,
}

impl<'a> ObjectReader<'a> {
    pub fn root(schema: &'static str, value: &'a Value) -> SchemaResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                schema,
                fields,
                claimed: HashSet::new(),
                violations: Vec::new(),
            }),
            other => Err(SchemaValidationError::single(
                schema,
                Violation::mismatch("", "a JSON object", other),
            )),
        }
    }

    /// Closes the schema: every key not claimed by a getter is a violation.
    /// This is the platform-wide default for all schemas.
    pub fn finish(mut self) -> SchemaResult<()> {
        let unknown: Vec<(String, Value)> = self
            .fields
            .iter()
            .filter(|(key, _)| !self.claimed.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in unknown {
            self.violations.push(Violation::mismatch(
                key,
                format!("no such field on {}", self.schema),
                &value,
            ));
        }
        self.into_result(())
    }

    /// Closes an open schema: unclaimed keys are retained and returned as
    /// the residual bag instead of being rejected.
    pub fn finish_open(self) -> SchemaResult<Map<String, Value>> {
        let extra: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(key, _)| !self.claimed.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.into_result(extra)
    }

    fn into_result<T>(self, ok: T) -> SchemaResult<T> {
        if self.violations.is_empty() {
            Ok(ok)
        } else {
            Err(SchemaValidationError::new(self.schema, self.violations))
        }
    }

    fn take(&mut self, key: &'static str) -> Option<&'a Value> {
        self.claimed.insert(key);
        self.fields.get(key)
    }

    fn missing(&mut self, key: &'static str, expected: impl Into<String>) {
        self.violations.push(Violation::missing(key, expected));
    }

    fn mismatch(&mut self, key: &'static str, expected: impl Into<String>, value: &Value) {
        self.violations.push(Violation::mismatch(key, expected, value));
    }

    fn absorb(&mut self, prefix: &str, err: SchemaValidationError) {
        self.violations.extend(err.violations.into_iter().map(|v| v.prefixed(prefix)));
    }

    pub fn boolean(&mut self, key: &'static str) -> bool {
        match self.take(key) {
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                self.mismatch(key, "a boolean", other);
                false
            }
            None => {
                self.missing(key, "a boolean");
                false
            }
        }
    }

    pub fn string(&mut self, key: &'static str) -> String {
        match self.take(key) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => {
                self.mismatch(key, "a string", other);
                String::new()
            }
            None => {
                self.missing(key, "a string");
                String::new()
            }
        }
    }

    pub fn opt_string(&mut self, key: &'static str) -> Option<String> {
        match self.take(key) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Null) | None => None,
            Some(other) => {
                self.mismatch(key, "a string or null", other);
                None
            }
        }
    }

    pub fn integer(&mut self, key: &'static str) -> i64 {
        match self.take(key) {
            Some(Value::Number(number)) if number.as_i64().is_some() => {
                number.as_i64().unwrap_or_default()
            }
            Some(other) => {
                self.mismatch(key, "an integer", other);
                0
            }
            None => {
                self.missing(key, "an integer");
                0
            }
        }
    }

    pub fn opt_integer(&mut self, key: &'static str) -> Option<i64> {
        match self.take(key) {
            Some(Value::Number(number)) if number.as_i64().is_some() => number.as_i64(),
            Some(Value::Null) | None => None,
            Some(other) => {
                self.mismatch(key, "an integer or null", other);
                None
            }
        }
    }

    /// A required field whose literal value is fixed by the schema.
    pub fn literal(&mut self, key: &'static str, literal: &'static str) -> String {
        match self.take(key) {
            Some(Value::String(text)) if text == literal => text.clone(),
            Some(other) => {
                self.mismatch(key, format!("the literal `\"{literal}\"`"), other);
                literal.to_owned()
            }
            None => {
                self.missing(key, format!("the literal `\"{literal}\"`"));
                literal.to_owned()
            }
        }
    }

    pub fn uuid(&mut self, key: &'static str) -> Uuid {
        match self.take(key) {
            Some(value @ Value::String(text)) => match Uuid::parse_str(text) {
                Ok(uuid) => uuid,
                Err(_) => {
                    self.mismatch(key, "a UUID string", value);
                    Uuid::nil()
                }
            },
            Some(other) => {
                self.mismatch(key, "a UUID string", other);
                Uuid::nil()
            }
            None => {
                self.missing(key, "a UUID string");
                Uuid::nil()
            }
        }
    }

    pub fn datetime(&mut self, key: &'static str) -> DateTime<Utc> {
        match self.take(key) {
            Some(value @ Value::String(text)) => match DateTime::parse_from_rfc3339(text) {
                Ok(datetime) => datetime.with_timezone(&Utc),
                Err(_) => {
                    self.mismatch(key, "an RFC 3339 timestamp", value);
                    DateTime::default()
                }
            },
            Some(other) => {
                self.mismatch(key, "an RFC 3339 timestamp", other);
                DateTime::default()
            }
            None => {
                self.missing(key, "an RFC 3339 timestamp");
                DateTime::default()
            }
        }
    }

    pub fn encoded_id(&mut self, key: &'static str) -> EncodedDatabaseId {
        EncodedDatabaseId::new(self.string(key))
    }

    pub fn opt_encoded_id(&mut self, key: &'static str) -> Option<EncodedDatabaseId> {
        self.opt_string(key).map(EncodedDatabaseId::new)
    }

    pub fn decoded_id(&mut self, key: &'static str) -> DecodedDatabaseId {
        DecodedDatabaseId::new(self.integer(key))
    }

    pub fn source_type(&mut self, key: &'static str) -> DatasetSourceType {
        match self.take(key) {
            Some(value @ Value::String(tag)) => match DatasetSourceType::parse(tag) {
                Some(src) => src,
                None => {
                    self.mismatch(key, "one of `hda`, `ldda`", value);
                    DatasetSourceType::default()
                }
            },
            Some(other) => {
                self.mismatch(key, "one of `hda`, `ldda`", other);
                DatasetSourceType::default()
            }
            None => {
                self.missing(key, "one of `hda`, `ldda`");
                DatasetSourceType::default()
            }
        }
    }

    pub fn job_state(&mut self, key: &'static str) -> JobState {
        match self.take(key) {
            Some(value @ Value::String(tag)) => match JobState::parse(tag) {
                Some(state) => state,
                None => {
                    self.mismatch(key, "a job state tag", value);
                    JobState::default()
                }
            },
            Some(other) => {
                self.mismatch(key, "a job state tag", other);
                JobState::default()
            }
            None => {
                self.missing(key, "a job state tag");
                JobState::default()
            }
        }
    }

    /// A required opaque passthrough value. Any shape is a value here,
    /// `null` included; only an absent key is a violation.
    pub fn raw(&mut self, key: &'static str) -> Value {
        match self.take(key) {
            Some(value) => value.clone(),
            None => {
                self.missing(key, "any value");
                Value::Null
            }
        }
    }

    /// An opaque passthrough value with a declared default. Only an
    /// absent key takes the default; an explicit `null` is passed through.
    pub fn raw_or(&mut self, key: &'static str, default: Value) -> Value {
        match self.take(key) {
            Some(value) => value.clone(),
            None => default,
        }
    }

    pub fn string_list(&mut self, key: &'static str) -> Vec<String> {
        match self.take(key) {
            Some(Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(text) => list.push(text.clone()),
                        other => self.violations.push(Violation::mismatch(
                            format!("{key}[{index}]"),
                            "a string",
                            other,
                        )),
                    }
                }
                list
            }
            Some(other) => {
                self.mismatch(key, "a list of strings", other);
                Vec::new()
            }
            None => {
                self.missing(key, "a list of strings");
                Vec::new()
            }
        }
    }

    pub fn string_matrix(&mut self, key: &'static str) -> Vec<Vec<String>> {
        match self.take(key) {
            Some(Value::Array(groups)) => {
                let mut matrix = Vec::with_capacity(groups.len());
                for (index, group) in groups.iter().enumerate() {
                    match group {
                        Value::Array(items) => {
                            let mut list = Vec::with_capacity(items.len());
                            for (nested, item) in items.iter().enumerate() {
                                match item {
                                    Value::String(text) => list.push(text.clone()),
                                    other => self.violations.push(Violation::mismatch(
                                        format!("{key}[{index}][{nested}]"),
                                        "a string",
                                        other,
                                    )),
                                }
                            }
                            matrix.push(list);
                        }
                        other => self.violations.push(Violation::mismatch(
                            format!("{key}[{index}]"),
                            "a list of strings",
                            other,
                        )),
                    }
                }
                matrix
            }
            Some(other) => {
                self.mismatch(key, "a list of string lists", other);
                Vec::new()
            }
            None => {
                self.missing(key, "a list of string lists");
                Vec::new()
            }
        }
    }

    /// A required nested schema object.
    pub fn nested<T: Schema + Default>(&mut self, key: &'static str) -> T {
        match self.take(key) {
            Some(Value::Null) => {
                self.mismatch(key, format!("a {} object", T::NAME), &Value::Null);
                T::default()
            }
            Some(value) => match T::from_value(value) {
                Ok(parsed) => parsed,
                Err(err) => {
                    self.absorb(key, err);
                    T::default()
                }
            },
            None => {
                self.missing(key, format!("a {} object", T::NAME));
                T::default()
            }
        }
    }

    /// A required list of nested schema objects.
    pub fn nested_list<T: Schema + Default>(&mut self, key: &'static str) -> Vec<T> {
        match self.take(key) {
            Some(Value::Array(items)) => {
                let mut list = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match T::from_value(item) {
                        Ok(parsed) => list.push(parsed),
                        Err(err) => self.absorb(&format!("{key}[{index}]"), err),
                    }
                }
                list
            }
            Some(other) => {
                self.mismatch(key, format!("a list of {} objects", T::NAME), other);
                Vec::new()
            }
            None => {
                self.missing(key, format!("a list of {} objects", T::NAME));
                Vec::new()
            }
        }
    }

    /// A name-to-schema mapping that defaults to empty when absent.
    pub fn nested_map<T: Schema + Default>(&mut self, key: &'static str) -> HashMap<String, T> {
        match self.take(key) {
            Some(Value::Object(entries)) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (name, entry) in entries {
                    match T::from_value(entry) {
                        Ok(parsed) => {
                            map.insert(name.clone(), parsed);
                        }
                        Err(err) => self.absorb(&format!("{key}.{name}"), err),
                    }
                }
                map
            }
            Some(Value::Null) | None => HashMap::new(),
            Some(other) => {
                self.mismatch(key, format!("a mapping of {} objects", T::NAME), other);
                HashMap::new()
            }
        }
    }

    /// A required name-to-list-of-schema mapping.
    pub fn nested_list_map<T: Schema + Default>(
        &mut self,
        key: &'static str,
    ) -> HashMap<String, Vec<T>> {
        match self.take(key) {
            Some(Value::Object(entries)) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (name, entry) in entries {
                    match entry {
                        Value::Array(items) => {
                            let mut list = Vec::with_capacity(items.len());
                            for (index, item) in items.iter().enumerate() {
                                match T::from_value(item) {
                                    Ok(parsed) => list.push(parsed),
                                    Err(err) => {
                                        self.absorb(&format!("{key}.{name}[{index}]"), err)
                                    }
                                }
                            }
                            map.insert(name.clone(), list);
                        }
                        other => self.violations.push(Violation::mismatch(
                            format!("{key}.{name}"),
                            format!("a list of {} objects", T::NAME),
                            other,
                        )),
                    }
                }
                map
            }
            Some(other) => {
                self.mismatch(key, format!("a mapping of {} lists", T::NAME), other);
                HashMap::new()
            }
            None => {
                self.missing(key, format!("a mapping of {} lists", T::NAME));
                HashMap::new()
            }
        }
    }
}
