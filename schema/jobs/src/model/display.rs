//! The rendered view of a job's parameters and outputs.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::exception::{SchemaResult, SchemaValidationError, Violation};
use crate::fields::EncodedDatabaseId;
use crate::model::{DatasetSourceType, EncodedDatasetSourceId};
use crate::validate::{prune_null, ObjectReader, Schema};

/// One rendered output of a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobOutput {
    /// Label of the output as shown to the user. Tool configurations may
    /// put any shape here, so it is passed through opaquely.
    pub label: Value,
    /// The dataset behind the output.
    pub value: EncodedDatasetSourceId,
}

impl Schema for JobOutput {
    const NAME: &'static str = "JobOutput";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let label = obj.raw("label");
        let dataset = obj.nested("value");
        obj.finish()?;
        Ok(Self { label, value: dataset })
    }
}

/// A single concrete dataset bound to a parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobParameterValuesSimple {
    /// Origin of the dataset, either `hda` or `ldda`.
    pub src: DatasetSourceType,
    /// Encoded identifier of the dataset.
    pub id: EncodedDatabaseId,
    /// Name of the dataset.
    pub name: String,
    /// Index position of the dataset in its history.
    pub hid: i64,
}

impl Schema for JobParameterValuesSimple {
    const NAME: &'static str = "JobParameterValuesSimple";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let src = obj.source_type("src");
        let id = obj.encoded_id("id");
        let name = obj.string("name");
        let hid = obj.integer("hid");
        obj.finish()?;
        Ok(Self { src, id, name, hid })
    }
}

/// One staged input element of an extensive parameter value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobTargetElement {
    /// Name of the element.
    pub name: String,
    /// Database key of the element.
    pub dbkey: String,
    /// Datatype extension of the element.
    pub ext: String,
    /// Whether line endings are converted to POSIX lines.
    pub to_posix_lines: bool,
    /// Whether compressed content is decompressed automatically.
    pub auto_decompress: bool,
    /// Where the element content comes from.
    pub src: String,
    /// Content pasted in directly by the client.
    pub paste_content: String,
    /// Content hashes of the element, in order.
    pub hashes: Vec<String>,
    /// Whether the source is purged after staging.
    pub purge_source: bool,
    /// Encoded identifier of the staged object.
    pub object_id: EncodedDatabaseId,
}

impl Schema for JobTargetElement {
    const NAME: &'static str = "JobTargetElement";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let name = obj.string("name");
        let dbkey = obj.string("dbkey");
        let ext = obj.string("ext");
        let to_posix_lines = obj.boolean("to_posix_lines");
        let auto_decompress = obj.boolean("auto_decompress");
        let src = obj.string("src");
        let paste_content = obj.string("paste_content");
        let hashes = obj.string_list("hashes");
        let purge_source = obj.boolean("purge_source");
        let object_id = obj.encoded_id("object_id");
        obj.finish()?;
        Ok(Self {
            name,
            dbkey,
            ext,
            to_posix_lines,
            auto_decompress,
            src,
            paste_content,
            hashes,
            purge_source,
            object_id,
        })
    }
}

/// Where a staged target materializes, `hda` or `ldda` by convention.
/// Kept loosely typed, matching the wire format of existing clients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobTargetDestination {
    pub r#type: String,
}

impl Schema for JobTargetDestination {
    const NAME: &'static str = "JobTargetDestination";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let r#type = obj.string("type");
        obj.finish()?;
        Ok(Self { r#type })
    }
}

/// A destination plus the elements staged into it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobTarget {
    /// Where the elements are staged.
    pub destination: JobTargetDestination,
    /// The staged elements, in order.
    pub elements: Vec<JobTargetElement>,
}

impl Schema for JobTarget {
    const NAME: &'static str = "JobTarget";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let destination = obj.nested("destination");
        let elements = obj.nested_list("elements");
        obj.finish()?;
        Ok(Self { destination, elements })
    }
}

/// Parameter values described by staging multiple target elements rather
/// than by direct dataset references.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobParameterValuesExtensive {
    /// The staged targets, in order.
    pub targets: Vec<JobTarget>,
    /// Whether the staged content is checked after upload.
    pub check_content: bool,
}

impl Schema for JobParameterValuesExtensive {
    const NAME: &'static str = "JobParameterValuesExtensive";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let targets = obj.nested_list("targets");
        let check_content = obj.boolean("check_content");
        obj.finish()?;
        Ok(Self { targets, check_content })
    }
}

/// The value of one displayed job parameter.
///
/// Structural matching is attempted in a fixed order: a sequence of
/// simple dataset values first, then the extensive staged-targets object,
/// then a plain string. The order is part of the contract; it keeps the
/// match deterministic and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum JobParameterValue {
    Simple(Vec<JobParameterValuesSimple>),
    Extensive(JobParameterValuesExtensive),
    Text(String),
}

impl Default for JobParameterValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

const VALUE_SHAPES: &str =
    "a list of simple parameter values, a staged-targets object, or a string";

impl Schema for JobParameterValue {
    const NAME: &'static str = "JobParameterValue";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        match value {
            Value::Array(items) => {
                let mut branch = Vec::new();
                let mut parsed = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match JobParameterValuesSimple::from_value(item) {
                        Ok(simple) => parsed.push(simple),
                        Err(err) => branch.extend(
                            err.violations
                                .into_iter()
                                .map(|v| v.prefixed(&format!("[{index}]"))),
                        ),
                    }
                }
                if branch.is_empty() {
                    Ok(Self::Simple(parsed))
                } else {
                    let mut violations = vec![Violation::mismatch("", VALUE_SHAPES, value)];
                    violations.extend(branch);
                    Err(SchemaValidationError::new(Self::NAME, violations))
                }
            }
            Value::Object(_) => match JobParameterValuesExtensive::from_value(value) {
                Ok(extensive) => Ok(Self::Extensive(extensive)),
                Err(err) => {
                    let mut violations = vec![Violation::mismatch("", VALUE_SHAPES, value)];
                    violations.extend(err.violations);
                    Err(SchemaValidationError::new(Self::NAME, violations))
                }
            },
            Value::String(text) => Ok(Self::Text(text.clone())),
            other => Err(SchemaValidationError::single(
                Self::NAME,
                Violation::mismatch("", VALUE_SHAPES, other),
            )),
        }
    }
}

/// One displayed job parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobParameter {
    /// Text label of the parameter.
    pub text: String,
    /// Nesting depth of the parameter in the tool form.
    pub depth: i64,
    /// The value bound to the parameter.
    pub value: JobParameterValue,
    /// Notes attached to the parameter.
    pub notes: Option<String>,
}

impl Schema for JobParameter {
    const NAME: &'static str = "JobParameter";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let text = obj.string("text");
        let depth = obj.integer("depth");
        let parameter_value = obj.nested("value");
        let notes = obj.opt_string("notes");
        obj.finish()?;
        Ok(Self { text, depth, value: parameter_value, notes })
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        prune_null(fields, "notes");
    }
}

/// The full rendered view of a job's parameters and outputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobDisplayParametersSummary {
    /// The parameters of the job, in display order.
    pub parameters: Vec<JobParameter>,
    /// Whether any parameter failed to render.
    pub has_parameter_errors: bool,
    /// Tool outputs by name, each with its rendered dataset information.
    pub outputs: HashMap<String, Vec<JobOutput>>,
}

impl Schema for JobDisplayParametersSummary {
    const NAME: &'static str = "JobDisplayParametersSummary";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let parameters = obj.nested_list("parameters");
        let has_parameter_errors = obj.boolean("has_parameter_errors");
        let outputs = obj.nested_list_map("outputs");
        obj.finish()?;
        Ok(Self { parameters, has_parameter_errors, outputs })
    }
}
