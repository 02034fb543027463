//! Detailed job views assembled from job state for API responses.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::exception::SchemaResult;
use crate::fields::EncodedDatabaseId;
use crate::model::{EncodedDatasetSourceId, JobSummary};
use crate::validate::{prune_empty_object, prune_null, ObjectReader, Schema};

/// Flags describing problems found in a job's inputs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobInputSummary {
    /// The job has empty inputs.
    pub has_empty_inputs: bool,
    /// The job has duplicate inputs.
    pub has_duplicate_inputs: bool,
}

impl Schema for JobInputSummary {
    const NAME: &'static str = "JobInputSummary";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let has_empty_inputs = obj.boolean("has_empty_inputs");
        let has_duplicate_inputs = obj.boolean("has_duplicate_inputs");
        obj.finish()?;
        Ok(Self { has_empty_inputs, has_duplicate_inputs })
    }
}

/// The error messages recorded for a job, grouped per source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobErrorSummary {
    /// Ordered groups of error message lines.
    pub messages: Vec<Vec<String>>,
}

impl Schema for JobErrorSummary {
    const NAME: &'static str = "JobErrorSummary";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let messages = obj.string_matrix("messages");
        obj.finish()?;
        Ok(Self { messages })
    }
}

/// A named link between a job and one of its data items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobAssociation {
    /// Name of the job parameter the item is bound to.
    pub name: String,
    /// Reference to the associated item.
    pub dataset: EncodedDatasetSourceId,
}

impl Schema for JobAssociation {
    const NAME: &'static str = "JobAssociation";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let name = obj.string("name");
        let dataset = obj.nested("dataset");
        obj.finish()?;
        Ok(Self { name, dataset })
    }
}

/// A dataset-source reference extended with the dataset's UUID.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct EncodedDatasetJobInfo {
    #[serde(flatten)]
    pub dataset: EncodedDatasetSourceId,
    /// UUID of the dataset.
    pub uuid: Uuid,
}

impl Schema for EncodedDatasetJobInfo {
    const NAME: &'static str = "EncodedDatasetJobInfo";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let dataset = EncodedDatasetSourceId::read(&mut obj);
        let uuid = obj.uuid("uuid");
        obj.finish()?;
        Ok(Self { dataset, uuid })
    }
}

/// The encoded identifiers attached to a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct EncodedJobIDs {
    /// Encoded identifier of the job.
    pub id: EncodedDatabaseId,
    /// Encoded identifier of the history the job belongs to.
    pub history_id: Option<EncodedDatabaseId>,
}

impl EncodedJobIDs {
    pub(crate) fn read(obj: &mut ObjectReader) -> Self {
        Self {
            id: obj.encoded_id("id"),
            history_id: obj.opt_encoded_id("history_id"),
        }
    }
}

impl Schema for EncodedJobIDs {
    const NAME: &'static str = "EncodedJobIDs";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let ids = Self::read(&mut obj);
        obj.finish()?;
        Ok(ids)
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        prune_null(fields, "history_id");
    }
}

/// The full external view of one job.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct EncodedJobDetails {
    #[serde(flatten)]
    pub ids: EncodedJobIDs,
    #[serde(flatten)]
    pub summary: JobSummary,
    /// Tool version indicated during job execution.
    pub command_version: String,
    /// All parameters of the tool associated with this job. The shape
    /// depends entirely on the tool and is passed through opaquely.
    pub params: Value,
    /// Tool inputs by name, with the corresponding data references.
    pub inputs: HashMap<String, EncodedDatasetJobInfo>,
    /// Tool outputs by name, with the corresponding data references.
    pub outputs: HashMap<String, EncodedDatasetJobInfo>,
    /// Reference to the cached job this one was copied from, when the
    /// execution was satisfied from the job cache.
    pub copied_from_job_id: Option<EncodedDatabaseId>,
    /// Output collections of the job, passed through opaquely.
    pub output_collections: Value,
}

impl Default for EncodedJobDetails {
    fn default() -> Self {
        Self {
            ids: EncodedJobIDs::default(),
            summary: JobSummary::default(),
            command_version: String::new(),
            params: Value::Null,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            copied_from_job_id: None,
            output_collections: Value::Object(Map::new()),
        }
    }
}

impl Schema for EncodedJobDetails {
    const NAME: &'static str = "EncodedJobDetails";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let ids = EncodedJobIDs::read(&mut obj);
        let summary = JobSummary::read(&mut obj);
        let command_version = obj.string("command_version");
        let params = obj.raw("params");
        let inputs = obj.nested_map("inputs");
        let outputs = obj.nested_map("outputs");
        let copied_from_job_id = obj.opt_encoded_id("copied_from_job_id");
        let output_collections = obj.raw_or("output_collections", Value::Object(Map::new()));
        obj.finish()?;
        Ok(Self {
            ids,
            summary,
            command_version,
            params,
            inputs,
            outputs,
            copied_from_job_id,
            output_collections,
        })
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        EncodedJobIDs::prune_defaults(fields);
        JobSummary::prune_defaults(fields);
        prune_empty_object(fields, "inputs");
        prune_empty_object(fields, "outputs");
        prune_null(fields, "copied_from_job_id");
        prune_empty_object(fields, "output_collections");
    }
}

/// Where and how a job executed on the external runner backend.
///
/// The wire names of these fields are the human-readable labels used by
/// the existing destination-parameters endpoint; they are applied
/// symmetrically when parsing and serializing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobDestinationParams {
    /// Job runner class.
    #[serde(rename = "Runner")]
    pub runner: String,
    /// Identifier assigned to the submitted job by the external runner.
    #[serde(rename = "Runner Job ID")]
    pub runner_job_id: String,
    /// Name of the handler that managed the job.
    #[serde(rename = "Handler")]
    pub handler: String,
}

impl Schema for JobDestinationParams {
    const NAME: &'static str = "JobDestinationParams";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let runner = obj.string("Runner");
        let runner_job_id = obj.string("Runner Job ID");
        let handler = obj.string("Handler");
        obj.finish()?;
        Ok(Self { runner, runner_job_id, handler })
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use serde_json::json;

    use super::*;

    fn details_fixture() -> Value {
        json!({
            "id": "1cd8e2f6b131e891",
            "history_id": "b887d74393f85b6d",
            "model_class": "Job",
            "tool_id": "cat1",
            "state": "ok",
            "create_time": "2026-02-03T04:05:06Z",
            "update_time": "2026-02-03T04:10:06Z",
            "exit_code": 0,
            "external_id": null,
            "command_line": null,
            "user_email": null,
            "command_version": "1.2.0",
            "params": {"lines": "10", "chromInfo": "/data/len/hg17.len"},
            "inputs": {
                "input1": {
                    "id": "f2db41e1fa331b3e",
                    "src": "hda",
                    "uuid": "10423797-7838-4b55-99ef-a9e0bdd5b1ba",
                },
            },
            "outputs": {},
            "copied_from_job_id": null,
            "output_collections": {},
        })
    }

    #[test]
    fn details_parse_and_round_trip() {
        let details = EncodedJobDetails::from_value(&details_fixture()).unwrap();
        assert_eq!(details.ids.id, EncodedDatabaseId::new("1cd8e2f6b131e891"));
        assert_eq!(details.summary.exit_code, Some(0));
        assert_eq!(
            details.inputs["input1"].dataset.id,
            EncodedDatabaseId::new("f2db41e1fa331b3e")
        );
        let wire = details.to_value().unwrap();
        let reparsed = EncodedJobDetails::from_value(&wire).unwrap();
        assert_eq!(reparsed, details);
        assert_eq!(reparsed.to_value().unwrap(), wire);
    }

    #[test]
    fn details_default_their_optional_containers() {
        let details = EncodedJobDetails::from_value(&json!({
            "id": "1cd8e2f6b131e891",
            "model_class": "Job",
            "tool_id": "cat1",
            "state": "new",
            "create_time": "2026-02-03T04:05:06Z",
            "update_time": "2026-02-03T04:05:06Z",
            "command_version": "1.2.0",
            "params": {},
        }))
        .unwrap();
        assert!(details.inputs.is_empty());
        assert!(details.outputs.is_empty());
        assert_eq!(details.copied_from_job_id, None);
        assert_eq!(details.output_collections, json!({}));
    }

    #[test]
    fn details_compact_form_drops_defaulted_fields() {
        let mut fixture = details_fixture();
        fixture["inputs"] = json!({});
        let details = EncodedJobDetails::from_value(&fixture).unwrap();
        let compact = details.to_value_compact().unwrap();
        let fields = compact.as_object().unwrap();
        let pruned = [
            "inputs",
            "outputs",
            "copied_from_job_id",
            "output_collections",
            "external_id",
        ];
        for absent in pruned {
            assert!(!fields.contains_key(absent), "`{absent}` should be pruned");
        }
        assert_eq!(fields["exit_code"], json!(0));
        assert_eq!(fields["params"]["lines"], json!("10"));
    }

    #[test]
    fn null_params_are_accepted_as_opaque_values() {
        let mut fixture = details_fixture();
        fixture["params"] = json!(null);
        fixture["output_collections"] = json!(null);
        let details = EncodedJobDetails::from_value(&fixture).unwrap();
        assert_eq!(details.params, Value::Null);
        assert_eq!(details.output_collections, Value::Null);
        let wire = details.to_value().unwrap();
        assert_eq!(EncodedJobDetails::from_value(&wire).unwrap(), details);

        let mut absent = details_fixture();
        absent.as_object_mut().unwrap().remove("params");
        let err = EncodedJobDetails::from_value(&absent).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "params");
        assert!(err.violations[0].received.is_none());
    }

    #[test]
    fn nested_input_failures_carry_dotted_paths() {
        let mut fixture = details_fixture();
        fixture["inputs"]["input1"]["uuid"] = json!("not-a-uuid");
        fixture["inputs"]["input1"]["src"] = json!("hdca");
        let err = EncodedJobDetails::from_value(&fixture).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["inputs.input1.src", "inputs.input1.uuid"]);
    }

    #[test]
    fn missing_required_details_fields_are_all_reported() {
        let err = EncodedJobDetails::from_value(&json!({"id": "1cd8e2f6b131e891"}))
            .unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "model_class",
                "tool_id",
                "state",
                "create_time",
                "update_time",
                "command_version",
                "params",
            ]
        );
    }

    #[test]
    fn destination_params_use_their_wire_labels() {
        let params = JobDestinationParams::from_value(&json!({
            "Runner": "slurm",
            "Runner Job ID": "123",
            "Handler": "handler0",
        }))
        .unwrap();
        assert_eq!(params.runner, "slurm");
        assert_eq!(params.runner_job_id, "123");
        assert_eq!(
            serde_json::to_string_pretty(&params).unwrap(),
            indoc! {r#"
                {
                  "Runner": "slurm",
                  "Runner Job ID": "123",
                  "Handler": "handler0"
                }"#}
        );

        let err = JobDestinationParams::from_value(&json!({"runner": "slurm"})).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["Runner", "Runner Job ID", "Handler", "runner"]);
    }

    #[test]
    fn error_summary_keeps_message_groups_ordered() {
        let summary = JobErrorSummary::from_value(&json!({
            "messages": [["tool error", "stderr"], ["dataset error"]],
        }))
        .unwrap();
        assert_eq!(summary.messages, vec![
            vec!["tool error".to_owned(), "stderr".to_owned()],
            vec!["dataset error".to_owned()],
        ]);
        let wire = summary.to_value().unwrap();
        assert_eq!(JobErrorSummary::from_value(&wire).unwrap(), summary);

        let err = JobErrorSummary::from_value(&json!({"messages": [["ok"], "oops"]}))
            .unwrap_err();
        assert_eq!(err.violations[0].path, "messages[1]");
    }

    #[test]
    fn association_validates_its_dataset_reference() {
        let association = JobAssociation::from_value(&json!({
            "name": "input1",
            "dataset": {"id": "f2db41e1fa331b3e", "src": "ldda"},
        }))
        .unwrap();
        assert_eq!(association.dataset.src, crate::model::DatasetSourceType::Ldda);
        let wire = association.to_value().unwrap();
        assert_eq!(JobAssociation::from_value(&wire).unwrap(), association);

        let err = JobAssociation::from_value(&json!({
            "name": "input1",
            "dataset": {"id": "f2db41e1fa331b3e"},
        }))
        .unwrap_err();
        assert_eq!(err.violations[0].path, "dataset.src");
    }

    #[test]
    fn input_summary_requires_both_flags() {
        let err = JobInputSummary::from_value(&json!({})).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["has_empty_inputs", "has_duplicate_inputs"]);

        let summary = JobInputSummary::from_value(&json!({
            "has_empty_inputs": false,
            "has_duplicate_inputs": true,
        }))
        .unwrap();
        assert!(summary.has_duplicate_inputs);
        let wire = summary.to_value().unwrap();
        assert_eq!(JobInputSummary::from_value(&wire).unwrap(), summary);
    }
}
