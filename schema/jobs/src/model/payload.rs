//! Request payloads parsed from client bodies by the API layer.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::exception::SchemaResult;
use crate::fields::DecodedDatabaseId;
use crate::validate::{prune_null, ObjectReader, Schema};

/// Request to report a tool error observed on one of the job's datasets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct ReportJobErrorPayload {
    /// Decoded identifier of the dataset the error relates to.
    pub dataset_id: DecodedDatabaseId,
    /// Reply address for the report. Only required for anonymous users.
    pub email: Option<String>,
    /// Free-text message sent along with the report.
    pub message: Option<String>,
}

impl Schema for ReportJobErrorPayload {
    const NAME: &'static str = "ReportJobErrorPayload";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let dataset_id = obj.decoded_id("dataset_id");
        let email = obj.opt_string("email");
        let message = obj.opt_string("message");
        obj.finish()?;
        Ok(Self { dataset_id, email, message })
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        prune_null(fields, "email");
        prune_null(fields, "message");
    }
}

/// Search criteria for locating previously run jobs.
///
/// The only open schema in the set: clients attach file-upload style
/// fields whose names are not known in advance (`file_…`, `__file_…`),
/// so undeclared keys are retained in `extra` instead of being rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct SearchJobsPayload {
    /// Identifier of the tool whose jobs are searched.
    pub tool_id: String,
    /// The job inputs as a JSON dump. The content is an object, but the
    /// wire format carries it string-encoded; kept as-is for
    /// compatibility with existing clients.
    pub inputs: String,
    /// State the matched jobs must be in.
    pub state: String,
    /// Every client-sent field not declared above, verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Schema for SearchJobsPayload {
    const NAME: &'static str = "SearchJobsPayload";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let tool_id = obj.string("tool_id");
        let inputs = obj.string("inputs");
        let state = obj.string("state");
        let extra = obj.finish_open()?;
        Ok(Self { tool_id, inputs, state, extra })
    }
}

/// Request to delete a job, optionally carrying a stop message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct DeleteJobPayload {
    /// Message shown as the reason the job was stopped.
    pub message: Option<String>,
}

impl Schema for DeleteJobPayload {
    const NAME: &'static str = "DeleteJobPayload";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let message = obj.opt_string("message");
        obj.finish()?;
        Ok(Self { message })
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        prune_null(fields, "message");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn report_payload_requires_the_dataset_id() {
        let err = ReportJobErrorPayload::from_value(&json!({"email": "u@example.org"}))
            .unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "dataset_id");
        assert!(err.violations[0].received.is_none());
    }

    #[test]
    fn report_payload_defaults_its_optionals() {
        let payload = ReportJobErrorPayload::from_value(&json!({"dataset_id": 42})).unwrap();
        assert_eq!(payload.dataset_id, DecodedDatabaseId::new(42));
        assert_eq!(payload.email, None);
        assert_eq!(payload.message, None);
        assert_eq!(
            payload.to_value().unwrap(),
            json!({"dataset_id": 42, "email": null, "message": null})
        );
        assert_eq!(payload.to_value_compact().unwrap(), json!({"dataset_id": 42}));
    }

    #[test]
    fn search_payload_retains_undeclared_fields() {
        let payload = SearchJobsPayload::from_value(&json!({
            "tool_id": "t1",
            "inputs": "{}",
            "state": "new",
            "file_upload_1": "blob",
            "__file_upload_1__": {"nested": true},
        }))
        .unwrap();
        assert_eq!(payload.tool_id, "t1");
        assert_eq!(payload.extra["file_upload_1"], json!("blob"));
        assert_eq!(payload.extra["__file_upload_1__"], json!({"nested": true}));
        let wire = payload.to_value().unwrap();
        assert_eq!(wire["file_upload_1"], json!("blob"));
        assert_eq!(SearchJobsPayload::from_value(&wire).unwrap(), payload);
    }

    #[test]
    fn search_payload_still_validates_its_declared_fields() {
        let err = SearchJobsPayload::from_value(&json!({
            "tool_id": "t1",
            "inputs": {"not": "a dump"},
            "file_upload_1": "blob",
        }))
        .unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["inputs", "state"]);
    }

    #[test]
    fn delete_payload_accepts_an_empty_body() {
        let payload = DeleteJobPayload::from_value(&json!({})).unwrap();
        assert_eq!(payload.message, None);
        assert_eq!(payload.to_value_compact().unwrap(), json!({}));

        let stopped = DeleteJobPayload::from_value(&json!({"message": "cleanup"})).unwrap();
        assert_eq!(stopped.message.as_deref(), Some("cleanup"));
        let wire = stopped.to_value().unwrap();
        assert_eq!(DeleteJobPayload::from_value(&wire).unwrap(), stopped);
    }
}
