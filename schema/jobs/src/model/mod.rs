//! The job description schema set.
//!
//! Shared base types live here; the request payloads, the detailed job
//! views and the parameter-display views live in the submodules.

pub mod details;
pub mod display;
pub mod payload;

#[rustfmt::skip]
pub use {
    details::{
        EncodedDatasetJobInfo, EncodedJobDetails, EncodedJobIDs, JobAssociation,
        JobDestinationParams, JobErrorSummary, JobInputSummary,
    },
    display::{
        JobDisplayParametersSummary, JobOutput, JobParameter, JobParameterValue,
        JobParameterValuesExtensive, JobParameterValuesSimple, JobTarget,
        JobTargetDestination, JobTargetElement,
    },
    payload::{DeleteJobPayload, ReportJobErrorPayload, SearchJobsPayload},
};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::exception::SchemaResult;
use crate::fields::EncodedDatabaseId;
use crate::validate::{prune_null, ObjectReader, Schema};

/// Origin of a dataset reference: a standalone history item (`hda`) or an
/// item belonging to a shared library collection (`ldda`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSourceType {
    #[default]
    Hda,
    Ldda,
}

impl DatasetSourceType {
    pub(crate) fn parse(tag: &str) -> Option<Self> {
        match tag {
            "hda" => Some(Self::Hda),
            "ldda" => Some(Self::Ldda),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hda => "hda",
            Self::Ldda => "ldda",
        }
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    New,
    Resubmitted,
    Upload,
    Waiting,
    Queued,
    Running,
    Ok,
    Error,
    Failed,
    Paused,
    Deleting,
    Deleted,
    Stopping,
    Stopped,
    Skipped,
}

impl JobState {
    pub(crate) fn parse(tag: &str) -> Option<Self> {
        Some(match tag {
            "new" => Self::New,
            "resubmitted" => Self::Resubmitted,
            "upload" => Self::Upload,
            "waiting" => Self::Waiting,
            "queued" => Self::Queued,
            "running" => Self::Running,
            "ok" => Self::Ok,
            "error" => Self::Error,
            "failed" => Self::Failed,
            "paused" => Self::Paused,
            "deleting" => Self::Deleting,
            "deleted" => Self::Deleted,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "skipped" => Self::Skipped,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Resubmitted => "resubmitted",
            Self::Upload => "upload",
            Self::Waiting => "waiting",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Failed => "failed",
            Self::Paused => "paused",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Skipped => "skipped",
        }
    }
}

/// Reference to a dataset together with where it originates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct EncodedDatasetSourceId {
    /// Encoded identifier of the dataset.
    pub id: EncodedDatabaseId,
    /// Origin of the dataset.
    pub src: DatasetSourceType,
}

impl EncodedDatasetSourceId {
    pub(crate) fn read(obj: &mut ObjectReader) -> Self {
        Self {
            id: obj.encoded_id("id"),
            src: obj.source_type("src"),
        }
    }
}

impl Schema for EncodedDatasetSourceId {
    const NAME: &'static str = "EncodedDatasetSourceId";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let dataset = Self::read(&mut obj);
        obj.finish()?;
        Ok(dataset)
    }
}

/// Summary slice of a job, flattened into every detailed job view.
///
/// Identifier fields are deliberately not part of the summary; they come
/// from [`EncodedJobIDs`] so a flattened combination of the two carries
/// each wire key exactly once.
#[derive(Debug, Clone, PartialEq, Default, Serialize, JsonSchema)]
pub struct JobSummary {
    /// The type of this model object, always the literal `"Job"`.
    pub model_class: String,
    /// Identifier of the tool that produced this job.
    pub tool_id: String,
    /// Current lifecycle state of the job.
    pub state: JobState,
    /// When the job was created.
    pub create_time: DateTime<Utc>,
    /// When the job was last updated.
    pub update_time: DateTime<Utc>,
    /// Exit code returned by the tool process, when it already finished.
    pub exit_code: Option<i64>,
    /// Identifier assigned to the job by the external runner.
    pub external_id: Option<String>,
    /// Full command line the job executed.
    pub command_line: Option<String>,
    /// Email of the user that ran this job, when known.
    pub user_email: Option<String>,
}

impl JobSummary {
    pub(crate) fn read(obj: &mut ObjectReader) -> Self {
        Self {
            model_class: obj.literal("model_class", "Job"),
            tool_id: obj.string("tool_id"),
            state: obj.job_state("state"),
            create_time: obj.datetime("create_time"),
            update_time: obj.datetime("update_time"),
            exit_code: obj.opt_integer("exit_code"),
            external_id: obj.opt_string("external_id"),
            command_line: obj.opt_string("command_line"),
            user_email: obj.opt_string("user_email"),
        }
    }
}

impl Schema for JobSummary {
    const NAME: &'static str = "JobSummary";

    fn from_value(value: &Value) -> SchemaResult<Self> {
        let mut obj = ObjectReader::root(Self::NAME, value)?;
        let summary = Self::read(&mut obj);
        obj.finish()?;
        Ok(summary)
    }

    fn prune_defaults(fields: &mut Map<String, Value>) {
        prune_null(fields, "exit_code");
        prune_null(fields, "external_id");
        prune_null(fields, "command_line");
        prune_null(fields, "user_email");
    }
}
