//! Wire schemas for the job-execution API surface.
//!
//! Every type in this crate is the validated shape of one request or
//! response body exchanged with the job-management HTTP layer. The crate
//! holds no behavior beyond that boundary contract: construction from raw
//! JSON through [`Schema::from_value`] reports every broken field in one
//! pass, serialization is plain serde with an optional compact form that
//! drops fields equal to their declared default. Scheduling, dispatch and
//! state transitions live in the platform services that read and write
//! these records.

pub mod exception;
pub mod fields;
pub mod model;
pub mod validate;

#[rustfmt::skip]
pub use {
    exception::{SchemaResult, SchemaValidationError, Violation},
    fields::{DecodedDatabaseId, EncodedDatabaseId},
    validate::Schema,
};
