//! Bulk batch resolution and partial-failure collection.

pub mod results;
pub mod selector;

pub use results::BulkOperationResults;
pub use selector::{
    filter_authorized, resolve_authorized_batch, sanitize_identifiers, ResolvedBatch,
};
