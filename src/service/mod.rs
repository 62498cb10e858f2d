//! The task service: single-item lifecycle operations, bulk operations and
//! summary augmentation.

pub mod augmenter;
pub mod bulk_ops;
pub mod task_service;

pub use task_service::TaskService;
