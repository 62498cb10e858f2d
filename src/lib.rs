#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # taskdesk-core
//!
//! Task lifecycle state machine and bulk-mutation engine for
//! workbasket-based work management.
//!
//! ## Overview
//!
//! Work items ("tasks") are routed into queues ("workbaskets") and worked on
//! by human or automated owners. This crate owns the rules governing how a
//! task moves between states (READY → CLAIMED → COMPLETED, with CANCELLED
//! and TERMINATED as alternative end states), the optimistic-concurrency and
//! authorization gates guarding each transition, and the machinery for
//! applying a transition to many tasks at once while reporting per-item
//! success or failure without aborting the whole batch.
//!
//! Persistence, workbasket/classification lookup and authorization are
//! external collaborators behind the [`storage`] traits; an in-memory
//! implementation backs the test suites and embedded use.
//!
//! ## Module Organization
//!
//! - [`models`] - Task entity, read-only projections, collaborator snapshots
//! - [`state_machine`] - States, transition guards and transition actions
//! - [`service`] - Single-item and bulk lifecycle operations
//! - [`bulk`] - Batch resolution and the partial-failure collector
//! - [`storage`] - Collaborator traits plus the in-memory backend
//! - [`events`] - History event side channel
//! - [`context`] - Request-scoped caller identity and roles
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use taskdesk_core::config::TaskdeskConfig;
//! use taskdesk_core::context::RequestContext;
//! use taskdesk_core::models::{
//!     ClassificationSummary, ObjectReference, Task, WorkbasketPermission, WorkbasketSummary,
//! };
//! use taskdesk_core::service::TaskService;
//! use taskdesk_core::storage::InMemoryBackend;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemoryBackend::new();
//! backend.add_workbasket(WorkbasketSummary::new("WBI:1", "inbox", "DOMAIN_A"));
//! backend.add_classification(ClassificationSummary::new("CLI:1", "L10000", "DOMAIN_A"));
//! backend.grant("WBI:1", "alice", [WorkbasketPermission::Read, WorkbasketPermission::Append]);
//!
//! let service = TaskService::new(
//!     Arc::new(backend.store()),
//!     Arc::new(backend.workbasket_service()),
//!     Arc::new(backend.classification_service()),
//!     TaskdeskConfig::default(),
//! );
//!
//! let alice = RequestContext::for_user("alice");
//! let mut task = Task::new("WBI:1");
//! task.classification_summary.key = "L10000".to_string();
//! task.primary_obj_ref = Some(ObjectReference {
//!     company: "acme".into(),
//!     system: "erp".into(),
//!     system_instance: "erp-1".into(),
//!     object_type: "invoice".into(),
//!     value: "INV-42".into(),
//! });
//!
//! let task = service.create_task(&alice, task).await?;
//! let task = service.claim(&alice, &task.id).await?;
//! service.complete_task(&alice, &task.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod ids;
pub mod logging;
pub mod models;
pub mod service;
pub mod state_machine;
pub mod storage;

pub use bulk::BulkOperationResults;
pub use config::TaskdeskConfig;
pub use context::{RequestContext, Role};
pub use error::{Result, StoreError, TaskError};
pub use models::{MinimalTaskSummary, Task, TaskSummary};
pub use service::TaskService;
pub use state_machine::{CallbackState, TaskState};
