//! Data model: the task entity, its read-only projections and the
//! denormalized collaborator snapshots it carries.

pub mod attachment;
pub mod classification;
pub mod lifecycle;
pub mod object_reference;
pub mod summary;
pub mod task;
pub mod workbasket;

pub use attachment::{Attachment, AttachmentSummary};
pub use classification::ClassificationSummary;
pub use lifecycle::{TaskLifecycle, TaskView};
pub use object_reference::ObjectReference;
pub use summary::{MinimalTaskSummary, TaskSummary};
pub use task::{CustomField, Task, CALLBACK_STATE_KEY};
pub use workbasket::{WorkbasketPermission, WorkbasketSummary};
