//! History event side channel: one event per successful state transition.

pub mod change_detector;
pub mod history;
pub mod publisher;

pub use change_detector::{determine_changes, AttributeChange};
pub use history::{TaskEventKind, TaskHistoryEvent};
pub use publisher::EventPublisher;
