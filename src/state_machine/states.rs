use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle states.
///
/// The happy path is READY → CLAIMED → COMPLETED. READY and CLAIMED can also
/// move to CANCELLED or TERMINATED. COMPLETED, CANCELLED and TERMINATED are
/// end states: no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting in its workbasket for an owner.
    Ready,
    /// Exclusively owned by a single actor.
    Claimed,
    /// Finished successfully.
    Completed,
    /// Abandoned by a caller.
    Cancelled,
    /// Forcibly closed by an administrator.
    Terminated,
}

impl TaskState {
    /// Check if this is an end state (no further transitions allowed).
    pub fn is_end_state(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Terminated)
    }

    /// Check if a claim may start from this state.
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Ready | Self::Claimed)
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Ready
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Claimed => write!(f, "claimed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "claimed" => Ok(Self::Claimed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "terminated" => Ok(Self::Terminated),
            _ => Err(format!("Invalid task state: {s}")),
        }
    }
}

/// Callback sub-lifecycle, independent of [`TaskState`].
///
/// Tracks whether an external system has been notified of a task's terminal
/// status: NONE → CALLBACK_PROCESSING_REQUIRED → CALLBACK_PROCESSING_COMPLETED,
/// with CLAIMED as an intermediate marker while the callback is being worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackState {
    None,
    CallbackProcessingRequired,
    Claimed,
    CallbackProcessingCompleted,
}

impl CallbackState {
    /// Whether `desired` may be set on a task whose main state is
    /// `task_state` and whose current callback state is `self`.
    ///
    /// Legality depends jointly on both lifecycles:
    /// - `CallbackProcessingCompleted` requires the main state to be an end
    ///   state.
    /// - `Claimed` requires main state CLAIMED and current callback state
    ///   CALLBACK_PROCESSING_REQUIRED.
    /// - `CallbackProcessingRequired` is allowed unless callback processing
    ///   already completed.
    /// - `None` can never be re-requested.
    pub fn can_transition_to(&self, desired: CallbackState, task_state: TaskState) -> bool {
        match desired {
            Self::CallbackProcessingCompleted => task_state.is_end_state(),
            Self::Claimed => {
                task_state == TaskState::Claimed && *self == Self::CallbackProcessingRequired
            }
            Self::CallbackProcessingRequired => *self != Self::CallbackProcessingCompleted,
            Self::None => false,
        }
    }
}

impl Default for CallbackState {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for CallbackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::CallbackProcessingRequired => write!(f, "callback_processing_required"),
            Self::Claimed => write!(f, "claimed"),
            Self::CallbackProcessingCompleted => write!(f, "callback_processing_completed"),
        }
    }
}

impl std::str::FromStr for CallbackState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "callback_processing_required" => Ok(Self::CallbackProcessingRequired),
            "claimed" => Ok(Self::Claimed),
            "callback_processing_completed" => Ok(Self::CallbackProcessingCompleted),
            _ => Err(format!("Invalid callback state: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_state_check() {
        assert!(TaskState::Completed.is_end_state());
        assert!(TaskState::Cancelled.is_end_state());
        assert!(TaskState::Terminated.is_end_state());
        assert!(!TaskState::Ready.is_end_state());
        assert!(!TaskState::Claimed.is_end_state());
    }

    #[test]
    fn test_claimable_states() {
        assert!(TaskState::Ready.is_claimable());
        assert!(TaskState::Claimed.is_claimable());
        assert!(!TaskState::Completed.is_claimable());
        assert!(!TaskState::Terminated.is_claimable());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(TaskState::Claimed.to_string(), "claimed");
        assert_eq!("completed".parse::<TaskState>().unwrap(), TaskState::Completed);
        assert!("running".parse::<TaskState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&TaskState::Terminated).unwrap();
        assert_eq!(json, "\"terminated\"");
        let parsed: TaskState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TaskState::Terminated);
    }

    #[test]
    fn test_callback_completed_requires_end_state() {
        let current = CallbackState::CallbackProcessingRequired;
        assert!(current.can_transition_to(
            CallbackState::CallbackProcessingCompleted,
            TaskState::Completed
        ));
        assert!(!current.can_transition_to(
            CallbackState::CallbackProcessingCompleted,
            TaskState::Claimed
        ));
    }

    #[test]
    fn test_callback_claimed_requires_both_lifecycles() {
        assert!(CallbackState::CallbackProcessingRequired
            .can_transition_to(CallbackState::Claimed, TaskState::Claimed));
        assert!(!CallbackState::CallbackProcessingRequired
            .can_transition_to(CallbackState::Claimed, TaskState::Ready));
        assert!(!CallbackState::None.can_transition_to(CallbackState::Claimed, TaskState::Claimed));
    }

    #[test]
    fn test_callback_required_blocked_after_completion() {
        assert!(CallbackState::None
            .can_transition_to(CallbackState::CallbackProcessingRequired, TaskState::Ready));
        assert!(!CallbackState::CallbackProcessingCompleted
            .can_transition_to(CallbackState::CallbackProcessingRequired, TaskState::Completed));
    }

    #[test]
    fn test_callback_none_never_a_target() {
        for task_state in [TaskState::Ready, TaskState::Completed] {
            assert!(!CallbackState::CallbackProcessingRequired
                .can_transition_to(CallbackState::None, task_state));
        }
    }
}
