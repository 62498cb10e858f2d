use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};

/// Structured pointer to an object in an external system, used as a task's
/// primary business correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub company: String,
    pub system: String,
    pub system_instance: String,
    pub object_type: String,
    pub value: String,
}

impl ObjectReference {
    /// All five components are mandatory; `context` names the failing call
    /// site in the error message.
    pub fn validate(obj_ref: Option<&ObjectReference>, context: &str) -> Result<()> {
        let obj_ref = obj_ref.ok_or_else(|| {
            TaskError::invalid_argument(format!("{context}: object reference must not be empty"))
        })?;
        for (field, value) in [
            ("company", &obj_ref.company),
            ("system", &obj_ref.system),
            ("system_instance", &obj_ref.system_instance),
            ("type", &obj_ref.object_type),
            ("value", &obj_ref.value),
        ] {
            if value.is_empty() {
                return Err(TaskError::invalid_argument(format!(
                    "{context}: object reference field {field} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_reference() -> ObjectReference {
        ObjectReference {
            company: "acme".to_string(),
            system: "erp".to_string(),
            system_instance: "erp-1".to_string(),
            object_type: "invoice".to_string(),
            value: "INV-42".to_string(),
        }
    }

    #[test]
    fn test_complete_reference_is_valid() {
        assert!(ObjectReference::validate(Some(&complete_reference()), "task").is_ok());
    }

    #[test]
    fn test_missing_reference_rejected() {
        assert!(matches!(
            ObjectReference::validate(None, "task"),
            Err(TaskError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_empty_field_rejected() {
        let mut obj_ref = complete_reference();
        obj_ref.value = String::new();
        assert!(matches!(
            ObjectReference::validate(Some(&obj_ref), "task"),
            Err(TaskError::InvalidArgument { .. })
        ));
    }
}
