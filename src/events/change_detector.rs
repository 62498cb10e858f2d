//! Field-level diff of two task snapshots, carried by created/updated
//! history events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One changed attribute with its old and new serialized values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Compare two serializable snapshots field by field.
///
/// Both values serialize to JSON objects (the task entity does); any field
/// whose serialized value differs is reported. Fields absent on one side are
/// reported against `null`.
pub fn determine_changes<T: Serialize>(old: &T, new: &T) -> Vec<AttributeChange> {
    let old_value = serde_json::to_value(old).unwrap_or(Value::Null);
    let new_value = serde_json::to_value(new).unwrap_or(Value::Null);

    let (Value::Object(old_map), Value::Object(new_map)) = (&old_value, &new_value) else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    for (field, old_field_value) in old_map {
        let new_field_value = new_map.get(field).unwrap_or(&Value::Null);
        if old_field_value != new_field_value {
            changes.push(AttributeChange {
                field: field.clone(),
                old_value: old_field_value.clone(),
                new_value: new_field_value.clone(),
            });
        }
    }
    for (field, new_field_value) in new_map {
        if !old_map.contains_key(field) {
            changes.push(AttributeChange {
                field: field.clone(),
                old_value: Value::Null,
                new_value: new_field_value.clone(),
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[test]
    fn test_no_changes_for_identical_snapshots() {
        let task = Task::new("WBI:1");
        assert!(determine_changes(&task, &task).is_empty());
    }

    #[test]
    fn test_reports_changed_fields_with_old_and_new() {
        let old = Task::new("WBI:1");
        let mut new = old.clone();
        new.name = Some("review invoice".to_string());
        new.priority = 5;

        let changes = determine_changes(&old, &new);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"priority"));

        let name_change = changes.iter().find(|c| c.field == "name").unwrap();
        assert_eq!(name_change.old_value, Value::Null);
        assert_eq!(name_change.new_value, Value::String("review invoice".to_string()));
    }
}
