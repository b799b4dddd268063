/// Task boundary shapes
///
/// Tasks carry two aliased fields for older clients: `due_date` is also
/// spelled `deadline`, and `creator_id` is also spelled `user_id`. Responses
/// carry both spellings; requests may use either, with the canonical name
/// winning if both appear.
use serde_json::Value;

use super::{canonicalize_dates, fill_empty_arrays, fold_aliases, mirror_aliases, AliasTable};
use crate::models::task::Task;

const ALIASES: AliasTable = &[("due_date", "deadline"), ("creator_id", "user_id")];

const ARRAY_FIELDS: &[&str] = &["tags"];

const DATE_FIELDS: &[&str] = &["due_date", "last_completed", "created_at", "updated_at"];

/// Normalizes an inbound task body onto canonical field names
///
/// The result deserializes into [`CreateTask`](crate::models::task::CreateTask)
/// or [`TaskPatch`](crate::models::task::TaskPatch). Non-object bodies pass
/// through untouched for validation to reject.
pub fn from_request_shape(mut body: Value) -> Value {
    if let Value::Object(obj) = &mut body {
        fold_aliases(obj, ALIASES);
        canonicalize_dates(obj, DATE_FIELDS);
    }
    body
}

/// Produces the response form of a task record
pub fn to_response_shape(task: &Task) -> Value {
    // Task serialization cannot fail; every field is a plain JSON type.
    let value = serde_json::to_value(task).unwrap_or(Value::Null);
    shape_value(value)
}

/// Shapes an already-serialized task value
///
/// Folding before mirroring keeps the function idempotent on values that
/// already carry the alias fields.
pub fn shape_value(mut value: Value) -> Value {
    if let Value::Object(obj) = &mut value {
        fold_aliases(obj, ALIASES);
        canonicalize_dates(obj, DATE_FIELDS);
        fill_empty_arrays(obj, ARRAY_FIELDS);
        mirror_aliases(obj, ALIASES);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use crate::models::task::{TaskPatch, TaskPriority};

    fn sample_task() -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            creator_id: Uuid::new_v4(),
            assignee_id: None,
            title: "Write release notes".to_string(),
            description: None,
            status: "todo".to_string(),
            priority: TaskPriority::Medium,
            category: None,
            tags: vec!["docs".to_string()],
            due_date: Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()),
            is_recurring: false,
            recurrence_pattern: None,
            last_completed: None,
            position: 3,
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_carries_both_spellings() {
        let task = sample_task();
        let shaped = to_response_shape(&task);

        assert_eq!(shaped["due_date"], shaped["deadline"]);
        assert_eq!(shaped["creator_id"], shaped["user_id"]);
        assert_eq!(shaped["creator_id"], json!(task.creator_id));
    }

    #[test]
    fn test_request_accepts_either_spelling() {
        let from_alias = from_request_shape(json!({
            "title": "t",
            "deadline": "2025-06-01",
            "user_id": "0b8f6f1e-31a1-4f3a-9a53-111111111111",
        }));

        assert_eq!(from_alias["due_date"], json!("2025-06-01T00:00:00.000000Z"));
        assert_eq!(
            from_alias["creator_id"],
            json!("0b8f6f1e-31a1-4f3a-9a53-111111111111")
        );
        assert!(from_alias.get("deadline").is_none());
        assert!(from_alias.get("user_id").is_none());
    }

    #[test]
    fn test_canonical_spelling_wins_over_alias() {
        let body = from_request_shape(json!({
            "due_date": "2025-06-01",
            "deadline": "2030-01-01",
        }));

        assert_eq!(body["due_date"], json!("2025-06-01T00:00:00.000000Z"));
    }

    #[test]
    fn test_null_tags_serialize_as_empty_array() {
        let shaped = shape_value(json!({"title": "t", "tags": null}));
        assert_eq!(shaped["tags"], json!([]));
    }

    #[test]
    fn test_shape_is_idempotent() {
        let once = to_response_shape(&sample_task());
        let twice = shape_value(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_round_trip_restores_canonical_form() {
        let task = sample_task();
        let canonical = serde_json::to_value(&task).unwrap();

        let restored = from_request_shape(to_response_shape(&task));

        for (key, expected) in canonical.as_object().unwrap() {
            if key == "due_date" {
                // Round-tripped through the canonical textual form.
                assert_eq!(restored[key], json!("2025-06-01T00:00:00.000000Z"));
            } else if DATE_FIELDS.contains(&key.as_str()) {
                continue;
            } else {
                assert_eq!(&restored[key], expected, "field {key}");
            }
        }
        assert!(restored.get("deadline").is_none());
        assert!(restored.get("user_id").is_none());
    }

    #[test]
    fn test_normalized_body_deserializes_into_patch() {
        let body = from_request_shape(json!({
            "title": "renamed",
            "deadline": "2025-07-01T00:00:00Z",
        }));

        let patch: TaskPatch = serde_json::from_value(body).unwrap();
        assert_eq!(patch.title.as_deref(), Some("renamed"));
        assert!(matches!(patch.due_date, Some(Some(_))));
    }
}
