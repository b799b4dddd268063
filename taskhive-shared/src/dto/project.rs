/// Project boundary shapes
///
/// Older clients address the owning user as `user_id`, so responses expose
/// `owner_id` under both names and requests may use either. `links` always
/// serializes as an array.
use serde_json::Value;

use super::{canonicalize_dates, fill_empty_arrays, fold_aliases, mirror_aliases, AliasTable};
use crate::models::project::Project;

const ALIASES: AliasTable = &[("owner_id", "user_id")];

const ARRAY_FIELDS: &[&str] = &["links"];

const DATE_FIELDS: &[&str] = &["created_at", "updated_at"];

/// Normalizes an inbound project body onto canonical field names
pub fn from_request_shape(mut body: Value) -> Value {
    if let Value::Object(obj) = &mut body {
        fold_aliases(obj, ALIASES);
        canonicalize_dates(obj, DATE_FIELDS);
    }
    body
}

/// Produces the response form of a project record
pub fn to_response_shape(project: &Project) -> Value {
    let value = serde_json::to_value(project).unwrap_or(Value::Null);
    shape_value(value)
}

/// Shapes an already-serialized project value
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
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Launch".to_string(),
            description: None,
            color: Some("#ff8800".to_string()),
            archived: false,
            links: json!([{"title": "runbook", "url": "https://example.com"}]),
            tags: json!({"urgent": "#cc0000"}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_response_mirrors_owner_id() {
        let project = sample_project();
        let shaped = to_response_shape(&project);

        assert_eq!(shaped["owner_id"], shaped["user_id"]);
        assert_eq!(shaped["owner_id"], json!(project.owner_id));
    }

    #[test]
    fn test_request_accepts_user_id_alias() {
        let body = from_request_shape(json!({
            "name": "Launch",
            "user_id": "0b8f6f1e-31a1-4f3a-9a53-222222222222",
        }));

        assert_eq!(
            body["owner_id"],
            json!("0b8f6f1e-31a1-4f3a-9a53-222222222222")
        );
        assert!(body.get("user_id").is_none());
    }

    #[test]
    fn test_null_links_become_empty_array() {
        let shaped = shape_value(json!({"name": "p", "links": null}));
        assert_eq!(shaped["links"], json!([]));
    }

    #[test]
    fn test_shape_is_idempotent() {
        let once = to_response_shape(&sample_project());
        let twice = shape_value(once.clone());

        assert_eq!(once, twice);
    }
}
