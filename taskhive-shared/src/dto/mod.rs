//! Boundary transforms between wire shapes and persisted records
//!
//! Every entity that crosses the HTTP boundary goes through a pair of pure
//! functions: `from_request_shape` folds inbound bodies onto canonical field
//! names, and `to_response_shape` produces the outbound form. Three concerns
//! are handled uniformly:
//!
//! - alias mapping: some fields are accepted and exposed under two names
//!   (e.g. `due_date`/`deadline`). The canonical name wins when a body
//!   carries both. Each entity declares its aliases as a static table.
//! - null safety: array-typed fields serialize as `[]`, never null.
//! - timestamps: date fields serialize as RFC 3339 strings whether the
//!   source value was a native timestamp or already a string.
//!
//! Both directions are idempotent, so re-shaping an already-shaped value is
//! harmless, and `from_request_shape(to_response_shape(x))` restores the
//! canonical form of `x`.

pub mod project;
pub mod task;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Canonical name, accepted/exposed alias
pub type AliasTable = &'static [(&'static str, &'static str)];

/// Folds alias spellings onto their canonical field
///
/// The canonical field wins when both spellings are present and non-null;
/// the alias key is always removed.
pub(crate) fn fold_aliases(obj: &mut Map<String, Value>, aliases: AliasTable) {
    for (canonical, alias) in aliases {
        if let Some(value) = obj.remove(*alias) {
            let canonical_missing = obj.get(*canonical).map_or(true, Value::is_null);
            if canonical_missing && !value.is_null() {
                obj.insert((*canonical).to_string(), value);
            }
        }
    }
}

/// Mirrors each canonical field onto its alias for responses
pub(crate) fn mirror_aliases(obj: &mut Map<String, Value>, aliases: AliasTable) {
    for (canonical, alias) in aliases {
        if let Some(value) = obj.get(*canonical) {
            obj.insert((*alias).to_string(), value.clone());
        }
    }
}

/// Replaces null or absent array fields with an empty array
pub(crate) fn fill_empty_arrays(obj: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        let needs_fill = obj.get(*field).map_or(true, Value::is_null);
        if needs_fill {
            obj.insert((*field).to_string(), Value::Array(Vec::new()));
        }
    }
}

/// Rewrites date fields into the canonical RFC 3339 form
///
/// String values are reparsed so `"2025-06-01"` and a full timestamp both
/// land in the same shape. Values that parse as neither are left alone for
/// validation to reject downstream.
pub(crate) fn canonicalize_dates(obj: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        if let Some(value) = obj.get_mut(*field) {
            if let Value::String(s) = value {
                if let Some(canonical) = canonical_timestamp(s) {
                    *value = Value::String(canonical);
                }
            }
        }
    }
}

fn canonical_timestamp(s: &str) -> Option<String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(
            ts.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        );
    }

    // Bare dates are taken as midnight UTC.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ts = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some(ts.to_rfc3339_opts(SecondsFormat::Micros, true));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_fold_aliases_canonical_wins() {
        let mut body = obj(json!({"due_date": "a", "deadline": "b"}));
        fold_aliases(&mut body, &[("due_date", "deadline")]);

        assert_eq!(body.get("due_date"), Some(&json!("a")));
        assert!(!body.contains_key("deadline"));
    }

    #[test]
    fn test_fold_aliases_alias_fills_gap() {
        let mut body = obj(json!({"deadline": "b"}));
        fold_aliases(&mut body, &[("due_date", "deadline")]);

        assert_eq!(body.get("due_date"), Some(&json!("b")));

        // Null canonical field also yields to the alias.
        let mut body = obj(json!({"due_date": null, "deadline": "b"}));
        fold_aliases(&mut body, &[("due_date", "deadline")]);
        assert_eq!(body.get("due_date"), Some(&json!("b")));
    }

    #[test]
    fn test_fill_empty_arrays() {
        let mut body = obj(json!({"tags": null, "links": ["x"]}));
        fill_empty_arrays(&mut body, &["tags", "links", "missing"]);

        assert_eq!(body.get("tags"), Some(&json!([])));
        assert_eq!(body.get("links"), Some(&json!(["x"])));
        assert_eq!(body.get("missing"), Some(&json!([])));
    }

    #[test]
    fn test_canonicalize_dates() {
        let mut body = obj(json!({
            "due_date": "2025-06-01",
            "created_at": "2025-06-01T12:30:00+02:00",
        }));
        canonicalize_dates(&mut body, &["due_date", "created_at"]);

        assert_eq!(
            body.get("due_date"),
            Some(&json!("2025-06-01T00:00:00.000000Z"))
        );
        assert_eq!(
            body.get("created_at"),
            Some(&json!("2025-06-01T10:30:00.000000Z"))
        );
    }

    #[test]
    fn test_canonicalize_dates_is_idempotent() {
        let mut body = obj(json!({"due_date": "2025-06-01T10:30:00.000000Z"}));
        let before = body.clone();
        canonicalize_dates(&mut body, &["due_date"]);

        assert_eq!(body, before);
    }

    #[test]
    fn test_unparseable_date_left_alone() {
        let mut body = obj(json!({"due_date": "next tuesday"}));
        canonicalize_dates(&mut body, &["due_date"]);

        assert_eq!(body.get("due_date"), Some(&json!("next tuesday")));
    }
}
