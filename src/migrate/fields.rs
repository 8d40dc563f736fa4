//! Lenient accessors over untyped JSON objects.
//!
//! Nothing here fails: a field of the wrong shape reads as absent.

use serde_json::{Map, Value};

use crate::ids::IdGenerator;

pub(crate) type Object = Map<String, Value>;

/// An empty object used when the input is not an object at all.
pub(crate) fn empty_object() -> &'static Object {
    static EMPTY: std::sync::OnceLock<Object> = std::sync::OnceLock::new();
    EMPTY.get_or_init(Map::new)
}

/// View a value as an object, treating anything else as `{}`.
pub(crate) fn as_object(value: &Value) -> &Object {
    value.as_object().unwrap_or_else(|| empty_object())
}

/// `true` when the key is absent or explicitly `null`.
pub(crate) fn is_missing(obj: &Object, key: &str) -> bool {
    matches!(obj.get(key), None | Some(Value::Null))
}

/// String value of a field, `""` for anything that is not a string.
pub(crate) fn text(obj: &Object, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// String value of a field when it is a non-empty string.
pub(crate) fn non_empty_text<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Keep a non-empty string id, otherwise mint one.
pub(crate) fn id_or_new(obj: &Object, key: &str, ids: &dyn IdGenerator) -> String {
    match non_empty_text(obj, key) {
        Some(id) => id.to_string(),
        None => ids.next_id(),
    }
}

/// The field as an array, when it is one.
pub(crate) fn list<'a>(obj: &'a Object, key: &str) -> Option<&'a Vec<Value>> {
    obj.get(key).and_then(Value::as_array)
}

/// String elements of an array field; non-string elements are skipped.
pub(crate) fn string_list(obj: &Object, key: &str) -> Vec<String> {
    list(obj, key)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Boolean field, `false` for anything else.
pub(crate) fn flag(obj: &Object, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Copy every key not in `known` into a fresh map.
pub(crate) fn unknown_keys(obj: &Object, known: &[&str]) -> Object {
    obj.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use serde_json::json;

    #[test]
    fn test_missing_vs_empty() {
        let value = json!({"a": null, "b": [], "c": ""});
        let obj = as_object(&value);
        assert!(is_missing(obj, "a"));
        assert!(!is_missing(obj, "b"));
        assert!(!is_missing(obj, "c"));
        assert!(is_missing(obj, "d"));
    }

    #[test]
    fn test_text_degrades_to_empty() {
        let value = json!({"age": 25, "name": "Rin"});
        let obj = as_object(&value);
        assert_eq!(text(obj, "age"), "");
        assert_eq!(text(obj, "name"), "Rin");
    }

    #[test]
    fn test_id_or_new_only_replaces_falsy() {
        let ids = SequentialIds::new("x");
        let value = json!({"id": "keep", "blank": ""});
        let obj = as_object(&value);
        assert_eq!(id_or_new(obj, "id", &ids), "keep");
        assert_eq!(id_or_new(obj, "blank", &ids), "x-1");
        assert_eq!(id_or_new(obj, "absent", &ids), "x-2");
    }

    #[test]
    fn test_non_object_reads_as_empty() {
        let value = json!(["not", "an", "object"]);
        assert!(as_object(&value).is_empty());
    }
}
