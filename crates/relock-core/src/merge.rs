//! Order-preserving merge of a computed lockfile into the previous one.

use serde_json::{Map, Value};

/// Merge `computed` into `previous`.
///
/// The result has exactly the content of `computed`. Keys that also existed
/// in `previous` keep their previous position (recursively, for objects on
/// both sides); new keys are appended in `computed` order. Arrays and scalars
/// are replaced wholesale.
#[must_use]
pub fn merge(previous: Value, computed: Value) -> Value {
    match (previous, computed) {
        (Value::Object(previous), Value::Object(computed)) => {
            Value::Object(merge_objects(previous, computed))
        }
        (_, computed) => computed,
    }
}

fn merge_objects(mut previous: Map<String, Value>, computed: Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();

    // Reserve surviving keys in their previous order
    for key in previous.keys() {
        if computed.contains_key(key) {
            merged.insert(key.clone(), Value::Null);
        }
    }

    for (key, value) in computed {
        let value = match previous.remove(&key) {
            Some(old) => merge(old, value),
            None => value,
        };
        merged.insert(key, value);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_update_remove_append() {
        let merged = merge(json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4}));
        assert_eq!(merged, json!({"b": 3, "c": 4}));
        assert_eq!(keys(&merged), vec!["b", "c"]);
    }

    #[test]
    fn test_previous_order_wins() {
        let merged = merge(
            json!({"version": "1.0.0", "name": "app", "extra": true}),
            json!({"name": "app", "version": "2.0.0", "lockfileVersion": 1}),
        );
        assert_eq!(keys(&merged), vec!["version", "name", "lockfileVersion"]);
        assert_eq!(merged["version"], "2.0.0");
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let merged = merge(
            json!({"dependencies": {"z": {"version": "1", "integrity": "x"}, "a": {"version": "1"}}}),
            json!({"dependencies": {"a": {"version": "2"}, "z": {"integrity": "y", "version": "1"}}}),
        );
        assert_eq!(keys(&merged["dependencies"]), vec!["z", "a"]);
        assert_eq!(keys(&merged["dependencies"]["z"]), vec!["version", "integrity"]);
        assert_eq!(merged["dependencies"]["a"]["version"], "2");
    }

    #[test]
    fn test_arrays_and_scalars_replaced() {
        assert_eq!(merge(json!([1, 2]), json!([3])), json!([3]));
        assert_eq!(merge(json!({"a": 1}), json!("s")), json!("s"));
        assert_eq!(merge(json!(null), json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_empty_previous_emits_computed() {
        let computed = json!({"name": "app", "dependencies": {"a": {"version": "1"}}});
        assert_eq!(merge(json!({}), computed.clone()), computed);
    }
}
