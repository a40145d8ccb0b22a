use serde_json::Value;

/// Drop nulls and empty arrays so unset CLI flags never mask lower layers
pub fn prune_empty(mut value: Value) -> Value {
    prune_recursive(&mut value);
    value
}

fn prune_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !is_empty(v));
            for (_, v) in map.iter_mut() {
                prune_recursive(v);
            }
            // Objects emptied by pruning go too
            map.retain(|_, v| !matches!(v, Value::Object(inner) if inner.is_empty()));
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                prune_recursive(item);
            }
        }
        _ => {}
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_removes_nulls_and_empty_arrays() {
        let pruned = prune_empty(json!({
            "workers": null,
            "bases": [],
            "crash_policy": "abort",
            "scenarios": { "glob": null, "root": "custom" },
            "report": { "formats": [] },
        }));

        assert_eq!(
            pruned,
            json!({ "crash_policy": "abort", "scenarios": { "root": "custom" } })
        );
    }

    #[test]
    fn test_keeps_falsy_scalars() {
        let pruned = prune_empty(json!({ "workers": 0, "environment": { "args": ["x"] } }));
        assert_eq!(pruned, json!({ "workers": 0, "environment": { "args": ["x"] } }));
    }
}
