use serde_json::Value;

/// Walk a dotted path (`"enforcement.strict_mode"`) through a JSON value.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for segment in path.split('.') {
        cur = cur.as_object()?.get(segment)?;
    }
    Some(cur)
}

/// Set a value at a dotted path, creating intermediate objects as needed.
/// Overwrites a non-object value encountered along the path.
pub fn set(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut cur = root;
    for (i, segment) in segments.iter().enumerate() {
        if !cur.is_object() {
            *cur = Value::Object(serde_json::Map::new());
        }
        let map = cur.as_object_mut().expect("just ensured object");
        if i == segments.len() - 1 {
            map.insert((*segment).to_owned(), value);
            return;
        }
        cur = map
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
}

/// Deep-merge `overlay` onto `base` — objects merge key-by-key recursively,
/// any other value type in `overlay` replaces the corresponding `base`
/// value outright. The overlay always wins on conflicts.
pub fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_val) => merge(base_val, overlay_val),
                    None => {
                        base_map.insert(key.clone(), overlay_val.clone());
                    }
                }
            }
        }
        (base_slot, overlay_val) => {
            *base_slot = overlay_val.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_nested_path() {
        let v = json!({"a": {"b": {"c": 42}}});
        assert_eq!(get(&v, "a.b.c"), Some(&json!(42)));
        assert_eq!(get(&v, "a.b.missing"), None);
        assert_eq!(get(&v, "x"), None);
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut v = json!({});
        set(&mut v, "a.b.c", json!(1));
        assert_eq!(get(&v, "a.b.c"), Some(&json!(1)));
    }

    #[test]
    fn merge_deep_later_wins() {
        let mut base = json!({"a": {"x": 1, "y": 2}, "z": 3});
        let overlay = json!({"a": {"y": 20, "w": 30}});
        merge(&mut base, &overlay);
        assert_eq!(base, json!({"a": {"x": 1, "y": 20, "w": 30}, "z": 3}));
    }

    #[test]
    fn merge_scalar_overlay_replaces_object() {
        let mut base = json!({"a": {"x": 1}});
        let overlay = json!({"a": "flat"});
        merge(&mut base, &overlay);
        assert_eq!(base, json!({"a": "flat"}));
    }
}
