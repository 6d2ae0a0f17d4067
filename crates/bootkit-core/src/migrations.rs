use serde_json::{Map, Value};

/// Flat key for each `(section, field)` of the legacy nested manifest.
const LEGACY_KEYS: &[(&str, &str, &str)] = &[
    ("include", "prefixes", "includePrefixes"),
    ("include", "skills", "includeSkills"),
    ("exclude", "prefixes", "excludePrefixes"),
    ("exclude", "skills", "excludeSkills"),
];

/// Rewrite a legacy nested manifest into the flat shape.
///
/// `{"include": {"prefixes", "skills"}, "exclude": {...}}` becomes
/// `includePrefixes`, `includeSkills`, `excludePrefixes`, `excludeSkills`.
/// Entries already present under a flat key come first; legacy entries are
/// appended without duplicates. Returns the value and whether anything moved.
/// Non-object input is returned unchanged.
pub fn normalize_manifest(value: Value) -> (Value, bool) {
    let Value::Object(mut obj) = value else {
        return (value, false);
    };

    let mut migrated = false;
    for section in ["include", "exclude"] {
        let Some(nested) = obj.remove(section) else {
            continue;
        };
        migrated = true;
        let Value::Object(nested) = nested else {
            tracing::warn!("legacy manifest '{section}' is not an object, dropping it");
            continue;
        };
        for (_, field, flat) in LEGACY_KEYS.iter().filter(|(s, _, _)| *s == section) {
            if let Some(items) = nested.get(*field).and_then(Value::as_array) {
                merge_into(&mut obj, flat, items);
            }
        }
    }

    if migrated {
        tracing::debug!("normalized legacy manifest shape");
    }
    (Value::Object(obj), migrated)
}

fn merge_into(obj: &mut Map<String, Value>, key: &str, items: &[Value]) {
    let slot = obj
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    if let Value::Array(existing) = slot {
        for item in items {
            if item.is_string() && !existing.contains(item) {
                existing.push(item.clone());
            }
        }
    }
}
