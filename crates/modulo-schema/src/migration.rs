//! Back-compat normalization of loose JSON project shapes into the canonical
//! schema (§4.1). Operates on `serde_json::Value` before the strongly-typed
//! `Project` deserialization, mirroring the teacher's builder-style migration
//! in `rf-state::versions` — unknown fields become warnings, never errors.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Normalize a loosely-shaped project JSON value in place. Returns warnings
/// for anything that was migrated or dropped.
pub fn migrate(value: &mut Value) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(obj) = value.as_object_mut() else {
        warnings.push("project root is not an object; left unmodified".to_string());
        return warnings;
    };

    migrate_layout(obj, &mut warnings);
    migrate_zones_groups(obj, "zones", &mut warnings);
    migrate_zones_groups(obj, "groups", &mut warnings);
    strip_legacy_mask_aliases(obj, &mut warnings);
    remove_masks_shadowing_groups(obj, &mut warnings);
    migrate_layers(obj, &mut warnings);

    warnings
}

fn migrate_layout(obj: &mut Map<String, Value>, warnings: &mut Vec<String>) {
    let Some(layout) = obj.get_mut("layout").and_then(Value::as_object_mut) else {
        return;
    };

    // matrix_* -> canonical keys
    for (legacy, canonical) in [
        ("matrix_serpentine", "serpentine"),
        ("matrix_flip_x", "flip_x"),
        ("matrix_flip_y", "flip_y"),
        ("matrix_rotate", "rotate"),
    ] {
        if let Some(v) = layout.remove(legacy) {
            layout.entry(canonical).or_insert(v);
            warnings.push(format!("layout.{legacy} migrated to layout.{canonical}"));
        }
    }

    // infer Cells when width*height == count and kind is absent/ambiguous
    let has_kind = layout.contains_key("kind");
    let width = layout.get("width").and_then(Value::as_u64);
    let height = layout.get("height").and_then(Value::as_u64);
    let count = layout.get("count").and_then(Value::as_u64);
    if !has_kind {
        if let (Some(w), Some(h)) = (width, height) {
            if count == Some(w * h) || count.is_none() {
                layout.insert("kind".into(), Value::String("cells".into()));
                warnings.push("layout.kind inferred as cells from width*height".into());
            } else {
                layout.insert("kind".into(), Value::String("strip".into()));
                warnings.push("layout.kind inferred as strip".into());
            }
        } else {
            layout.insert("kind".into(), Value::String("strip".into()));
            warnings.push("layout.kind inferred as strip (no width/height)".into());
        }
    }
}

/// zones/groups historically stored as `[{name, start, end}]` or
/// `[{name, indices}]`; canonical shape is `{name: {...}}`.
fn migrate_zones_groups(obj: &mut Map<String, Value>, key: &str, warnings: &mut Vec<String>) {
    let Some(val) = obj.get(key) else { return };
    if let Value::Array(items) = val.clone() {
        let mut map = Map::new();
        for item in items {
            if let Value::Object(mut rec) = item {
                if let Some(Value::String(name)) = rec.remove("name") {
                    map.insert(name, Value::Object(rec));
                }
            }
        }
        warnings.push(format!("{key} migrated from list-of-records to name-keyed map"));
        obj.insert(key.to_string(), Value::Object(map));
    }
}

/// Legacy mask aliases persisted a disambiguating prefix (`zone:foo`,
/// `group:foo`) directly in the mask name; the canonical mask namespace is
/// disjoint from zones/groups, so these aliases are dropped on load.
fn strip_legacy_mask_aliases(obj: &mut Map<String, Value>, warnings: &mut Vec<String>) {
    let Some(Value::Object(masks)) = obj.get_mut("masks") else { return };
    let legacy: Vec<String> = masks.keys().filter(|k| k.contains(':')).cloned().collect();
    for k in legacy {
        masks.remove(&k);
        warnings.push(format!("dropped legacy mask alias '{k}' (contains ':')"));
    }
}

/// A mask entry whose indices exactly shadow a group's indices is redundant
/// and removed, preferring the group as the canonical source.
fn remove_masks_shadowing_groups(obj: &mut Map<String, Value>, warnings: &mut Vec<String>) {
    let groups_indices: Vec<Value> = match obj.get("groups") {
        Some(Value::Object(groups)) => groups
            .values()
            .filter_map(|g| g.get("indices").cloned())
            .collect(),
        _ => return,
    };
    let Some(Value::Object(masks)) = obj.get_mut("masks") else { return };
    let shadowing: Vec<String> = masks
        .iter()
        .filter(|(_, v)| {
            v.get("indices")
                .map(|ind| groups_indices.contains(ind))
                .unwrap_or(false)
        })
        .map(|(k, _)| k.clone())
        .collect();
    for k in shadowing {
        masks.remove(&k);
        warnings.push(format!("removed mask '{k}' shadowing an identical group"));
    }
}

fn migrate_layers(obj: &mut Map<String, Value>, warnings: &mut Vec<String>) {
    let Some(Value::Array(layers)) = obj.get_mut("layers") else { return };
    for layer in layers.iter_mut() {
        let Value::Object(layer) = layer else { continue };

        // ensure a stable uid
        if !layer.contains_key("uid") {
            layer.insert("uid".into(), Value::String(Uuid::new_v4().to_string()));
            warnings.push("assigned missing layer uid".into());
        }

        // legacy `effect` field mirrors into canonical `behavior`
        if !layer.contains_key("behavior") {
            if let Some(effect) = layer.get("effect").cloned() {
                layer.insert("behavior".into(), effect);
                warnings.push("layer.effect migrated to layer.behavior".into());
            }
        }
        if let Some(behavior) = layer.get("behavior").cloned() {
            layer.entry("effect").or_insert(behavior);
        }

        // back-compat: operators[0] mirrors the behavior key as a no-op sentinel
        let behavior = layer.get("behavior").and_then(Value::as_str).map(str::to_string);
        if a_is_empty(layer.get("operators")) {
            if let Some(behavior) = behavior {
                layer.insert(
                    "operators".into(),
                    Value::Array(vec![serde_json::json!({"kind": behavior, "__sentinel": true})]),
                );
            }
        }
    }
}

fn a_is_empty(v: Option<&Value>) -> bool {
    matches!(v, Some(Value::Array(a)) if a.is_empty()) || v.is_none()
}
