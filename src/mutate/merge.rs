//! # Override Merge
//!
//! Deep merge where non-empty values from the desired side win and fields absent
//! from the desired side are left untouched. Lists are atomic: a non-empty desired
//! list replaces the existing one.
//!
//! "Empty" follows Go zero-value semantics (`null`, `false`, `0`, `""`, `[]`, `{}`),
//! so a desired zero never clears an existing value.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Merge `src` into `dst` with override semantics
pub fn merge_override(dst: &mut Value, src: &Value) {
    if is_empty(src) {
        return;
    }
    if let (Value::Object(dst_map), Value::Object(src_map)) = (&mut *dst, src) {
        for (key, value) in src_map {
            match dst_map.get_mut(key) {
                Some(existing) => merge_override(existing, value),
                None => {
                    if !is_empty(value) {
                        dst_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        return;
    }
    *dst = src.clone();
}

/// Override-merge two typed values through their JSON representation
pub fn merge_typed<T>(dst: &mut T, src: &T) -> Result<(), serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(&*dst)?;
    merge_override(&mut merged, &serde_json::to_value(src)?);
    *dst = serde_json::from_value(merged)?;
    Ok(())
}

/// Key-wise override merge of string maps (labels, annotations, selectors)
///
/// Keys present in `src` replace those in `dst`; keys only in `dst` stay.
pub fn merge_string_map(
    dst: &mut Option<BTreeMap<String, String>>,
    src: Option<&BTreeMap<String, String>>,
) {
    let Some(src) = src.filter(|m| !m.is_empty()) else {
        return;
    };
    let dst = dst.get_or_insert_with(BTreeMap::new);
    for (key, value) in src {
        dst.insert(key.clone(), value.clone());
    }
}
