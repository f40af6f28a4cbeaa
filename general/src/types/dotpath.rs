use serde_json::{Map, Value};

use crate::errors::AccessError;

/// Separator between the keys of a dotted path
pub const SEPARATOR: char = '.';

/// Read the value at a dotted path (e.g. `a.b.c`)
///
/// Fails as soon as a segment is missing or a node along the way is not a
/// mapping.
pub fn get<'a>(map: &'a Map<String, Value>, path: &str) -> Result<&'a Value, AccessError> {
    let undefined = || AccessError::UndefinedPath(path.to_string());

    let mut keys = path.split(SEPARATOR);
    let first = keys.next().ok_or_else(undefined)?;
    let mut current = map.get(first).ok_or_else(undefined)?;

    for key in keys {
        current = current
            .as_object()
            .and_then(|node| node.get(key))
            .ok_or_else(undefined)?;
    }

    Ok(current)
}

/// Assign a value at a dotted path
///
/// Every mapping above the final key must already exist; intermediate mappings
/// are never created.
pub fn set(map: &mut Map<String, Value>, path: &str, value: Value) -> Result<(), AccessError> {
    let undefined = || AccessError::UndefinedPath(path.to_string());

    let keys: Vec<&str> = path.split(SEPARATOR).collect();
    let (last, parents) = keys.split_last().ok_or_else(undefined)?;

    let mut current = map;
    for key in parents {
        current = current
            .get_mut(*key)
            .and_then(Value::as_object_mut)
            .ok_or_else(undefined)?;
    }

    current.insert(last.to_string(), value);

    Ok(())
}
