use serde_json::Map;
use strata_types::{JsonObject, JsonValue};

/// Separator between key segments.
pub const PATH_SEPARATOR: char = '.';

/// Split a key path into its segments, keeping empty ones.
///
/// Always yields at least one segment.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).collect()
}

/// Return the value at `path`, or `None` if any segment is missing or an
/// intermediate value is not an object.
///
/// A key present with a JSON `null` yields `Some(&Value::Null)`.
pub fn get_at_path<'a>(obj: &'a JsonObject, path: &str) -> Option<&'a JsonValue> {
    let mut segments = path.split(PATH_SEPARATOR);
    let first = segments.next()?;
    let mut current = obj.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Tuple form of [`get_at_path`]: `(value, found)`.
///
/// When `found` is `false` the value is `null` and carries no meaning.
pub fn lookup(obj: &JsonObject, path: &str) -> (JsonValue, bool) {
    match get_at_path(obj, path) {
        Some(value) => (value.clone(), true),
        None => (JsonValue::Null, false),
    }
}

/// Return a copy of `obj` with `value` placed at `path`.
///
/// Missing intermediate objects are created. An intermediate that exists but
/// is not an object is replaced by a fresh object, discarding its old value.
///
/// This deep-clones all of `obj` up front, not just the path being edited.
/// Callers that own the object should use [`set_at_path_owned`], which edits
/// in place and moves untouched subtrees.
pub fn set_at_path(obj: &JsonObject, path: &str, value: JsonValue) -> JsonObject {
    set_at_path_owned(obj.clone(), path, value)
}

/// Consuming form of [`set_at_path`].
pub fn set_at_path_owned(mut obj: JsonObject, path: &str, value: JsonValue) -> JsonObject {
    set_in(&mut obj, &split_path(path), value);
    obj
}

fn set_in(obj: &mut JsonObject, segments: &[&str], value: JsonValue) {
    match segments {
        [] => {}
        [leaf] => {
            obj.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = obj
                .entry((*head).to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !child.is_object() {
                *child = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(map) = child {
                set_in(map, rest, value);
            }
        }
    }
}

/// Return a copy of `obj` with the leaf at `path` removed.
///
/// If the leaf or any intermediate is missing, or an intermediate is not an
/// object, the copy is returned unchanged. Intermediate objects are never
/// removed, even when the deletion leaves them empty.
///
/// Like [`set_at_path`] this clones the whole input; prefer
/// [`delete_at_path_owned`] when the object is owned.
pub fn delete_at_path(obj: &JsonObject, path: &str) -> JsonObject {
    delete_at_path_owned(obj.clone(), path)
}

/// Consuming form of [`delete_at_path`].
pub fn delete_at_path_owned(mut obj: JsonObject, path: &str) -> JsonObject {
    delete_in(&mut obj, &split_path(path));
    obj
}

fn delete_in(obj: &mut JsonObject, segments: &[&str]) {
    match segments {
        [] => {}
        [leaf] => {
            obj.remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(JsonValue::Object(child)) = obj.get_mut(*head) {
                delete_in(child, rest);
            }
        }
    }
}
