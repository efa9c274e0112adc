// Dotted-path access into the structured model.
//
// Numeric segments index sequences, everything else indexes mapping keys.
// Paths are only meaningful against one model snapshot; a full
// re-serialization may invalidate them.

use serde_yaml::{Mapping, Value};

fn as_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

/// Reads the value at `path`, if every segment resolves.
pub fn get_nested<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Sequence(seq) => seq.get(as_index(segment)?)?,
            Value::Mapping(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at `path`, creating intermediate mappings or sequences
/// based on whether the next segment parses as an integer.
pub fn set_nested(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.is_empty() {
        return;
    }

    let mut current = root;
    for window in 0..segments.len() - 1 {
        let segment = segments[window];
        let next_is_index = as_index(segments[window + 1]).is_some();

        // A scalar in the middle of a path gets replaced by a container.
        if !matches!(current, Value::Sequence(_) | Value::Mapping(_)) {
            *current = if as_index(segment).is_some() {
                Value::Sequence(Vec::new())
            } else {
                Value::Mapping(Mapping::new())
            };
        }

        current = match current {
            Value::Sequence(seq) => {
                let idx = match as_index(segment) {
                    Some(idx) => idx,
                    None => return,
                };
                while seq.len() <= idx {
                    seq.push(Value::Null);
                }
                let slot = &mut seq[idx];
                ensure_container(slot, next_is_index);
                slot
            }
            Value::Mapping(map) => {
                let key = Value::String(segment.to_string());
                let slot = map.entry(key).or_insert(Value::Null);
                ensure_container(slot, next_is_index);
                slot
            }
            _ => return,
        };
    }

    let last = segments[segments.len() - 1];
    match current {
        Value::Sequence(seq) => {
            if let Some(idx) = as_index(last) {
                while seq.len() <= idx {
                    seq.push(Value::Null);
                }
                seq[idx] = value;
            }
        }
        Value::Mapping(map) => {
            map.insert(Value::String(last.to_string()), value);
        }
        other => {
            let mut map = Mapping::new();
            map.insert(Value::String(last.to_string()), value);
            *other = Value::Mapping(map);
        }
    }
}

fn ensure_container(slot: &mut Value, next_is_index: bool) {
    if next_is_index {
        if !matches!(slot, Value::Sequence(_)) {
            *slot = Value::Sequence(Vec::new());
        }
    } else if !matches!(slot, Value::Mapping(_)) {
        *slot = Value::Mapping(Mapping::new());
    }
}

/// Deletes the mapping key or splices the sequence element at `path`.
/// Missing paths are a no-op.
pub fn delete_nested(root: &mut Value, path: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.is_empty() {
        return;
    }

    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        current = match current {
            Value::Sequence(seq) => match as_index(segment).and_then(|idx| seq.get_mut(idx)) {
                Some(slot) => slot,
                None => return,
            },
            Value::Mapping(map) => match map.get_mut(*segment) {
                Some(slot) => slot,
                None => return,
            },
            _ => return,
        };
    }

    let last = segments[segments.len() - 1];
    match current {
        Value::Sequence(seq) => {
            if let Some(idx) = as_index(last) {
                if idx < seq.len() {
                    seq.remove(idx);
                }
            }
        }
        Value::Mapping(map) => {
            map.remove(last);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_set_top_level_scalar() {
        let mut model = parse("name: demo");
        set_nested(&mut model, "name", Value::String("other".into()));
        assert_eq!(get_nested(&model, "name"), Some(&Value::String("other".into())));
    }

    #[test]
    fn test_set_creates_intermediate_mapping() {
        let mut model = parse("name: demo");
        set_nested(&mut model, "resources.gpu", Value::String("24GB".into()));
        assert_eq!(
            get_nested(&model, "resources.gpu"),
            Some(&Value::String("24GB".into()))
        );
    }

    #[test]
    fn test_set_creates_intermediate_sequence() {
        let mut model = parse("name: demo");
        set_nested(&mut model, "env.0", Value::String("A=1".into()));
        let env = get_nested(&model, "env").unwrap();
        assert!(matches!(env, Value::Sequence(seq) if seq.len() == 1));
    }

    #[test]
    fn test_set_sequence_index() {
        let mut model = parse("env:\n  - A=1\n  - B=2");
        set_nested(&mut model, "env.1", Value::String("C=3".into()));
        assert_eq!(get_nested(&model, "env.1"), Some(&Value::String("C=3".into())));
    }

    #[test]
    fn test_delete_mapping_key() {
        let mut model = parse("name: demo\ntype: task");
        delete_nested(&mut model, "type");
        assert!(get_nested(&model, "type").is_none());
        assert!(get_nested(&model, "name").is_some());
    }

    #[test]
    fn test_delete_splices_sequence() {
        let mut model = parse("env:\n  - A=1\n  - B=2\n  - C=3");
        delete_nested(&mut model, "env.1");
        let env = get_nested(&model, "env").unwrap().as_sequence().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[1], Value::String("C=3".into()));
    }

    #[test]
    fn test_delete_missing_path_is_noop() {
        let mut model = parse("name: demo");
        delete_nested(&mut model, "resources.gpu");
        assert_eq!(model, parse("name: demo"));
    }
}
