use crate::error::Error;
use crate::value::{Record, Value};

/// Key names that would let a write reach an object's prototype chain in the
/// original environment. Generic key-accepting operations reject them
/// outright rather than skipping them.
pub const UNSAFE_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

pub fn is_safe_key(key: &str) -> bool {
    !UNSAFE_KEYS.contains(&key)
}

/// Splits a dotted path into validated segments. An empty path or empty
/// segment is an `InvalidArgument`; a denylisted segment is an `UnsafeKey`.
pub fn parse_path(path: &str) -> Result<Vec<String>, Error> {
    if path.is_empty() {
        return Err(Error::InvalidArgument("empty path".to_string()));
    }
    let mut segments = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty segment in path {path:?}"
            )));
        }
        if !is_safe_key(segment) {
            return Err(Error::UnsafeKey(segment.to_string()));
        }
        segments.push(segment.to_string());
    }
    Ok(segments)
}

/// Reads the value at a dotted path. `Ok(None)` when any step is missing or
/// not a record; the path itself must still be valid.
pub fn get_path(root: &Value, path: &str) -> Result<Option<Value>, Error> {
    let segments = parse_path(path)?;
    let mut current = root.clone();
    for segment in &segments {
        let Value::Record(record) = current else {
            return Ok(None);
        };
        match record.get(segment) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Writes `value` at a dotted path, creating intermediate records along the
/// way. The root must be a record.
pub fn set_path(root: &Value, path: &str, value: Value) -> Result<(), Error> {
    tracing::trace!(path, "writing value at path");
    let segments = parse_path(path)?;
    let Some((last, front)) = segments.split_last() else {
        return Err(Error::InvalidArgument("empty path".to_string()));
    };
    let Value::Record(mut current) = root.clone() else {
        return Err(Error::InvalidArgument(format!(
            "path write target must be a record, got {:?}",
            root.shape()
        )));
    };
    for segment in front {
        current = match current.get(segment) {
            Some(Value::Record(next)) => next,
            _ => {
                let fresh = Record::new();
                current.insert(segment.clone(), Value::Record(fresh.clone()));
                fresh
            }
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}

/// Removes the value at a dotted path. Returns whether anything was removed.
pub fn unset_path(root: &Value, path: &str) -> Result<bool, Error> {
    tracing::trace!(path, "removing value at path");
    let segments = parse_path(path)?;
    let Some((last, front)) = segments.split_last() else {
        return Err(Error::InvalidArgument("empty path".to_string()));
    };
    let Value::Record(mut current) = root.clone() else {
        return Ok(false);
    };
    for segment in front {
        match current.get(segment) {
            Some(Value::Record(next)) => current = next,
            _ => return Ok(false),
        }
    }
    Ok(current.remove(last).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_is_rejected() {
        assert!(!is_safe_key("__proto__"));
        assert!(!is_safe_key("constructor"));
        assert!(!is_safe_key("prototype"));
        assert!(is_safe_key("proto"));
        assert!(is_safe_key("a"));
    }

    #[test]
    fn parse_path_validates_every_segment() {
        assert_eq!(
            parse_path("a.b.c").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(matches!(parse_path(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(parse_path("a..b"), Err(Error::InvalidArgument(_))));
        assert_eq!(
            parse_path("a.__proto__.b"),
            Err(Error::UnsafeKey("__proto__".to_string()))
        );
    }

    #[test]
    fn set_path_creates_intermediate_records() {
        let root = Value::Record(Record::new());
        set_path(&root, "a.b.c", Value::Int(7)).unwrap();
        assert!(matches!(
            get_path(&root, "a.b.c").unwrap(),
            Some(Value::Int(7))
        ));
        assert!(get_path(&root, "a.b.missing").unwrap().is_none());
    }

    #[test]
    fn set_path_rejects_non_record_root() {
        let err = set_path(&Value::Int(1), "a", Value::Int(2)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn unsafe_path_is_an_error_not_a_skip() {
        let root = Value::Record(Record::new());
        let err = set_path(&root, "constructor.prototype", Value::Int(1)).unwrap_err();
        assert_eq!(err, Error::UnsafeKey("constructor".to_string()));
        // Nothing was written along the way.
        let Value::Record(record) = &root else {
            unreachable!()
        };
        assert!(record.is_empty());
    }

    #[test]
    fn empty_paths_are_invalid_for_writes() {
        let root = Value::Record(Record::new());
        assert!(matches!(
            set_path(&root, "", Value::Int(1)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(unset_path(&root, ""), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn unset_path_reports_whether_it_removed() {
        let root = Value::Record(Record::from_entries([(
            "a",
            Value::Record(Record::from_entries([("b", Value::Int(1))])),
        )]));
        assert!(unset_path(&root, "a.b").unwrap());
        assert!(!unset_path(&root, "a.b").unwrap());
        assert!(!unset_path(&root, "x.y").unwrap());
    }
}
