use rustc_hash::FxHashSet;

use crate::clone::deep_clone;
use crate::error::Error;
use crate::path::is_safe_key;
use crate::value::{Field, Record, Value};

/// Combines record-shaped sources left to right into one fresh record.
///
/// At a colliding key, an incoming record merges recursively into the
/// record already accumulated there (itself always a fresh record, never an
/// input); any other collision is won outright by the later value, passed
/// through [`deep_clone`] so the result never shares a mutable list or
/// record with any source. Lists replace, they never concatenate. The result
/// is a fresh record even for a single source.
///
/// A source that is not record-shaped is an [`Error::InvalidArgument`]; a
/// source key on the prototype denylist is an [`Error::UnsafeKey`].
pub fn merge(sources: &[Value]) -> Result<Value, Error> {
    tracing::trace!(sources = sources.len(), "merging records");
    let out = Record::new();
    let mut registry = MergeRegistry::default();
    for source in sources {
        let record = expect_record(source)?;
        merge_into(&out, record, &mut registry)?;
    }
    Ok(Value::Record(out))
}

/// Merge-adjacent fill: later sources only supply keys the earlier ones left
/// missing (or explicitly `Undefined`). Incoming values are cloned with
/// their field metadata, like `merge`, but earlier sources win.
pub fn defaults(sources: &[Value]) -> Result<Value, Error> {
    let out = Record::new();
    for source in sources {
        let record = expect_record(source)?;
        for (key, field) in record.entries() {
            if !is_safe_key(&key) {
                return Err(Error::UnsafeKey(key));
            }
            let missing = matches!(out.get(&key), None | Some(Value::Undefined));
            if missing {
                out.insert_field(
                    key,
                    Field {
                        value: deep_clone(&field.value),
                        meta: field.meta,
                    },
                );
            }
        }
    }
    Ok(Value::Record(out))
}

/// (output record, incoming source record) pairs already merged during this
/// call. Both identities are stable across the recursion: the output record
/// is filled in place and the source record comes straight from the caller's
/// graph. Re-entering a recorded pair while walking a cyclic source is
/// therefore a no-op instead of unbounded recursion.
#[derive(Default)]
struct MergeRegistry {
    merged: FxHashSet<(usize, usize)>,
}

fn expect_record(value: &Value) -> Result<&Record, Error> {
    match value {
        Value::Record(record) => Ok(record),
        other => Err(Error::InvalidArgument(format!(
            "merge source must be a record, got {:?}",
            other.shape()
        ))),
    }
}

fn merge_into(target: &Record, source: &Record, registry: &mut MergeRegistry) -> Result<(), Error> {
    if !registry.merged.insert((target.identity(), source.identity())) {
        return Ok(());
    }
    for (key, field) in source.entries() {
        if !is_safe_key(&key) {
            return Err(Error::UnsafeKey(key));
        }
        let value = match (target.get(&key), &field.value) {
            (Some(Value::Record(existing)), Value::Record(incoming)) => {
                merge_into(&existing, incoming, registry)?;
                Value::Record(existing)
            }
            _ => deep_clone(&field.value),
        };
        target.insert_field(key, Field { value, meta: field.meta });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equal::equals;
    use crate::value::List;

    fn record(entries: Vec<(&str, Value)>) -> Value {
        Value::Record(Record::from_entries(entries))
    }

    #[test]
    fn later_sources_win() {
        let merged = merge(&[
            record(vec![("a", Value::Int(1)), ("b", Value::Int(2))]),
            record(vec![("b", Value::Int(3)), ("c", Value::Int(4))]),
            record(vec![("a", Value::Int(5))]),
        ])
        .unwrap();
        let expected = record(vec![
            ("a", Value::Int(5)),
            ("b", Value::Int(3)),
            ("c", Value::Int(4)),
        ]);
        assert!(equals(&merged, &expected));
    }

    #[test]
    fn nested_records_merge_recursively() {
        let merged = merge(&[
            record(vec![(
                "inner",
                record(vec![("x", Value::Int(1)), ("y", Value::Int(2))]),
            )]),
            record(vec![("inner", record(vec![("y", Value::Int(9))]))]),
        ])
        .unwrap();
        let expected = record(vec![(
            "inner",
            record(vec![("x", Value::Int(1)), ("y", Value::Int(9))]),
        )]);
        assert!(equals(&merged, &expected));
    }

    #[test]
    fn lists_replace_rather_than_concatenate() {
        let merged = merge(&[
            record(vec![(
                "arr",
                Value::List(List::from_values([
                    Value::Int(1),
                    Value::Int(2),
                    Value::Int(3),
                ])),
            )]),
            record(vec![(
                "arr",
                Value::List(List::from_values([Value::Int(4), Value::Int(5)])),
            )]),
        ])
        .unwrap();
        let expected = record(vec![(
            "arr",
            Value::List(List::from_values([Value::Int(4), Value::Int(5)])),
        )]);
        assert!(equals(&merged, &expected));
    }

    #[test]
    fn output_never_aliases_sources() {
        let nested = Record::from_entries([("x", Value::Int(1))]);
        let source = record(vec![("nested", Value::Record(nested.clone()))]);
        let merged = merge(&[source]).unwrap();

        let Value::Record(merged) = merged else {
            panic!("merge must produce a record");
        };
        let Some(Value::Record(merged_nested)) = merged.get("nested") else {
            panic!("nested record missing from merge output");
        };
        assert_ne!(merged_nested.identity(), nested.identity());

        merged_nested.insert("x", Value::Int(42));
        assert!(matches!(nested.get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn single_source_still_produces_a_fresh_record() {
        let source = Record::from_entries([("a", Value::Int(1))]);
        let Value::Record(merged) = merge(&[Value::Record(source.clone())]).unwrap() else {
            panic!("merge must produce a record");
        };
        assert_ne!(merged.identity(), source.identity());
    }

    #[test]
    fn non_record_source_is_rejected() {
        let err = merge(&[Value::Int(1)]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = merge(&[record(vec![]), Value::List(List::new())]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn unsafe_source_keys_are_rejected() {
        let source = record(vec![("__proto__", Value::Int(1))]);
        let err = merge(&[source]).unwrap_err();
        assert_eq!(err, Error::UnsafeKey("__proto__".to_string()));
    }

    #[test]
    fn cyclic_sources_terminate() {
        let a = Record::new();
        a.insert("tag", Value::text("a"));
        a.insert("self", Value::Record(a.clone()));
        let b = Record::new();
        b.insert("tag", Value::text("b"));
        b.insert("self", Value::Record(b.clone()));

        let merged = merge(&[Value::Record(a), Value::Record(b)]).unwrap();
        let Value::Record(merged) = merged else {
            panic!("merge must produce a record");
        };
        assert!(matches!(merged.get("tag"), Some(Value::Text(t)) if t == "b"));

        // The merged cycle closes on the output, with both sources applied.
        let Some(Value::Record(inner)) = merged.get("self") else {
            panic!("self field missing from merge output");
        };
        assert!(matches!(inner.get("tag"), Some(Value::Text(t)) if t == "b"));
        let Some(looped) = inner.get("self") else {
            panic!("self field missing from merged cycle");
        };
        assert!(looped.same_reference(&Value::Record(inner)));
    }

    #[test]
    fn indirectly_cyclic_sources_terminate() {
        // Each source reaches itself through an intermediate record.
        let a = Record::new();
        a.insert(
            "child",
            Value::Record(Record::from_entries([("back", Value::Record(a.clone()))])),
        );
        let b = Record::new();
        b.insert(
            "child",
            Value::Record(Record::from_entries([("back", Value::Record(b.clone()))])),
        );

        let merged = merge(&[Value::Record(a), Value::Record(b)]).unwrap();
        let Value::Record(merged) = merged else {
            panic!("merge must produce a record");
        };
        assert!(merged.contains_key("child"));
    }

    #[test]
    fn defaults_fills_only_missing_keys() {
        let filled = defaults(&[
            record(vec![("a", Value::Int(1)), ("b", Value::Undefined)]),
            record(vec![("a", Value::Int(9)), ("b", Value::Int(2)), ("c", Value::Int(3))]),
        ])
        .unwrap();
        let expected = record(vec![
            ("a", Value::Int(1)),
            ("b", Value::Int(2)),
            ("c", Value::Int(3)),
        ]);
        assert!(equals(&filled, &expected));
    }
}
