use crate::cycle::CloneRegistry;
use crate::value::{Field, List, Record, Value};

/// Structural clone: an independent copy of the list/record graph reachable
/// from `value`.
///
/// Lists and records are duplicated recursively; holes stay holes and field
/// metadata is carried over. Every other shape is returned as the same
/// reference: primitives carry no identity, and sets, maps, temporals,
/// patterns and opaque values keep theirs on purpose (see the crate docs).
/// Aliases and cycles in the source are reproduced in the copy, pointing at
/// copied nodes.
pub fn deep_clone(value: &Value) -> Value {
    let mut registry = CloneRegistry::default();
    clone_within(value, &mut registry)
}

fn clone_within(value: &Value, registry: &mut CloneRegistry) -> Value {
    match value {
        Value::List(list) => {
            if let Some(done) = registry.get(list.identity()) {
                return done;
            }
            let out = List::new();
            // Registered before the children are produced, so a
            // self-reference resolves here instead of recursing.
            registry.register(list.identity(), Value::List(out.clone()));
            for slot in list.slots() {
                match slot {
                    Some(item) => out.push(clone_within(&item, registry)),
                    None => out.push_hole(),
                }
            }
            Value::List(out)
        }
        Value::Record(record) => {
            if let Some(done) = registry.get(record.identity()) {
                return done;
            }
            let out = Record::new();
            registry.register(record.identity(), Value::Record(out.clone()));
            for (key, field) in record.entries() {
                out.insert_field(
                    key,
                    Field {
                        value: clone_within(&field.value, registry),
                        meta: field.meta,
                    },
                );
            }
            Value::Record(out)
        }
        other => other.clone(),
    }
}
