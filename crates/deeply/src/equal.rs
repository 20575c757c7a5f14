use rustc_hash::FxHashSet;

use crate::cycle::ActivePairs;
use crate::value::{List, Map, Record, Set, Value};

/// Structural equality: whether two values are observably the same data,
/// independent of identity.
///
/// Total and terminating for any pair of values, cyclic ones included. When
/// the traversal re-enters a pair of composites it is already comparing, the
/// pair is assumed equal; see the crate docs for what that approximation
/// gives up.
pub fn equals(left: &Value, right: &Value) -> bool {
    let mut active = ActivePairs::default();
    equals_within(left, right, &mut active)
}

/// True when some element of `container` is structurally equal to `target`.
/// Stops at the first match; holes read as `Undefined`.
pub fn includes(container: &List, target: &Value) -> bool {
    container.values().iter().any(|item| equals(item, target))
}

pub(crate) fn equals_within(left: &Value, right: &Value, active: &mut ActivePairs) -> bool {
    if left.same_reference(right) {
        return true;
    }
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Undefined, Value::Undefined) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => float_equal(*a, *b),
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => **a == **b,
        (Value::Pattern(a), Value::Pattern(b)) => {
            a.source() == b.source() && a.flags() == b.flags()
        }
        (Value::List(a), Value::List(b)) => {
            guarded(a.identity(), b.identity(), active, |active| {
                lists_equal(a, b, active)
            })
        }
        (Value::Record(a), Value::Record(b)) => {
            guarded(a.identity(), b.identity(), active, |active| {
                records_equal(a, b, active)
            })
        }
        (Value::Set(a), Value::Set(b)) => {
            guarded(a.identity(), b.identity(), active, |active| {
                sets_equal(a, b, active)
            })
        }
        (Value::Map(a), Value::Map(b)) => {
            guarded(a.identity(), b.identity(), active, |active| {
                maps_equal(a, b, active)
            })
        }
        // Func and Opaque compare by reference only, which the identity
        // check above already settled. Everything else is a shape mismatch.
        _ => false,
    }
}

/// NaN is equal to itself; negative zero is equal to zero.
fn float_equal(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn guarded(
    left: usize,
    right: usize,
    active: &mut ActivePairs,
    compare: impl FnOnce(&mut ActivePairs) -> bool,
) -> bool {
    if !active.begin(left, right) {
        // The traversal came back around to a pair it is still comparing:
        // assume equal so the recursion terminates.
        return true;
    }
    let result = compare(active);
    active.finish(left, right);
    result
}

fn lists_equal(a: &List, b: &List, active: &mut ActivePairs) -> bool {
    let left = a.slots();
    let right = b.slots();
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(right.iter()).all(|(x, y)| {
        let x = x.as_ref().unwrap_or(&Value::Undefined);
        let y = y.as_ref().unwrap_or(&Value::Undefined);
        equals_within(x, y, active)
    })
}

fn records_equal(a: &Record, b: &Record, active: &mut ActivePairs) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.entries().iter().all(|(key, field)| {
        b.get(key)
            .is_some_and(|other| equals_within(&field.value, &other, active))
    })
}

fn sets_equal(a: &Set, b: &Set, active: &mut ActivePairs) -> bool {
    let left = a.values();
    let right = b.values();
    if left.len() != right.len() {
        return false;
    }
    if let (Some(left_keys), Some(right_keys)) =
        (primitive_key_set(&left), primitive_key_set(&right))
    {
        return left_keys == right_keys;
    }
    unordered_match(&left, &right, active, |x, y, active| {
        equals_within(x, y, active)
    })
}

fn maps_equal(a: &Map, b: &Map, active: &mut ActivePairs) -> bool {
    let left = a.entries();
    let right = b.entries();
    if left.len() != right.len() {
        return false;
    }
    unordered_match(&left, &right, active, |x, y, active| {
        equals_within(&x.0, &y.0, active) && equals_within(&x.1, &y.1, active)
    })
}

/// Unordered multiset comparison: every left element must claim a distinct
/// right counterpart, each counterpart consumed at most once.
fn unordered_match<T>(
    left: &[T],
    right: &[T],
    active: &mut ActivePairs,
    matches: impl Fn(&T, &T, &mut ActivePairs) -> bool,
) -> bool {
    let mut used = vec![false; right.len()];
    'outer: for item in left {
        for (index, candidate) in right.iter().enumerate() {
            if !used[index] && matches(item, candidate, active) {
                used[index] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// A hashable projection of a primitive value, enabling the fast path for
/// sets whose members are all primitive.
#[derive(PartialEq, Eq, Hash)]
enum PrimitiveKey {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Symbol(String),
}

impl PrimitiveKey {
    fn try_from_value(value: &Value) -> Option<PrimitiveKey> {
        match value {
            Value::Null => Some(PrimitiveKey::Null),
            Value::Undefined => Some(PrimitiveKey::Undefined),
            Value::Bool(value) => Some(PrimitiveKey::Bool(*value)),
            Value::Int(value) => Some(PrimitiveKey::Int(*value)),
            Value::Float(value) => Some(PrimitiveKey::Float(float_key_bits(*value))),
            Value::Text(value) => Some(PrimitiveKey::Text(value.clone())),
            Value::Symbol(value) => Some(PrimitiveKey::Symbol(value.to_string())),
            _ => None,
        }
    }
}

/// Bit pattern with the equality quirks folded in: every NaN hashes alike,
/// and negative zero hashes as zero.
fn float_key_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

fn primitive_key_set(values: &[Value]) -> Option<FxHashSet<PrimitiveKey>> {
    values.iter().map(PrimitiveKey::try_from_value).collect()
}
