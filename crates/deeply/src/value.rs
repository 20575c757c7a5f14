use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};

use crate::equal::equals;
use crate::error::Error;

pub type NativeFn = dyn Fn(Vec<Value>) -> Value + Send + Sync;

/// A named callable carried opaquely inside a [`Value`]. Compared and cloned
/// by reference identity only.
pub struct FuncValue {
    pub name: String,
    pub arity: usize,
    pub func: Box<NativeFn>,
}

impl FuncValue {
    pub fn call(&self, args: Vec<Value>) -> Value {
        (self.func)(args)
    }
}

/// One dynamically typed value. Composites (`List`, `Record`, `Set`, `Map`)
/// are shared handles: cloning the `Value` clones the handle, not the data,
/// which is what makes cycles and aliases constructible in the first place.
#[derive(Clone)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Symbol(Arc<str>),
    List(List),
    Record(Record),
    Set(Set),
    Map(Map),
    DateTime(Arc<DateTime<Utc>>),
    Pattern(Arc<Pattern>),
    Func(Arc<FuncValue>),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn text(text: impl Into<String>) -> Value {
        Value::Text(text.into())
    }

    pub fn symbol(name: impl AsRef<str>) -> Value {
        Value::Symbol(Arc::from(name.as_ref()))
    }

    pub fn datetime(instant: DateTime<Utc>) -> Value {
        Value::DateTime(Arc::new(instant))
    }

    pub fn pattern(source: &str, flags: &str) -> Result<Value, Error> {
        Ok(Value::Pattern(Arc::new(Pattern::new(source, flags)?)))
    }

    pub fn func(
        name: impl Into<String>,
        arity: usize,
        func: impl Fn(Vec<Value>) -> Value + Send + Sync + 'static,
    ) -> Value {
        Value::Func(Arc::new(FuncValue {
            name: name.into(),
            arity,
            func: Box::new(func),
        }))
    }

    pub fn opaque<T: Any + Send + Sync>(payload: T) -> Value {
        Value::Opaque(Arc::new(payload))
    }

    /// True when both values are the same allocation: the same composite
    /// handle, or the same `Arc` behind an identity-bearing shape.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.identity() == b.identity(),
            (Value::Record(a), Value::Record(b)) => a.identity() == b.identity(),
            (Value::Set(a), Value::Set(b)) => a.identity() == b.identity(),
            (Value::Map(a), Value::Map(b)) => a.identity() == b.identity(),
            (Value::DateTime(a), Value::DateTime(b)) => Arc::ptr_eq(a, b),
            (Value::Pattern(a), Value::Pattern(b)) => Arc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }

    /// Stable identity of a composite, used to key the per-call trackers.
    /// Non-composites have no identity worth tracking.
    pub(crate) fn composite_identity(&self) -> Option<usize> {
        match self {
            Value::List(list) => Some(list.identity()),
            Value::Record(record) => Some(record.identity()),
            Value::Set(set) => Some(set.identity()),
            Value::Map(map) => Some(map.identity()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Value {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::Text(value)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Undefined => write!(f, "Undefined"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Value::Symbol(v) => f.debug_tuple("Symbol").field(v).finish(),
            // Composites print a summary only: their contents may contain the
            // composite itself, and Debug must terminate.
            Value::List(v) => write!(f, "List(<{} items>)", v.len()),
            Value::Record(v) => write!(f, "Record(<{} fields>)", v.len()),
            Value::Set(v) => write!(f, "Set(<{} members>)", v.len()),
            Value::Map(v) => write!(f, "Map(<{} entries>)", v.len()),
            Value::DateTime(v) => f.debug_tuple("DateTime").field(&v.to_rfc3339()).finish(),
            Value::Pattern(v) => f
                .debug_tuple("Pattern")
                .field(&v.source())
                .field(&v.flags())
                .finish(),
            Value::Func(v) => write!(f, "Func(<{}/{}>)", v.name, v.arity),
            Value::Opaque(_) => write!(f, "Opaque(<..>)"),
        }
    }
}

/// An ordered, index-addressed sequence. A `None` slot is a hole: the index
/// exists positionally but carries no value, and clones must keep it absent.
#[derive(Clone, Default)]
pub struct List {
    items: Arc<RwLock<Vec<Option<Value>>>>,
}

impl List {
    pub fn new() -> List {
        List::default()
    }

    pub fn from_values<I>(values: I) -> List
    where
        I: IntoIterator<Item = Value>,
    {
        List {
            items: Arc::new(RwLock::new(values.into_iter().map(Some).collect())),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Reads an index the way subscripting would: a hole reads as
    /// `Undefined`, an index past the end reads as nothing at all.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items
            .read()
            .get(index)
            .map(|slot| slot.clone().unwrap_or(Value::Undefined))
    }

    /// True when the index is in range and is not a hole.
    pub fn has_index(&self, index: usize) -> bool {
        matches!(self.items.read().get(index), Some(Some(_)))
    }

    pub fn push(&self, value: Value) {
        self.items.write().push(Some(value));
    }

    pub fn push_hole(&self) {
        self.items.write().push(None);
    }

    /// Writes an index, growing the list with holes when the index is past
    /// the current end.
    pub fn set(&self, index: usize, value: Value) {
        let mut items = self.items.write();
        if index >= items.len() {
            items.resize(index + 1, None);
        }
        items[index] = Some(value);
    }

    /// Snapshot of every slot, holes included. Algorithms iterate snapshots
    /// rather than holding the lock across recursion.
    pub(crate) fn slots(&self) -> Vec<Option<Value>> {
        self.items.read().clone()
    }

    /// Snapshot of every element with holes read as `Undefined`.
    pub fn values(&self) -> Vec<Value> {
        self.items
            .read()
            .iter()
            .map(|slot| slot.clone().unwrap_or(Value::Undefined))
            .collect()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.items) as *const () as usize
    }
}

/// Per-field metadata, standing in for property descriptors: whether the
/// field shows up in enumeration-driven consumers (JSON encoding) and
/// whether writes through generic helpers should touch it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    pub enumerable: bool,
    pub writable: bool,
}

impl Default for FieldMeta {
    fn default() -> FieldMeta {
        FieldMeta {
            enumerable: true,
            writable: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub value: Value,
    pub meta: FieldMeta,
}

impl Field {
    pub fn plain(value: Value) -> Field {
        Field {
            value,
            meta: FieldMeta::default(),
        }
    }
}

/// An unordered mapping from text keys to values, own keys only.
#[derive(Clone, Default)]
pub struct Record {
    fields: Arc<RwLock<HashMap<String, Field>>>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn from_entries<K, I>(entries: I) -> Record
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let fields = entries
            .into_iter()
            .map(|(key, value)| (key.into(), Field::plain(value)))
            .collect();
        Record {
            fields: Arc::new(RwLock::new(fields)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.fields.read().get(key).map(|field| field.value.clone())
    }

    pub fn field(&self, key: &str) -> Option<Field> {
        self.fields.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.read().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.insert_field(key.into(), Field::plain(value));
    }

    pub fn insert_field(&self, key: String, field: Field) {
        self.fields.write().insert(key, field);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.fields.write().remove(key).map(|field| field.value)
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    /// Snapshot of every own field.
    pub fn entries(&self) -> Vec<(String, Field)> {
        self.fields
            .read()
            .iter()
            .map(|(key, field)| (key.clone(), field.clone()))
            .collect()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.fields) as *const () as usize
    }
}

/// An unordered collection of structurally distinct values. Membership is
/// decided by structural equality, not identity, so inserts deduplicate
/// against every current member.
#[derive(Clone, Default)]
pub struct Set {
    members: Arc<RwLock<Vec<Value>>>,
}

impl Set {
    pub fn new() -> Set {
        Set::default()
    }

    pub fn from_values<I>(values: I) -> Set
    where
        I: IntoIterator<Item = Value>,
    {
        let set = Set::new();
        for value in values {
            set.insert(value);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        // Compare against a snapshot: equality may re-enter this set when it
        // is a member of itself, and the lock must not be held across that.
        self.values().iter().any(|member| equals(member, value))
    }

    /// Inserts unless a structurally equal member already exists. Returns
    /// whether the set grew.
    pub fn insert(&self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }
        self.members.write().push(value);
        true
    }

    pub fn remove(&self, value: &Value) -> bool {
        let index = self
            .values()
            .iter()
            .position(|member| equals(member, value));
        match index {
            Some(index) => {
                self.members.write().remove(index);
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> Vec<Value> {
        self.members.read().clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.members) as *const () as usize
    }
}

/// An unordered collection of key/value pairs whose keys are themselves
/// values, looked up structurally rather than by identity.
#[derive(Clone, Default)]
pub struct Map {
    entries: Arc<RwLock<Vec<(Value, Value)>>>,
}

impl Map {
    pub fn new() -> Map {
        Map::default()
    }

    pub fn from_entries<I>(entries: I) -> Map
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let map = Map::new();
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries()
            .iter()
            .find(|(candidate, _)| equals(candidate, key))
            .map(|(_, value)| value.clone())
    }

    /// Inserts a pair, replacing the value of a structurally equal key.
    pub fn insert(&self, key: Value, value: Value) {
        let index = self
            .entries()
            .iter()
            .position(|(candidate, _)| equals(candidate, &key));
        let mut entries = self.entries.write();
        match index {
            Some(index) => entries[index] = (key, value),
            None => entries.push((key, value)),
        }
    }

    pub fn remove(&self, key: &Value) -> Option<Value> {
        let index = self
            .entries()
            .iter()
            .position(|(candidate, _)| equals(candidate, key));
        index.map(|index| self.entries.write().remove(index).1)
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.read().clone()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.entries) as *const () as usize
    }
}

/// A compiled text pattern: the source and flags it was written with are the
/// data, the compiled regex is the behavior.
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` with the given flag characters (`i`, `m`, `s`, `x`).
    /// An unknown flag or an invalid pattern is an `InvalidArgument`.
    pub fn new(source: &str, flags: &str) -> Result<Pattern, Error> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                other => {
                    return Err(Error::InvalidArgument(format!(
                        "unknown pattern flag: {other:?}"
                    )));
                }
            }
        }
        let regex = builder
            .build()
            .map_err(|err| Error::InvalidArgument(format!("invalid pattern: {err}")))?;
        Ok(Pattern {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern(/{}/{})", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_set_past_end_leaves_holes() {
        let list = List::new();
        list.push(Value::Int(1));
        list.set(3, Value::Int(4));
        assert_eq!(list.len(), 4);
        assert!(list.has_index(0));
        assert!(!list.has_index(1));
        assert!(!list.has_index(2));
        assert!(list.has_index(3));
        assert!(matches!(list.get(1), Some(Value::Undefined)));
        assert!(list.get(4).is_none());
    }

    #[test]
    fn set_deduplicates_structurally() {
        let set = Set::new();
        assert!(set.insert(Value::Record(Record::from_entries([("a", Value::Int(1))]))));
        assert!(!set.insert(Value::Record(Record::from_entries([("a", Value::Int(1))]))));
        assert!(set.insert(Value::Record(Record::from_entries([("a", Value::Int(2))]))));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_can_contain_itself() {
        let set = Set::new();
        set.insert(Value::Int(1));
        set.insert(Value::Set(set.clone()));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Value::Set(set.clone())));
    }

    #[test]
    fn map_looks_up_keys_structurally() {
        let map = Map::new();
        let key = Value::List(List::from_values([Value::Int(1), Value::Int(2)]));
        map.insert(key, Value::text("first"));

        let same_shape = Value::List(List::from_values([Value::Int(1), Value::Int(2)]));
        assert!(matches!(map.get(&same_shape), Some(Value::Text(t)) if t == "first"));

        map.insert(same_shape, Value::text("second"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn pattern_rejects_unknown_flags() {
        assert!(Pattern::new("a+", "i").is_ok());
        assert!(matches!(
            Pattern::new("a+", "z"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Pattern::new("(", ""),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn same_reference_tracks_handles_not_contents() {
        let list = List::from_values([Value::Int(1)]);
        let alias = Value::List(list.clone());
        assert!(Value::List(list).same_reference(&alias));

        let a = Value::List(List::from_values([Value::Int(1)]));
        let b = Value::List(List::from_values([Value::Int(1)]));
        assert!(!a.same_reference(&b));
    }
}
