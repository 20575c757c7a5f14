use crate::value::Value;

/// The structural category of a [`Value`]. Every value has exactly one shape;
/// the three algorithms dispatch on it rather than probing the value itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Null,
    Undefined,
    Bool,
    Int,
    Float,
    Text,
    Symbol,
    List,
    Record,
    Set,
    Map,
    DateTime,
    Pattern,
    Func,
    Opaque,
}

impl Shape {
    /// One of the two absence markers.
    pub fn is_nullish(self) -> bool {
        matches!(self, Shape::Null | Shape::Undefined)
    }

    /// Carries no identity: compared and copied by value.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Shape::Bool | Shape::Int | Shape::Float | Shape::Text | Shape::Symbol
        )
    }

    /// Can contain other values, including itself.
    pub fn is_composite(self) -> bool {
        matches!(self, Shape::List | Shape::Record | Shape::Set | Shape::Map)
    }
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Null => Shape::Null,
            Value::Undefined => Shape::Undefined,
            Value::Bool(_) => Shape::Bool,
            Value::Int(_) => Shape::Int,
            Value::Float(_) => Shape::Float,
            Value::Text(_) => Shape::Text,
            Value::Symbol(_) => Shape::Symbol,
            Value::List(_) => Shape::List,
            Value::Record(_) => Shape::Record,
            Value::Set(_) => Shape::Set,
            Value::Map(_) => Shape::Map,
            Value::DateTime(_) => Shape::DateTime,
            Value::Pattern(_) => Shape::Pattern,
            Value::Func(_) => Shape::Func,
            Value::Opaque(_) => Shape::Opaque,
        }
    }
}
