//! Structural operations over dynamically shaped values.
//!
//! The crate centers on one open-ended [`Value`] type and four operations
//! that reason about it structurally:
//!
//! - [`equals`]: observational equality, independent of identity
//! - [`includes`]: membership by structural equality
//! - [`deep_clone`]: an independent copy of the list/record graph
//! - [`merge`]: left-to-right combination of record-shaped sources
//!
//! All four are pure, synchronous, and safe on self-referential data: a
//! per-call tracker keyed by composite identity makes cyclic graphs
//! terminate instead of overflowing the stack.
//!
//! # Known limits
//!
//! When equality re-enters a pair of composites it is already comparing, the
//! pair is assumed equal. This terminates every cyclic comparison but cannot
//! distinguish certain cyclic graphs that differ only past the point of
//! re-entry; full graph isomorphism is deliberately out of scope.
//!
//! Recursion is bounded by the nesting depth of the input, not its total
//! size. Acyclic values nested beyond a few tens of thousands of levels can
//! exhaust the call stack.

mod clone;
mod cycle;
mod equal;
mod error;
mod json;
mod merge;
mod path;
mod shape;
mod value;

pub use clone::deep_clone;
pub use equal::{equals, includes};
pub use error::Error;
pub use merge::{defaults, merge};
pub use path::{get_path, is_safe_key, parse_path, set_path, unset_path, UNSAFE_KEYS};
pub use shape::Shape;
pub use value::{Field, FieldMeta, FuncValue, List, Map, NativeFn, Pattern, Record, Set, Value};

pub mod interop {
    //! Lossy bridges to external representations.
    pub use crate::json::{from_json, to_json};
}
