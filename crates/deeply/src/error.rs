/// Error conditions raised by the structural operations.
///
/// Every condition is surfaced synchronously to the immediate caller; the
/// operations are deterministic and side-effect free, so nothing is retried
/// and nothing is silently corrected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A structural precondition was violated, e.g. `merge` was handed a
    /// source that is not record-shaped.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied key or path segment is on the prototype-chain
    /// denylist (see [`crate::is_safe_key`]).
    #[error("unsafe key: {0:?}")]
    UnsafeKey(String),
}
