//! Error types for the Weave SDK

use crate::types::TypeRef;

/// Error raised by hooks and member bodies.
///
/// The engine never inspects or wraps these beyond carrying them back to the
/// caller of the proxied member.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for value conversions
pub type ValueResult<T> = Result<T, ValueError>;

/// Value conversion and field access errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type
        expected: TypeRef,
        /// Runtime type of the value (`null` when absent)
        got: String,
    },

    /// Integer does not fit the requested width
    #[error("Integer {0} out of range for {1}")]
    OutOfRange(i64, &'static str),

    /// Field name not declared by the type
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Argument index past the end of the argument list
    #[error("Argument index {index} out of bounds (len {len})")]
    ArgumentIndex {
        /// Requested index
        index: usize,
        /// Number of arguments
        len: usize,
    },
}
