//! Engine error types.

use thiserror::Error;
use weave_sdk::{BoxError, TypeRef, ValueError};

/// Result type for synthesis and creation requests
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for calls on objects
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Errors raised while resolving, synthesizing or instantiating types
#[derive(Debug, Error)]
pub enum EngineError {
    /// No public constructor matches the runtime types of the arguments
    #[error("No constructor on {type_ref} matches argument types ({})", .arg_types.join(", "))]
    ConstructorNotFound {
        /// Type being constructed
        type_ref: TypeRef,
        /// Runtime types of the supplied arguments
        arg_types: Vec<String>,
    },

    /// An open generic definition was requested directly
    #[error("Cannot proxy open generic definition {0}; request a closed instantiation")]
    UnsupportedGenericDefinition(TypeRef),

    /// A designation names something that is not a registered hook type
    #[error("{hook} designated on {member} is not a hook type")]
    InvalidHookKind {
        /// Hook type name as designated
        hook: String,
        /// Designated member
        member: String,
    },

    /// A declarative mapping names a member the target does not have
    #[error("{type_name} has no public member {member}")]
    MemberNotFound {
        /// Target type name
        type_name: String,
        /// Missing member
        member: String,
    },

    /// A declarative mapping references an alias never registered
    #[error("No hook registered under alias {0}")]
    UnknownHookName(String),

    /// Two different hooks designated for the same member
    #[error("{member} is designated for both {first} and {second}")]
    AmbiguousDesignation {
        /// Member with conflicting designations
        member: String,
        /// First hook type
        first: String,
        /// Second hook type
        second: String,
    },

    /// A hook alias registered twice with different hook types
    #[error("Hook alias {alias} already maps to {existing}")]
    DuplicateHookAlias {
        /// Alias
        alias: String,
        /// Hook type it already maps to
        existing: String,
    },

    /// Type name not registered
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// Type name registered twice
    #[error("Type already registered: {0}")]
    DuplicateType(String),

    /// Wrong number of type arguments for a generic definition
    #[error("{name} expects {expected} type argument(s), got {got}")]
    GenericArityMismatch {
        /// Generic definition name
        name: String,
        /// Declared arity
        expected: usize,
        /// Supplied arity
        got: usize,
    },

    /// Subclass mode requires designated members to be overridable
    #[error("{member} on {type_name} is not virtual and cannot be intercepted by subclassing")]
    NotOverridable {
        /// Target type name
        type_name: String,
        /// Non-virtual member
        member: String,
    },

    /// Implementation does not implement the requested interface
    #[error("{implementation} does not implement {interface}")]
    InterfaceNotImplemented {
        /// Requested interface
        interface: TypeRef,
        /// Implementation type
        implementation: TypeRef,
    },

    /// Interface-mode request named a class as the interface
    #[error("{0} is not an interface")]
    NotAnInterface(TypeRef),

    /// Requested construction of an interface
    #[error("{0} is an interface and cannot be instantiated")]
    NotInstantiable(TypeRef),

    /// The original constructor body raised
    #[error("Constructor of {type_ref} failed: {source}")]
    Construction {
        /// Type being constructed
        type_ref: TypeRef,
        /// Error raised by the constructor body
        #[source]
        source: BoxError,
    },
}

/// Errors raised by calls on objects
#[derive(Debug, Error)]
pub enum InvokeError {
    /// No public member with that name
    #[error("{type_ref} has no member {member}")]
    MemberNotFound {
        /// Runtime type of the receiver
        type_ref: TypeRef,
        /// Member name
        member: String,
    },

    /// No overload accepts the argument types
    #[error("No overload of {member} on {type_ref} accepts ({})", .arg_types.join(", "))]
    NoMatchingOverload {
        /// Runtime type of the receiver
        type_ref: TypeRef,
        /// Method name
        member: String,
        /// Runtime types of the arguments
        arg_types: Vec<String>,
    },

    /// Property has no public getter
    #[error("Property {0} is not readable")]
    NotReadable(String),

    /// Property has no public setter
    #[error("Property {0} is not writable")]
    NotWritable(String),

    /// An argument (possibly rewritten by a hook) cannot be bound to its parameter
    #[error("Argument {index} of {member}: expected {expected}, got {got}")]
    ArgumentMismatch {
        /// Member name
        member: String,
        /// Parameter position
        index: usize,
        /// Declared parameter type
        expected: TypeRef,
        /// Runtime type of the argument
        got: String,
    },

    /// Wrong number of arguments after hook rewriting
    #[error("{member} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Member name
        member: String,
        /// Declared arity
        expected: usize,
        /// Supplied arity
        got: usize,
    },

    /// The final result cannot be unboxed as the declared return type
    #[error("{member} must return {expected}, got {got}")]
    ReturnMismatch {
        /// Member name
        member: String,
        /// Declared return type
        expected: TypeRef,
        /// Runtime type of the returned value
        got: String,
    },

    /// Result conversion failed in a typed call helper
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A hook or member body raised; carried unmodified
    #[error(transparent)]
    Raised(BoxError),
}
