//! Weave SDK - Lightweight SDK for writing hooks and interceptable types
//!
//! This crate provides the minimal types and traits needed to write hooks
//! and member bodies without depending on the full weave-engine.
//!
//! # Example
//!
//! ```ignore
//! use weave_sdk::{BoxError, CallContext, Hook, Value};
//!
//! #[derive(Default)]
//! struct Log;
//!
//! impl Hook for Log {
//!     fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
//!         for arg in ctx.args_mut() {
//!             if let Value::Int(i) = arg {
//!                 *i += 1;
//!             }
//!         }
//!         Ok(())
//!     }
//!
//!     fn after(&self, ctx: &mut CallContext) -> Result<Value, BoxError> {
//!         Ok(Value::Int(ctx.result().as_int().unwrap_or(0) + 666))
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod context;
pub mod convert;
pub mod descriptor;
pub mod error;
pub mod hook;
pub mod types;
pub mod value;

pub use context::{CallContext, ContextTemplate, InvocationKind};
pub use convert::{FromValue, IntoValue};
pub use descriptor::{Accessor, MethodDescriptor, ParameterDescriptor, PropertyDescriptor};
pub use error::{BoxError, ValueError, ValueResult};
pub use hook::{Hook, HookFactory, HookType, NoopHook};
pub use types::TypeRef;
pub use value::{NativeBox, Value};
