//! Weave Engine
//!
//! Runtime interception engine: synthesizes proxy types whose designated
//! methods and property accessors are wrapped with `before`/`after` hooks.
//!
//! # Overview
//!
//! Target types are described once through [`ClassBuilder`] /
//! [`InterfaceBuilder`] and registered with an [`Engine`]. Members are
//! designated for interception either inline (`hooked`, `hooked_getter`,
//! `hooked_setter`) or out-of-band through a [`ProxyTypeBuilder`] table.
//!
//! ```text
//! Engine::create_proxy_of_*
//!   ├─ ProxyCache (miss) ─▶ Synthesizer ─▶ ProxyTemplate ─▶ close ─▶ RuntimeType
//!   │                                                        └─▶ TypeModule
//!   └─ Object::construct ─▶ Object
//!
//! Object::invoke ─▶ hook.before ─▶ original body ─▶ hook.after ─▶ caller
//! ```
//!
//! # Example
//!
//! ```ignore
//! let engine = Engine::new();
//! engine.register_hook(HookType::of::<Log>("Log"))?;
//! engine.register(
//!     ClassBuilder::new("Test")
//!         .interceptable()
//!         .method(
//!             MethodDefinition::new("sum")
//!                 .with_param("a", TypeRef::Int)
//!                 .with_param("b", TypeRef::Int)
//!                 .returns(TypeRef::Int)
//!                 .as_virtual()
//!                 .hooked("Log")
//!                 .body(|_, args| Ok(Value::Int(args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0)))),
//!         )
//!         .build(),
//! )?;
//!
//! let mut test = engine.create_proxy_of_class(&TypeRef::named("Test"), vec![])?;
//! let sum: i64 = test.call("sum", vec![1.into(), 1.into()])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod generic;
pub mod marker;
pub mod marshal;
pub mod model;
pub mod module;
pub mod object;
pub mod synth;

pub use cache::{ClosedKey, OnceMap, ProxyCache, TemplateKey};
pub use config::{ConfigError, EngineConfig, NamingConfig};
pub use error::{EngineError, EngineResult, InvokeError, InvokeResult};
pub use facade::Engine;
pub use generic::GenericBinding;
pub use marker::{
    DeclarativeTable, DesignationSource, DesignationTable, MethodRef, PropertyMode, PropertyRef,
    ProxyTypeBuilder,
};
pub use model::{
    ClassBuilder, ConstructorDefinition, FieldDefinition, InterfaceBuilder, MethodDefinition,
    PropertyDefinition, TypeDef, TypeRegistry, Visibility,
};
pub use module::{TemplateId, TypeId, TypeModule};
pub use object::{Object, This};
pub use synth::{GenerationMode, Origin, ProxyTemplate, Route, RuntimeType, SynthesisMode, Synthesizer};

pub use weave_sdk::{
    Accessor, BoxError, CallContext, FromValue, Hook, HookType, IntoValue, MethodDescriptor,
    PropertyDescriptor, TypeRef, Value,
};
