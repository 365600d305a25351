//! Reflective type model: definitions, builders and the registry

mod class;
mod registry;

pub use class::{
    AccessorDefinition, ClassBuilder, ConstructorBody, ConstructorDefinition, DefKind,
    FieldDefinition, GetterBody, InterfaceBuilder, MethodBody, MethodDefinition,
    ParameterDefinition, PropertyDefinition, SetterBody, TypeDef, Visibility,
};
pub use registry::TypeRegistry;
