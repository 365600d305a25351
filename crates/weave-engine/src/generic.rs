//! Generic Parameter Rebinder
//!
//! A generic definition is synthesized once into a template that mirrors its
//! type parameters (same arity, names and order). Each distinct list of
//! concrete arguments the caller asks for closes the template into its own
//! runtime type by substituting the arguments into every signature.
//!
//! ```text
//! Container<T>  ──synthesize──▶  Weave.ContainerProxy<T>
//!                                   ├─ close [int]    ▶ Weave.ContainerProxy<int>
//!                                   └─ close [string] ▶ Weave.ContainerProxy<string>
//! ```

use weave_sdk::TypeRef;

use crate::error::{EngineError, EngineResult};
use crate::model::TypeDef;

/// Substitution of generic parameters by type arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericBinding {
    params: Vec<String>,
    args: Vec<TypeRef>,
}

impl GenericBinding {
    /// Binding for a non-generic definition
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind the definition's parameters to `args`, checking arity
    pub fn new(def: &TypeDef, args: &[TypeRef]) -> EngineResult<Self> {
        Self::for_params(&def.name, &def.generic_params, args)
    }

    /// Bind `params` to `args`, checking arity
    pub fn for_params(name: &str, params: &[String], args: &[TypeRef]) -> EngineResult<Self> {
        if params.len() != args.len() {
            return Err(EngineError::GenericArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                got: args.len(),
            });
        }
        Ok(Self {
            params: params.to_vec(),
            args: args.to_vec(),
        })
    }

    /// Bound arguments in parameter order
    pub fn args(&self) -> &[TypeRef] {
        &self.args
    }

    /// Argument bound to the parameter `name`
    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.params
            .iter()
            .position(|p| p == name)
            .map(|i| &self.args[i])
    }

    /// (parameter, argument) pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &TypeRef)> {
        self.params.iter().map(String::as_str).zip(&self.args)
    }

    /// Substitute the bound arguments into `ty`
    pub fn bind(&self, ty: &TypeRef) -> TypeRef {
        if self.params.is_empty() {
            return ty.clone();
        }
        ty.map_params(&|name: &str| self.lookup(name).cloned())
    }

    /// Substitute into a list of types
    pub fn bind_all<'a>(&self, types: impl IntoIterator<Item = &'a TypeRef>) -> Vec<TypeRef> {
        types.into_iter().map(|t| self.bind(t)).collect()
    }
}

/// Concrete type arguments of a closed request for `def`
///
/// Fails with `UnsupportedGenericDefinition` when the request is the open
/// definition itself (or still mentions generic parameters), and with
/// `GenericArityMismatch` when the argument count is wrong.
pub fn closed_args(def: &TypeDef, requested: &TypeRef) -> EngineResult<Vec<TypeRef>> {
    let args = requested.type_args();
    if requested.is_open() || (def.is_generic() && args.is_empty()) {
        return Err(EngineError::UnsupportedGenericDefinition(requested.clone()));
    }
    if args.len() != def.generic_params.len() {
        return Err(EngineError::GenericArityMismatch {
            name: def.name.clone(),
            expected: def.generic_params.len(),
            got: args.len(),
        });
    }
    Ok(args.to_vec())
}

/// Type parameters a template built from `def` declares
pub fn mirror_params(def: &TypeDef) -> Vec<String> {
    def.generic_params.clone()
}

/// Binding from the interface's parameters to the implementation's own
/// parameter space, as declared by `implementation`'s interface list.
///
/// For `class Repo<T> : IRepo<T>` this maps the interface's parameter to
/// `Param("T")` of `Repo`.
pub fn interface_binding(implementation: &TypeDef, interface: &TypeDef) -> Option<GenericBinding> {
    let declared = implementation.interface_named(&interface.name)?;
    GenericBinding::for_params(&interface.name, &interface.generic_params, declared.type_args()).ok()
}
