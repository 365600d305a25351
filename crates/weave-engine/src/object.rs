//! Objects and member receivers
//!
//! An [`Object`] is an instance of a [`RuntimeType`]: the field storage of the
//! underlying original instance, one instance of each hook type the runtime
//! type references, and the context template every call context is derived
//! from. Member bodies never see the object itself, only a [`This`] receiver
//! over its fields and the type arguments it was closed over.

use std::fmt;
use std::sync::Arc;

use weave_sdk::{
    ContextTemplate, FromValue, Hook, HookType, TypeRef, Value, ValueError, ValueResult,
};

use crate::error::{EngineError, EngineResult, InvokeError, InvokeResult};
use crate::generic::GenericBinding;
use crate::marshal;
use crate::synth::{FieldLayout, Frame, RuntimeType};

// ============================================================================
// Receiver
// ============================================================================

/// Receiver handed to constructor, method and accessor bodies
pub struct This<'a> {
    fields: &'a mut [Value],
    layout: &'a FieldLayout,
    binding: &'a GenericBinding,
}

impl<'a> This<'a> {
    pub(crate) fn new(
        fields: &'a mut [Value],
        layout: &'a FieldLayout,
        binding: &'a GenericBinding,
    ) -> Self {
        Self {
            fields,
            layout,
            binding,
        }
    }

    fn slot(&self, name: &str) -> ValueResult<usize> {
        self.layout
            .index_of(name)
            .ok_or_else(|| ValueError::UnknownField(name.to_string()))
    }

    /// Current value of the field `name`
    pub fn field(&self, name: &str) -> ValueResult<&Value> {
        let slot = self.slot(name)?;
        Ok(&self.fields[slot])
    }

    /// Current value of the field `name`, converted
    pub fn field_as<T: FromValue>(&self, name: &str) -> ValueResult<T> {
        T::from_value(self.field(name)?)
    }

    /// Assign the field `name`; the value must match its declared type
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> ValueResult<()> {
        let slot = self.slot(name)?;
        let value = value.into();
        let ty = self.layout.type_at(slot);
        if !value.is_assignable_to(ty) {
            return Err(ValueError::TypeMismatch {
                expected: ty.clone(),
                got: value.type_name(),
            });
        }
        self.fields[slot] = value;
        Ok(())
    }

    /// Concrete type bound to the generic parameter `name`
    pub fn type_arg(&self, name: &str) -> Option<&TypeRef> {
        self.binding.lookup(name)
    }

    /// Concrete type arguments in parameter order
    pub fn type_args(&self) -> &[TypeRef] {
        self.binding.args()
    }
}

// ============================================================================
// Object
// ============================================================================

/// Instance of a runtime type
pub struct Object {
    ty: Arc<RuntimeType>,
    fields: Vec<Value>,
    hooks: Vec<Box<dyn Hook>>,
    context: ContextTemplate,
}

impl Object {
    /// Construct an instance of `ty` with the public constructor whose
    /// parameter types exactly match the runtime types of `args`
    pub(crate) fn construct(ty: &Arc<RuntimeType>, args: Vec<Value>) -> EngineResult<Self> {
        let ctor = marshal::select_overload(&ty.constructors, &args, |c| c.parameters.iter())
            .ok_or_else(|| EngineError::ConstructorNotFound {
                type_ref: ty.type_ref.clone(),
                arg_types: marshal::arg_type_names(&args),
            })?;

        let mut fields = ty.fields.initial_values();
        (ctor.body)(&mut This::new(&mut fields, &ty.fields, &ty.binding), &args).map_err(
            |source| EngineError::Construction {
                type_ref: ty.type_ref.clone(),
                source,
            },
        )?;

        let hooks = ty.hooks.iter().map(HookType::instantiate).collect();
        let context = ContextTemplate::new(ty.type_ref.clone(), args);

        Ok(Self {
            ty: Arc::clone(ty),
            fields,
            hooks,
            context,
        })
    }

    /// Runtime type
    pub fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    /// Runtime type reference
    pub fn type_ref(&self) -> &TypeRef {
        &self.ty.type_ref
    }

    /// Whether this object is an instance of a synthesized proxy
    pub fn is_proxy(&self) -> bool {
        self.ty.is_proxy()
    }

    /// Whether this object is an instance of `ty`, following the parent
    /// chain and implemented interfaces
    pub fn is_instance_of(&self, ty: &TypeRef) -> bool {
        self.ty.is_assignable_to(ty)
    }

    /// Arguments the object was constructed with
    pub fn constructor_args(&self) -> &[Value] {
        self.context.constructor_args()
    }

    /// Current value of a field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.ty.fields.index_of(name).map(|i| &self.fields[i])
    }

    /// Call the overload of `method` whose parameter types exactly match the
    /// runtime types of `args`
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> InvokeResult<Value> {
        let Object {
            ty,
            fields,
            hooks,
            context,
        } = self;
        let ty: &RuntimeType = ty;

        let mut overloads = ty.methods_named(method).peekable();
        if overloads.peek().is_none() {
            return Err(InvokeError::MemberNotFound {
                type_ref: ty.type_ref.clone(),
                member: method.to_string(),
            });
        }
        let slot = overloads
            .find(|slot| marshal::signature_matches(slot.param_types(), &args))
            .ok_or_else(|| InvokeError::NoMatchingOverload {
                type_ref: ty.type_ref.clone(),
                member: method.to_string(),
                arg_types: marshal::arg_type_names(&args),
            })?;

        Frame {
            ty,
            fields,
            hooks,
            context,
        }
        .call_method(slot, args)
    }

    /// [`invoke`](Self::invoke), converting the result
    pub fn call<T: FromValue>(&mut self, method: &str, args: Vec<Value>) -> InvokeResult<T> {
        let value = self.invoke(method, args)?;
        Ok(T::from_value(&value)?)
    }

    /// Read a property
    pub fn get(&mut self, property: &str) -> InvokeResult<Value> {
        let Object {
            ty,
            fields,
            hooks,
            context,
        } = self;
        let ty: &RuntimeType = ty;
        let slot = ty.property(property).ok_or_else(|| InvokeError::MemberNotFound {
            type_ref: ty.type_ref.clone(),
            member: property.to_string(),
        })?;

        Frame {
            ty,
            fields,
            hooks,
            context,
        }
        .get_property(slot)
    }

    /// Read a property, converting the value
    pub fn get_as<T: FromValue>(&mut self, property: &str) -> InvokeResult<T> {
        let value = self.get(property)?;
        Ok(T::from_value(&value)?)
    }

    /// Write a property
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> InvokeResult<()> {
        let Object {
            ty,
            fields,
            hooks,
            context,
        } = self;
        let ty: &RuntimeType = ty;
        let slot = ty.property(property).ok_or_else(|| InvokeError::MemberNotFound {
            type_ref: ty.type_ref.clone(),
            member: property.to_string(),
        })?;

        Frame {
            ty,
            fields,
            hooks,
            context,
        }
        .set_property(slot, value.into())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Object");
        s.field("type", &self.ty.type_ref);
        for (name, value) in self.ty.fields.names().iter().zip(&self.fields) {
            s.field(name, value);
        }
        s.finish()
    }
}
