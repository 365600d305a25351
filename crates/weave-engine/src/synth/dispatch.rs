//! The generic dispatcher
//!
//! Every intercepted slot goes through the same sequence:
//!
//! ```text
//! fresh CallContext ─▶ hook.before ─▶ read args back ─▶ original body
//!                                                           │
//!       caller ◀─ unbox as return type ◀─ hook.after ◀─ record result
//! ```
//!
//! Direct slots call the original body and only check the result.

use std::sync::Arc;

use tracing::trace;
use weave_sdk::{ContextTemplate, Hook, Value};

use crate::error::{InvokeError, InvokeResult};
use crate::marshal;
use crate::object::This;
use crate::synth::layout::{MethodSlot, PropertySlot, Route, RuntimeType};

/// Borrowed parts of an object for the duration of one call
pub(crate) struct Frame<'a> {
    pub ty: &'a RuntimeType,
    pub fields: &'a mut [Value],
    pub hooks: &'a [Box<dyn Hook>],
    pub context: &'a ContextTemplate,
}

impl<'a> Frame<'a> {
    fn this(&mut self) -> This<'_> {
        This::new(&mut *self.fields, &self.ty.fields, &self.ty.binding)
    }

    fn hook(&self, slot: usize) -> &'a dyn Hook {
        let hooks: &'a [Box<dyn Hook>] = self.hooks;
        hooks[slot].as_ref()
    }

    fn trace(&self, member: &str, accessor: &'static str) {
        if self.ty.trace_invocations {
            trace!(target_type = %self.ty.type_ref, member, accessor, "intercepted invocation");
        }
    }

    /// Call a method slot with arguments already matched to its signature
    pub fn call_method(&mut self, slot: &MethodSlot, args: Vec<Value>) -> InvokeResult<Value> {
        let desc = &slot.descriptor;
        let raw = match slot.route {
            Route::Direct => (slot.body)(&mut self.this(), &args).map_err(InvokeError::Raised)?,
            Route::Intercepted { hook } => {
                self.trace(&desc.name, "call");
                let hook = self.hook(hook);
                let mut ctx = self.context.method_call(Arc::clone(desc), args);
                hook.before(&mut ctx).map_err(InvokeError::Raised)?;

                let call_args = marshal::load_args(desc, ctx.args())?;
                let result = (slot.body)(&mut self.this(), &call_args).map_err(InvokeError::Raised)?;
                ctx.record_result(if desc.is_void() { Value::Null } else { result });

                hook.after(&mut ctx).map_err(InvokeError::Raised)?
            }
        };
        marshal::unbox_return(&desc.name, &desc.return_type, raw)
    }

    /// Read a property through its getter slot
    pub fn get_property(&mut self, slot: &PropertySlot) -> InvokeResult<Value> {
        let desc = &slot.descriptor;
        let getter = slot
            .getter
            .as_ref()
            .ok_or_else(|| InvokeError::NotReadable(desc.name.clone()))?;

        let value = match getter.route {
            Route::Direct => (getter.body)(&self.this()).map_err(InvokeError::Raised)?,
            Route::Intercepted { hook } => {
                self.trace(&desc.name, "get");
                let hook = self.hook(hook);
                let mut ctx = self.context.property_get(Arc::clone(desc));
                hook.before(&mut ctx).map_err(InvokeError::Raised)?;

                let read = (getter.body)(&self.this()).map_err(InvokeError::Raised)?;
                ctx.record_result(read.clone());
                ctx.set_property_value(read);

                hook.after(&mut ctx).map_err(InvokeError::Raised)?
            }
        };
        marshal::unbox_return(&desc.name, &desc.type_ref, value)
    }

    /// Write a property through its setter slot
    pub fn set_property(&mut self, slot: &PropertySlot, value: Value) -> InvokeResult<()> {
        let desc = &slot.descriptor;
        let setter = slot
            .setter
            .as_ref()
            .ok_or_else(|| InvokeError::NotWritable(desc.name.clone()))?;
        marshal::check_argument(&desc.name, 0, &desc.type_ref, &value)?;

        match setter.route {
            Route::Direct => (setter.body)(&mut self.this(), value).map_err(InvokeError::Raised),
            Route::Intercepted { hook } => {
                self.trace(&desc.name, "set");
                let hook = self.hook(hook);
                let mut ctx = self.context.property_set(Arc::clone(desc), value);
                hook.before(&mut ctx).map_err(InvokeError::Raised)?;

                let assigned = ctx.property_value().clone();
                marshal::check_argument(&desc.name, 0, &desc.type_ref, &assigned)?;
                (setter.body)(&mut self.this(), assigned).map_err(InvokeError::Raised)?;

                // setters have no result
                hook.after(&mut ctx).map_err(InvokeError::Raised)?;
                Ok(())
            }
        }
    }
}
