//! CallContext: the record passed through both hook phases
//!
//! A proxy instance records its constructor-time information once in a
//! `ContextTemplate`; every intercepted invocation derives a fresh
//! `CallContext` from it. Hooks may rewrite the argument list (method calls)
//! or the property value (setters) in `before`; the engine reads them back
//! before running the original member.

use std::sync::Arc;

use crate::descriptor::{Accessor, MethodDescriptor, PropertyDescriptor};
use crate::error::{ValueError, ValueResult};
use crate::types::TypeRef;
use crate::value::Value;

/// What kind of member an invocation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    /// Method call
    Method,
    /// Property get or set
    Property(Accessor),
}

/// Per-instance template from which call contexts are derived
#[derive(Debug, Clone)]
pub struct ContextTemplate {
    target_type: TypeRef,
    constructor_args: Arc<[Value]>,
}

impl ContextTemplate {
    /// Record the proxy's runtime type and the arguments it was built with
    pub fn new(target_type: TypeRef, constructor_args: Vec<Value>) -> Self {
        Self {
            target_type,
            constructor_args: constructor_args.into(),
        }
    }

    /// Runtime type recorded for the instance
    pub fn target_type(&self) -> &TypeRef {
        &self.target_type
    }

    /// Constructor arguments recorded for the instance
    pub fn constructor_args(&self) -> &[Value] {
        &self.constructor_args
    }

    fn derive(&self, kind: InvocationKind) -> CallContext {
        CallContext {
            target_type: self.target_type.clone(),
            constructor_args: Arc::clone(&self.constructor_args),
            kind,
            method: None,
            property: None,
            args: Vec::new(),
            property_value: Value::Null,
            result: Value::Null,
        }
    }

    /// Fresh context for a method call
    pub fn method_call(&self, method: Arc<MethodDescriptor>, args: Vec<Value>) -> CallContext {
        let mut ctx = self.derive(InvocationKind::Method);
        ctx.method = Some(method);
        ctx.args = args;
        ctx
    }

    /// Fresh context for a property read
    pub fn property_get(&self, property: Arc<PropertyDescriptor>) -> CallContext {
        let mut ctx = self.derive(InvocationKind::Property(Accessor::Get));
        ctx.property = Some(property);
        ctx
    }

    /// Fresh context for a property write carrying the incoming value
    pub fn property_set(&self, property: Arc<PropertyDescriptor>, value: Value) -> CallContext {
        let mut ctx = self.derive(InvocationKind::Property(Accessor::Set));
        ctx.property = Some(property);
        ctx.property_value = value;
        ctx
    }
}

/// Mutable per-invocation snapshot
#[derive(Debug, Clone)]
pub struct CallContext {
    target_type: TypeRef,
    constructor_args: Arc<[Value]>,
    kind: InvocationKind,
    method: Option<Arc<MethodDescriptor>>,
    property: Option<Arc<PropertyDescriptor>>,
    args: Vec<Value>,
    property_value: Value,
    result: Value,
}

impl CallContext {
    /// Runtime type of the proxy being invoked
    pub fn target_type(&self) -> &TypeRef {
        &self.target_type
    }

    /// Arguments the proxy instance was constructed with (empty, never absent)
    pub fn constructor_args(&self) -> &[Value] {
        &self.constructor_args
    }

    /// Invocation kind
    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// Whether a method is being called
    pub fn is_method(&self) -> bool {
        self.kind == InvocationKind::Method
    }

    /// Whether a property is being accessed
    pub fn is_property(&self) -> bool {
        matches!(self.kind, InvocationKind::Property(_))
    }

    /// Accessor being run, for property accesses
    pub fn accessor(&self) -> Option<Accessor> {
        match self.kind {
            InvocationKind::Property(a) => Some(a),
            InvocationKind::Method => None,
        }
    }

    /// Method descriptor, for method calls
    pub fn method(&self) -> Option<&MethodDescriptor> {
        self.method.as_deref()
    }

    /// Property descriptor, for property accesses
    pub fn property(&self) -> Option<&PropertyDescriptor> {
        self.property.as_deref()
    }

    /// Name of the member being invoked
    pub fn member_name(&self) -> &str {
        match (&self.method, &self.property) {
            (Some(m), _) => &m.name,
            (None, Some(p)) => &p.name,
            (None, None) => "",
        }
    }

    /// Call arguments (empty for property accesses)
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Mutable call arguments; rewrites reach the original method
    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.args
    }

    /// Argument at `index`
    pub fn arg(&self, index: usize) -> ValueResult<&Value> {
        self.args.get(index).ok_or(ValueError::ArgumentIndex {
            index,
            len: self.args.len(),
        })
    }

    /// Replace the argument at `index`
    pub fn set_arg(&mut self, index: usize, value: impl Into<Value>) -> ValueResult<()> {
        let len = self.args.len();
        let slot = self
            .args
            .get_mut(index)
            .ok_or(ValueError::ArgumentIndex { index, len })?;
        *slot = value.into();
        Ok(())
    }

    /// Value read (getter) or being assigned (setter)
    pub fn property_value(&self) -> &Value {
        &self.property_value
    }

    /// Replace the property value; for setters this is what gets assigned
    pub fn set_property_value(&mut self, value: impl Into<Value>) {
        self.property_value = value.into();
    }

    /// Result produced by the original member (null until it has run)
    pub fn result(&self) -> &Value {
        &self.result
    }

    /// Store the original member's raw result. Called by the dispatcher
    /// between the two hook phases.
    pub fn record_result(&mut self, value: Value) {
        self.result = value;
    }

    /// What `after` returns when a hook does not override it: the result for
    /// method calls, the property value for property accesses.
    pub fn default_outcome(&self) -> Value {
        match self.kind {
            InvocationKind::Method => self.result.clone(),
            InvocationKind::Property(_) => self.property_value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::ParameterDescriptor;

    fn sum_descriptor() -> Arc<MethodDescriptor> {
        Arc::new(MethodDescriptor {
            declaring_type: TypeRef::named("Test"),
            name: "sum".to_string(),
            parameters: vec![
                ParameterDescriptor { name: "a".into(), type_ref: TypeRef::Int, index: 0 },
                ParameterDescriptor { name: "b".into(), type_ref: TypeRef::Int, index: 1 },
            ],
            return_type: TypeRef::Int,
        })
    }

    #[test]
    fn test_method_context() {
        let template = ContextTemplate::new(TypeRef::named("Weave.TestProxy"), vec![]);
        let mut ctx = template.method_call(sum_descriptor(), vec![Value::Int(1), Value::Int(2)]);

        assert!(ctx.is_method());
        assert!(!ctx.is_property());
        assert_eq!(ctx.member_name(), "sum");
        assert!(ctx.constructor_args().is_empty());
        assert!(ctx.result().is_null());

        ctx.set_arg(1, 5i64).unwrap();
        assert_eq!(ctx.args(), &[Value::Int(1), Value::Int(5)]);
        assert!(ctx.set_arg(2, 0i64).is_err());

        ctx.record_result(Value::Int(6));
        assert_eq!(ctx.default_outcome(), Value::Int(6));
    }

    #[test]
    fn test_contexts_are_fresh() {
        let template = ContextTemplate::new(TypeRef::named("P"), vec![Value::Str("x".into())]);
        let mut first = template.method_call(sum_descriptor(), vec![Value::Int(1), Value::Int(1)]);
        first.record_result(Value::Int(2));
        let second = template.method_call(sum_descriptor(), vec![Value::Int(1), Value::Int(1)]);
        assert!(second.result().is_null());
        assert_eq!(second.constructor_args(), &[Value::Str("x".into())]);
    }

    #[test]
    fn test_property_set_context() {
        let prop = Arc::new(PropertyDescriptor {
            declaring_type: TypeRef::named("Test"),
            name: "A".into(),
            type_ref: TypeRef::Str,
            can_read: true,
            can_write: true,
        });
        let template = ContextTemplate::new(TypeRef::named("P"), vec![]);
        let ctx = template.property_set(prop, Value::Str("v".into()));
        assert_eq!(ctx.accessor(), Some(Accessor::Set));
        assert_eq!(ctx.property_value(), &Value::Str("v".into()));
        assert_eq!(ctx.default_outcome(), Value::Str("v".into()));
        assert!(ctx.args().is_empty());
    }
}
