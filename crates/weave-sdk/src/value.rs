//! Value: dynamically typed boxed value
//!
//! Every argument, field, property value and result that crosses an
//! interception boundary is carried as a `Value`. Value-like Rust types
//! (`bool`, integers, floats) are boxed into their variants; everything else
//! is either a string, a list, a type handle, or an opaque native payload
//! tagged with the `TypeRef` it claims to be.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::TypeRef;

/// Opaque host value tagged with its runtime type
#[derive(Clone)]
pub struct NativeBox {
    type_ref: TypeRef,
    data: Arc<dyn Any + Send + Sync>,
}

impl NativeBox {
    /// Wrap `data` as a value of `type_ref`
    pub fn new<T: Any + Send + Sync>(type_ref: TypeRef, data: T) -> Self {
        Self {
            type_ref,
            data: Arc::new(data),
        }
    }

    /// Runtime type of the payload
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Borrow the payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Whether two boxes share the same payload allocation
    pub fn ptr_eq(&self, other: &NativeBox) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for NativeBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeBox({})", self.type_ref)
    }
}

/// Dynamically typed value
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value / void result
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    Str(String),
    /// Type handle
    Type(TypeRef),
    /// List of values
    List(Vec<Value>),
    /// Opaque host value
    Native(NativeBox),
}

impl Value {
    /// Create an opaque native value
    pub fn native<T: Any + Send + Sync>(type_ref: TypeRef, data: T) -> Self {
        Value::Native(NativeBox::new(type_ref, data))
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type of this value, `None` for null
    pub fn runtime_type(&self) -> Option<TypeRef> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(TypeRef::Bool),
            Value::Int(_) => Some(TypeRef::Int),
            Value::Float(_) => Some(TypeRef::Float),
            Value::Str(_) => Some(TypeRef::Str),
            Value::Type(_) => Some(TypeRef::Type),
            Value::List(items) => Some(TypeRef::list(list_element_type(items))),
            Value::Native(b) => Some(b.type_ref().clone()),
        }
    }

    /// Human-readable runtime type name (`null` for null)
    pub fn type_name(&self) -> String {
        self.runtime_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    /// Whether this value may be bound to a slot declared as `ty`.
    ///
    /// `Object` is the top type and accepts every value, null included, and
    /// `object[]` accepts every list. Everything else matches exactly: no
    /// numeric widening, no upcasting. Null is accepted by every nullable
    /// type.
    pub fn is_assignable_to(&self, ty: &TypeRef) -> bool {
        match (self, ty) {
            (_, TypeRef::Object) => true,
            (Value::Null, _) => ty.is_nullable(),
            (Value::List(_), TypeRef::List(elem)) if **elem == TypeRef::Object => true,
            _ => self.runtime_type().as_ref() == Some(ty),
        }
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as type handle
    pub fn as_type(&self) -> Option<&TypeRef> {
        match self {
            Value::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Get list items
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow an opaque payload as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Native(b) => b.downcast_ref::<T>(),
            _ => None,
        }
    }
}

// Lists are typed by their first non-null element; empty or all-null lists
// are `object[]`.
fn list_element_type(items: &[Value]) -> TypeRef {
    items
        .iter()
        .find_map(Value::runtime_type)
        .unwrap_or(TypeRef::Object)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Type(t) => write!(f, "typeof({})", t),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Native(b) => write!(f, "<{}>", b.type_ref()),
        }
    }
}
