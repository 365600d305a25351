//! Conversions between `Value` and Rust types.
//!
//! Member bodies and hooks receive and return `Value`s; these traits let them
//! unbox arguments and box results without matching on variants by hand.
//!
//! ```ignore
//! let a = i64::from_value(&args[0])?;
//! let b = i64::from_value(&args[1])?;
//! Ok((a + b).into_value())
//! ```

use crate::error::{ValueError, ValueResult};
use crate::types::TypeRef;
use crate::value::Value;

/// Convert from `Value` to a Rust type.
pub trait FromValue: Sized {
    /// Unbox, returning an error if the variant doesn't match
    fn from_value(value: &Value) -> ValueResult<Self>;
}

/// Convert from a Rust type to `Value`.
pub trait IntoValue {
    /// Box into a `Value`
    fn into_value(self) -> Value;
}

fn mismatch(expected: TypeRef, value: &Value) -> ValueError {
    ValueError::TypeMismatch {
        expected,
        got: value.type_name(),
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> ValueResult<Self> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value.as_bool().ok_or_else(|| mismatch(TypeRef::Bool, value))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value.as_int().ok_or_else(|| mismatch(TypeRef::Int, value))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> ValueResult<Self> {
        let i = i64::from_value(value)?;
        i32::try_from(i).map_err(|_| ValueError::OutOfRange(i, "i32"))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl FromValue for usize {
    fn from_value(value: &Value) -> ValueResult<Self> {
        let i = i64::from_value(value)?;
        usize::try_from(i).map_err(|_| ValueError::OutOfRange(i, "usize"))
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value.as_float().ok_or_else(|| mismatch(TypeRef::Float, value))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(TypeRef::Str, value))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for TypeRef {
    fn from_value(value: &Value) -> ValueResult<Self> {
        value
            .as_type()
            .cloned()
            .ok_or_else(|| mismatch(TypeRef::Type, value))
    }
}

impl IntoValue for TypeRef {
    fn into_value(self) -> Value {
        Value::Type(self)
    }
}

// Unit type (void members)
impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> ValueResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> ValueResult<Self> {
        let items = value
            .as_list()
            .ok_or_else(|| mismatch(TypeRef::list(TypeRef::Object), value))?;
        items.iter().map(T::from_value).collect()
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
