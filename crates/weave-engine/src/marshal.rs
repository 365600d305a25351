//! Argument marshaling
//!
//! Helpers the dispatcher uses around every call: matching call-site
//! arguments against signatures, reading (possibly rewritten) arguments back
//! out of a call context, and checking results against declared types.
//!
//! Matching is exact. An `int` parameter accepts only `Value::Int`, never a
//! float; `Value::Null` binds only to nullable parameter types.

use weave_sdk::{MethodDescriptor, TypeRef, Value};

use crate::error::{InvokeError, InvokeResult};

/// Runtime type names of `args`, for error reporting
pub fn arg_type_names(args: &[Value]) -> Vec<String> {
    args.iter().map(Value::type_name).collect()
}

/// Whether `args` bind positionally to `params`
pub fn signature_matches<'a, I>(params: I, args: &[Value]) -> bool
where
    I: IntoIterator<Item = &'a TypeRef>,
    I::IntoIter: ExactSizeIterator,
{
    let params = params.into_iter();
    params.len() == args.len() && params.zip(args).all(|(ty, arg)| arg.is_assignable_to(ty))
}

/// First candidate whose signature accepts `args`
pub fn select_overload<'a, T, F, I>(candidates: &'a [T], args: &[Value], params: F) -> Option<&'a T>
where
    F: Fn(&'a T) -> I,
    I: IntoIterator<Item = &'a TypeRef>,
    I::IntoIter: ExactSizeIterator,
{
    candidates.iter().find(|c| signature_matches(params(*c), args))
}

/// Read the argument list back out of a call context after `before` ran
pub fn load_args(method: &MethodDescriptor, args: &[Value]) -> InvokeResult<Vec<Value>> {
    if args.len() != method.parameters.len() {
        return Err(InvokeError::ArityMismatch {
            member: method.name.clone(),
            expected: method.parameters.len(),
            got: args.len(),
        });
    }
    for (param, arg) in method.parameters.iter().zip(args) {
        check_argument(&method.name, param.index, &param.type_ref, arg)?;
    }
    Ok(args.to_vec())
}

/// Check a single argument against its declared type
pub fn check_argument(member: &str, index: usize, ty: &TypeRef, value: &Value) -> InvokeResult<()> {
    if value.is_assignable_to(ty) {
        Ok(())
    } else {
        Err(InvokeError::ArgumentMismatch {
            member: member.to_string(),
            index,
            expected: ty.clone(),
            got: value.type_name(),
        })
    }
}

/// Unbox a final result as the declared return type; void discards it
pub fn unbox_return(member: &str, return_type: &TypeRef, value: Value) -> InvokeResult<Value> {
    if *return_type == TypeRef::Void {
        return Ok(Value::Null);
    }
    if value.is_assignable_to(return_type) {
        Ok(value)
    } else {
        Err(InvokeError::ReturnMismatch {
            member: member.to_string(),
            expected: return_type.clone(),
            got: value.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_sdk::ParameterDescriptor;

    fn sum() -> MethodDescriptor {
        MethodDescriptor {
            declaring_type: TypeRef::named("Test"),
            name: "sum".into(),
            parameters: vec![
                ParameterDescriptor { name: "a".into(), type_ref: TypeRef::Int, index: 0 },
                ParameterDescriptor { name: "b".into(), type_ref: TypeRef::Int, index: 1 },
            ],
            return_type: TypeRef::Int,
        }
    }

    #[test]
    fn test_signature_matching_is_exact() {
        let params = [TypeRef::Int, TypeRef::Str];
        assert!(signature_matches(&params, &[Value::Int(1), Value::Str("a".into())]));
        assert!(signature_matches(&params, &[Value::Int(1), Value::Null]));
        assert!(!signature_matches(&params, &[Value::Float(1.0), Value::Null]));
        assert!(!signature_matches(&params, &[Value::Int(1)]));
        assert!(!signature_matches(&[TypeRef::Int], &[Value::Null]));
    }

    #[test]
    fn test_select_overload() {
        let overloads = vec![vec![TypeRef::Str], vec![TypeRef::Int]];
        let picked = select_overload(&overloads, &[Value::Int(3)], |o| o.iter());
        assert_eq!(picked, Some(&vec![TypeRef::Int]));
        assert!(select_overload(&overloads, &[Value::Bool(true)], |o| o.iter()).is_none());
    }

    #[test]
    fn test_load_args_reports_rewrites() {
        let method = sum();
        assert_eq!(
            load_args(&method, &[Value::Int(2), Value::Int(2)]).unwrap(),
            vec![Value::Int(2), Value::Int(2)]
        );
        assert!(matches!(
            load_args(&method, &[Value::Int(2), Value::Str("x".into())]),
            Err(InvokeError::ArgumentMismatch { index: 1, .. })
        ));
        assert!(matches!(
            load_args(&method, &[Value::Int(2)]),
            Err(InvokeError::ArityMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn test_unbox_return() {
        assert_eq!(unbox_return("m", &TypeRef::Void, Value::Int(1)).unwrap(), Value::Null);
        assert_eq!(unbox_return("m", &TypeRef::Int, Value::Int(1)).unwrap(), Value::Int(1));
        assert!(matches!(
            unbox_return("m", &TypeRef::Int, Value::Null),
            Err(InvokeError::ReturnMismatch { .. })
        ));
        assert_eq!(unbox_return("m", &TypeRef::Str, Value::Null).unwrap(), Value::Null);
    }
}
