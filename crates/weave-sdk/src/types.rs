//! Structural type references
//!
//! `TypeRef` is the identity the engine uses for every type it reasons about:
//! constructor and method signatures, runtime types of dynamic values, closed
//! generic instantiations, and the synthesized proxy types themselves.
//!
//! ```text
//! int                      TypeRef::Int
//! string[]                 TypeRef::List(Box::new(TypeRef::Str))
//! Container<int>           TypeRef::Named { name: "Container", args: [Int] }
//! T                        TypeRef::Param("T")
//! ```

use std::fmt;

/// Structural reference to a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// No value (method return type only)
    Void,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    Str,
    /// A type handle (`Value::Type`)
    Type,
    /// Top type
    Object,
    /// Homogeneous list
    List(Box<TypeRef>),
    /// Class or interface, optionally closed over type arguments
    Named {
        /// Declared name
        name: String,
        /// Type arguments in declaration order (empty for non-generic types)
        args: Vec<TypeRef>,
    },
    /// Unbound generic parameter
    Param(String),
}

impl TypeRef {
    /// Reference a non-generic class or interface by name
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Reference a generic class closed over `args`
    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Reference a generic parameter
    pub fn param(name: impl Into<String>) -> Self {
        TypeRef::Param(name.into())
    }

    /// List of `elem`
    pub fn list(elem: TypeRef) -> Self {
        TypeRef::List(Box::new(elem))
    }

    /// Declared name for named types
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Type arguments for named types (empty otherwise)
    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Whether values of this type are stored inline (boxed when marshaled)
    pub fn is_value_type(&self) -> bool {
        matches!(self, TypeRef::Bool | TypeRef::Int | TypeRef::Float)
    }

    /// Whether `Value::Null` is an acceptable value of this type
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            TypeRef::Str
                | TypeRef::Type
                | TypeRef::Object
                | TypeRef::List(_)
                | TypeRef::Named { .. }
        )
    }

    /// Whether this reference mentions any unbound generic parameter
    pub fn is_open(&self) -> bool {
        match self {
            TypeRef::Param(_) => true,
            TypeRef::List(elem) => elem.is_open(),
            TypeRef::Named { args, .. } => args.iter().any(TypeRef::is_open),
            _ => false,
        }
    }

    /// Rewrite every generic parameter through `bind`.
    ///
    /// Parameters `bind` returns `None` for are left in place.
    pub fn map_params<F>(&self, bind: &F) -> TypeRef
    where
        F: Fn(&str) -> Option<TypeRef>,
    {
        match self {
            TypeRef::Param(name) => bind(name).unwrap_or_else(|| self.clone()),
            TypeRef::List(elem) => TypeRef::List(Box::new(elem.map_params(bind))),
            TypeRef::Named { name, args } => TypeRef::Named {
                name: name.clone(),
                args: args.iter().map(|a| a.map_params(bind)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => f.write_str("void"),
            TypeRef::Bool => f.write_str("bool"),
            TypeRef::Int => f.write_str("int"),
            TypeRef::Float => f.write_str("float"),
            TypeRef::Str => f.write_str("string"),
            TypeRef::Type => f.write_str("type"),
            TypeRef::Object => f.write_str("object"),
            TypeRef::List(elem) => write!(f, "{}[]", elem),
            TypeRef::Param(name) => f.write_str(name),
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}
