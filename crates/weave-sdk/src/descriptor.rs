//! Member descriptors handed to hooks
//!
//! Descriptors describe the *closed* member being invoked: for a proxy of
//! `Container<int>`, a method declared as `put(item: T)` is described with a
//! parameter of type `int`.

use std::fmt;

use crate::types::TypeRef;

/// Parameter of a method or constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub type_ref: TypeRef,
    /// Position in the parameter list
    pub index: usize,
}

/// Method being invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Type that declares the method
    pub declaring_type: TypeRef,
    /// Method name
    pub name: String,
    /// Parameters in order
    pub parameters: Vec<ParameterDescriptor>,
    /// Return type (`Void` for none)
    pub return_type: TypeRef,
}

impl MethodDescriptor {
    /// Parameter types in order
    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters.iter().map(|p| &p.type_ref)
    }

    /// Whether the method returns nothing
    pub fn is_void(&self) -> bool {
        self.return_type == TypeRef::Void
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring_type, self.name)?;
        for (i, p) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", p.name, p.type_ref)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

/// Property accessor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Getter
    Get,
    /// Setter
    Set,
}

/// Property being accessed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Type that declares the property
    pub declaring_type: TypeRef,
    /// Property name
    pub name: String,
    /// Declared type
    pub type_ref: TypeRef,
    /// Whether a public getter exists
    pub can_read: bool,
    /// Whether a public setter exists
    pub can_write: bool,
}

impl fmt::Display for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}: {}", self.declaring_type, self.name, self.type_ref)
    }
}
