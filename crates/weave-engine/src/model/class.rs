//! Type definitions and their builders
//!
//! A target type is described to the engine once: its generic parameters,
//! fields, constructors, methods and properties, with Rust closures as member
//! bodies. Member signatures may mention the definition's generic parameters
//! through `TypeRef::Param`; they are substituted when the definition is
//! closed over concrete type arguments.
//!
//! Inline hook markers (`hooked`, `hooked_getter`, `hooked_setter`) are sugar
//! for the designation table built at synthesis time.

use std::fmt;
use std::sync::Arc;

use weave_sdk::{BoxError, TypeRef, Value};

use crate::object::This;

// ============================================================================
// Member bodies
// ============================================================================

/// Constructor body, run on the new instance's field storage
pub type ConstructorBody =
    Arc<dyn Fn(&mut This<'_>, &[Value]) -> Result<(), BoxError> + Send + Sync>;

/// Method body
pub type MethodBody =
    Arc<dyn Fn(&mut This<'_>, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// Property getter body
pub type GetterBody = Arc<dyn Fn(&This<'_>) -> Result<Value, BoxError> + Send + Sync>;

/// Property setter body
pub type SetterBody = Arc<dyn Fn(&mut This<'_>, Value) -> Result<(), BoxError> + Send + Sync>;

fn empty_constructor() -> ConstructorBody {
    Arc::new(|_, _| Ok(()))
}

fn empty_method() -> MethodBody {
    Arc::new(|_, _| Ok(Value::Null))
}

fn empty_getter() -> GetterBody {
    Arc::new(|_| Ok(Value::Null))
}

fn empty_setter() -> SetterBody {
    Arc::new(|_, _| Ok(()))
}

// ============================================================================
// Modifiers
// ============================================================================

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Callable through objects and eligible for interception
    #[default]
    Public,
    /// Hidden from objects and never intercepted
    Private,
}

impl Visibility {
    /// Whether the member is public
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Definition kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    /// Instantiable class
    Class,
    /// Interface (signatures only)
    Interface,
}

// ============================================================================
// Members
// ============================================================================

/// Field of a class
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Declared type (may mention generic parameters)
    pub type_ref: TypeRef,
    /// Value the field holds before any constructor runs
    pub initial_value: Value,
}

impl FieldDefinition {
    /// Create a field initialized to null
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            initial_value: Value::Null,
        }
    }

    /// Set the initial value
    pub fn initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = value.into();
        self
    }
}

/// Parameter of a constructor or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDefinition {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub type_ref: TypeRef,
}

impl ParameterDefinition {
    /// Create a parameter
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
        }
    }
}

/// Constructor of a class
#[derive(Clone)]
pub struct ConstructorDefinition {
    /// Parameters in order
    pub parameters: Vec<ParameterDefinition>,
    /// Visibility
    pub visibility: Visibility,
    /// Body
    pub body: ConstructorBody,
}

impl ConstructorDefinition {
    /// Create a public parameterless constructor with an empty body
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            visibility: Visibility::Public,
            body: empty_constructor(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.parameters.push(ParameterDefinition::new(name, type_ref));
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Set the body
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut This<'_>, &[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.body = Arc::new(body);
        self
    }

    /// Parameter types in order
    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters.iter().map(|p| &p.type_ref)
    }
}

impl Default for ConstructorDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConstructorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDefinition")
            .field("parameters", &self.parameters)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Method of a class or interface
#[derive(Clone)]
pub struct MethodDefinition {
    /// Method name
    pub name: String,
    /// Parameters in order
    pub parameters: Vec<ParameterDefinition>,
    /// Return type (`Void` for none)
    pub return_type: TypeRef,
    /// Visibility
    pub visibility: Visibility,
    /// Whether a subclass may override it
    pub is_virtual: bool,
    /// Inline hook marker
    pub hook: Option<String>,
    /// Body (ignored for interface members)
    pub body: MethodBody,
}

impl MethodDefinition {
    /// Create a public, non-virtual void method with an empty body
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: TypeRef::Void,
            visibility: Visibility::Public,
            is_virtual: false,
            hook: None,
            body: empty_method(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.parameters.push(ParameterDefinition::new(name, type_ref));
        self
    }

    /// Set return type
    pub fn returns(mut self, type_ref: TypeRef) -> Self {
        self.return_type = type_ref;
        self
    }

    /// Mark as overridable
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Designate the hook type wrapping this method
    pub fn hooked(mut self, hook: impl Into<String>) -> Self {
        self.hook = Some(hook.into());
        self
    }

    /// Set the body
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut This<'_>, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.body = Arc::new(body);
        self
    }

    /// Parameter types in order
    pub fn parameter_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.parameters.iter().map(|p| &p.type_ref)
    }

    /// Whether the parameter types equal `types` exactly
    pub fn has_signature(&self, types: &[TypeRef]) -> bool {
        self.parameters.len() == types.len() && self.parameter_types().eq(types.iter())
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .field("is_virtual", &self.is_virtual)
            .field("hook", &self.hook)
            .finish_non_exhaustive()
    }
}

/// One accessor of a property
#[derive(Clone)]
pub struct AccessorDefinition<B> {
    /// Visibility
    pub visibility: Visibility,
    /// Inline hook marker for this accessor only
    pub hook: Option<String>,
    /// Body
    pub body: B,
}

impl<B> AccessorDefinition<B> {
    fn public(body: B) -> Self {
        Self {
            visibility: Visibility::Public,
            hook: None,
            body,
        }
    }

    /// Whether the accessor is public
    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }
}

impl<B> fmt::Debug for AccessorDefinition<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorDefinition")
            .field("visibility", &self.visibility)
            .field("hook", &self.hook)
            .finish_non_exhaustive()
    }
}

/// Property of a class or interface
#[derive(Clone, Debug)]
pub struct PropertyDefinition {
    /// Property name
    pub name: String,
    /// Declared type
    pub type_ref: TypeRef,
    /// Getter, if any
    pub getter: Option<AccessorDefinition<GetterBody>>,
    /// Setter, if any
    pub setter: Option<AccessorDefinition<SetterBody>>,
    /// Whether a subclass may override the accessors
    pub is_virtual: bool,
    /// Inline hook marker covering both accessors
    pub hook: Option<String>,
    /// Field backing an auto-property
    pub backing_field: Option<String>,
}

impl PropertyDefinition {
    /// Create a property with no accessors
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            getter: None,
            setter: None,
            is_virtual: false,
            hook: None,
            backing_field: None,
        }
    }

    /// Auto-property stored in a generated backing field
    pub fn auto(name: impl Into<String>, type_ref: TypeRef) -> Self {
        let name = name.into();
        let field = format!("<{}>", name);
        let read = field.clone();
        let write = field.clone();
        let mut prop = Self::new(name, type_ref)
            .getter(move |this| Ok(this.field(&read)?.clone()))
            .setter(move |this, value| Ok(this.set_field(&write, value)?));
        prop.backing_field = Some(field);
        prop
    }

    /// Add a getter
    pub fn getter<F>(mut self, body: F) -> Self
    where
        F: Fn(&This<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        let hook = self.getter.take().and_then(|g| g.hook);
        self.getter = Some(AccessorDefinition {
            hook,
            ..AccessorDefinition::public(Arc::new(body) as GetterBody)
        });
        self
    }

    /// Add a setter
    pub fn setter<F>(mut self, body: F) -> Self
    where
        F: Fn(&mut This<'_>, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let hook = self.setter.take().and_then(|s| s.hook);
        self.setter = Some(AccessorDefinition {
            hook,
            ..AccessorDefinition::public(Arc::new(body) as SetterBody)
        });
        self
    }

    /// Declare a getter without a body (interface members)
    pub fn readable(mut self) -> Self {
        self.getter
            .get_or_insert_with(|| AccessorDefinition::public(empty_getter()));
        self
    }

    /// Declare a setter without a body (interface members)
    pub fn writable(mut self) -> Self {
        self.setter
            .get_or_insert_with(|| AccessorDefinition::public(empty_setter()));
        self
    }

    /// Make the setter private
    pub fn private_setter(mut self) -> Self {
        if let Some(setter) = self.setter.as_mut() {
            setter.visibility = Visibility::Private;
        }
        self
    }

    /// Mark as overridable
    pub fn as_virtual(mut self) -> Self {
        self.is_virtual = true;
        self
    }

    /// Designate the hook type wrapping both accessors
    pub fn hooked(mut self, hook: impl Into<String>) -> Self {
        self.hook = Some(hook.into());
        self
    }

    /// Designate the hook type wrapping the getter only
    pub fn hooked_getter(mut self, hook: impl Into<String>) -> Self {
        if let Some(getter) = self.getter.as_mut() {
            getter.hook = Some(hook.into());
        }
        self
    }

    /// Designate the hook type wrapping the setter only
    pub fn hooked_setter(mut self, hook: impl Into<String>) -> Self {
        if let Some(setter) = self.setter.as_mut() {
            setter.hook = Some(hook.into());
        }
        self
    }

    /// Whether a public getter exists
    pub fn can_read(&self) -> bool {
        self.getter.as_ref().is_some_and(AccessorDefinition::is_public)
    }

    /// Whether a public setter exists
    pub fn can_write(&self) -> bool {
        self.setter.as_ref().is_some_and(AccessorDefinition::is_public)
    }

    /// Whether any accessor is public
    pub fn is_public(&self) -> bool {
        self.can_read() || self.can_write()
    }
}

// ============================================================================
// Type definition
// ============================================================================

/// Reflective description of a class or interface
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Type name
    pub name: String,
    /// Class or interface
    pub kind: DefKind,
    /// Generic parameter names, in order
    pub generic_params: Vec<String>,
    /// Whether the type carries the interceptable marker
    pub interceptable: bool,
    /// Implemented interfaces (may mention generic parameters)
    pub interfaces: Vec<TypeRef>,
    /// Fields
    pub fields: Vec<FieldDefinition>,
    /// Constructors
    pub constructors: Vec<ConstructorDefinition>,
    /// Methods
    pub methods: Vec<MethodDefinition>,
    /// Properties
    pub properties: Vec<PropertyDefinition>,
}

impl TypeDef {
    /// Reference to this definition; open when generic
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::generic(
            self.name.clone(),
            self.generic_params.iter().map(TypeRef::param),
        )
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == DefKind::Interface
    }

    /// Whether this definition declares generic parameters
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Public constructors
    pub fn public_constructors(&self) -> impl Iterator<Item = &ConstructorDefinition> {
        self.constructors.iter().filter(|c| c.visibility.is_public())
    }

    /// Indices of public methods named `name`
    pub fn public_methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.methods
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.name == name && m.visibility.is_public())
            .map(|(i, _)| i)
    }

    /// Index of the property named `name`
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }

    /// Declared interface reference with the given name
    pub fn interface_named(&self, name: &str) -> Option<&TypeRef> {
        self.interfaces.iter().find(|i| i.name() == Some(name))
    }

    /// Whether any member carries an inline hook marker
    pub fn has_inline_markers(&self) -> bool {
        self.methods.iter().any(|m| m.hook.is_some())
            || self.properties.iter().any(|p| {
                p.hook.is_some()
                    || p.getter.as_ref().is_some_and(|g| g.hook.is_some())
                    || p.setter.as_ref().is_some_and(|s| s.hook.is_some())
            })
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for class definitions
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    def: TypeDef,
}

impl ClassBuilder {
    /// Start a class definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: TypeDef {
                name: name.into(),
                kind: DefKind::Class,
                generic_params: Vec::new(),
                interceptable: false,
                interfaces: Vec::new(),
                fields: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
                properties: Vec::new(),
            },
        }
    }

    /// Mark the class interceptable
    pub fn interceptable(mut self) -> Self {
        self.def.interceptable = true;
        self
    }

    /// Declare a generic parameter
    pub fn generic_param(mut self, name: impl Into<String>) -> Self {
        self.def.generic_params.push(name.into());
        self
    }

    /// Declare an implemented interface
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.def.interfaces.push(interface);
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.def.fields.push(field);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, ctor: ConstructorDefinition) -> Self {
        self.def.constructors.push(ctor);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.def.methods.push(method);
        self
    }

    /// Add a property; auto-properties also get their backing field
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        if let Some(field) = &property.backing_field {
            self.def
                .fields
                .push(FieldDefinition::new(field.clone(), property.type_ref.clone()));
        }
        self.def.properties.push(property);
        self
    }

    /// Finish the definition. A class without constructors gets an implicit
    /// public parameterless one.
    pub fn build(mut self) -> TypeDef {
        if self.def.constructors.is_empty() {
            self.def.constructors.push(ConstructorDefinition::new());
        }
        self.def
    }
}

/// Builder for interface definitions
#[derive(Debug, Clone)]
pub struct InterfaceBuilder {
    def: TypeDef,
}

impl InterfaceBuilder {
    /// Start an interface definition
    pub fn new(name: impl Into<String>) -> Self {
        let mut def = ClassBuilder::new(name).def;
        def.kind = DefKind::Interface;
        Self { def }
    }

    /// Declare a generic parameter
    pub fn generic_param(mut self, name: impl Into<String>) -> Self {
        self.def.generic_params.push(name.into());
        self
    }

    /// Declare a method signature
    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.def.methods.push(method);
        self
    }

    /// Declare a property signature
    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.def.properties.push(property);
        self
    }

    /// Finish the definition
    pub fn build(self) -> TypeDef {
        self.def
    }
}
