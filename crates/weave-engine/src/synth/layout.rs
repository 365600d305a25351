//! Synthesized type layout
//!
//! A [`ProxyTemplate`] is the open result of synthesizing one definition in
//! one mode: which members are exposed, which are routed through which hook
//! slot, and which hook types fill those slots. Closing a template over
//! concrete type arguments produces a [`RuntimeType`], the immutable dispatch
//! table objects are instances of. Original (unproxied) definitions close into
//! runtime types as well, with every route direct and no hook slots.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use weave_sdk::{HookType, MethodDescriptor, PropertyDescriptor, TypeRef, Value};

use crate::generic::GenericBinding;
use crate::model::{ConstructorBody, GetterBody, MethodBody, SetterBody, TypeDef};
use crate::module::{TemplateId, TypeId};

// ============================================================================
// Modes and routes
// ============================================================================

/// How a proxy relates to the type it wraps
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenerationMode {
    /// The proxy extends the original and overrides designated members
    Subclass,
    /// The proxy implements the named interface and holds the original
    Interface(String),
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Subclass => f.write_str("subclass"),
            GenerationMode::Interface(name) => write!(f, "interface {}", name),
        }
    }
}

/// Where a runtime type came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A registered definition, closed over its type arguments
    Original,
    /// A closed proxy template
    Proxy {
        /// Template the type was closed from
        template: TemplateId,
        /// Generation mode of the template
        mode: GenerationMode,
    },
}

/// How a member slot is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Straight to the original body
    Direct,
    /// Through the hook in the given slot
    Intercepted {
        /// Hook slot index
        hook: usize,
    },
}

impl Route {
    /// Route for an optional hook slot
    pub fn from_slot(slot: Option<usize>) -> Self {
        match slot {
            Some(hook) => Route::Intercepted { hook },
            None => Route::Direct,
        }
    }

    /// Whether the route goes through a hook
    pub fn is_intercepted(self) -> bool {
        matches!(self, Route::Intercepted { .. })
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Exposed method: index into the definition's methods
#[derive(Debug, Clone, Copy)]
pub(crate) struct MethodPlan {
    pub index: usize,
    pub route: Route,
}

/// Exposed property: index into the definition's properties; `None` for
/// accessors that are not exposed
#[derive(Debug, Clone, Copy)]
pub(crate) struct PropertyPlan {
    pub index: usize,
    pub getter: Option<Route>,
    pub setter: Option<Route>,
}

/// Members a closed type exposes
#[derive(Debug, Clone, Default)]
pub(crate) struct MemberPlan {
    pub methods: Vec<MethodPlan>,
    pub properties: Vec<PropertyPlan>,
}

impl MemberPlan {
    /// Every public member of `def`, routed directly
    pub fn direct(def: &TypeDef) -> Self {
        let methods = def
            .methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.visibility.is_public())
            .map(|(index, _)| MethodPlan {
                index,
                route: Route::Direct,
            })
            .collect();
        let properties = def
            .properties
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_public())
            .map(|(index, p)| PropertyPlan {
                index,
                getter: p.can_read().then_some(Route::Direct),
                setter: p.can_write().then_some(Route::Direct),
            })
            .collect();
        Self {
            methods,
            properties,
        }
    }
}

/// Open result of synthesizing one definition in one mode
#[derive(Debug)]
pub struct ProxyTemplate {
    pub(crate) id: TemplateId,
    pub(crate) name: String,
    pub(crate) definition: Arc<TypeDef>,
    pub(crate) mode: GenerationMode,
    pub(crate) generic_params: Vec<String>,
    /// Interface implemented in interface mode, in the definition's
    /// parameter space
    pub(crate) interface: Option<TypeRef>,
    pub(crate) plan: MemberPlan,
    pub(crate) hooks: Vec<HookType>,
}

impl ProxyTemplate {
    /// Template id
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Name closed types are displayed under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition being proxied
    pub fn definition(&self) -> &Arc<TypeDef> {
        &self.definition
    }

    /// Generation mode
    pub fn mode(&self) -> &GenerationMode {
        &self.mode
    }

    /// Mirrored generic parameters
    pub fn generic_params(&self) -> &[String] {
        &self.generic_params
    }

    /// Hook types, indexed by slot
    pub fn hooks(&self) -> &[HookType] {
        &self.hooks
    }
}

// ============================================================================
// Closed types
// ============================================================================

/// Field storage layout of a closed type
#[derive(Debug, Clone, Default)]
pub struct FieldLayout {
    names: Vec<String>,
    types: Vec<TypeRef>,
    initial: Vec<Value>,
    index: FxHashMap<String, usize>,
}

impl FieldLayout {
    pub(crate) fn new(def: &TypeDef, binding: &GenericBinding) -> Self {
        let mut layout = Self::default();
        for field in &def.fields {
            let ty = binding.bind(&field.type_ref);
            let initial = if field.initial_value.is_null() {
                zero_value(&ty)
            } else {
                field.initial_value.clone()
            };
            layout.index.insert(field.name.clone(), layout.names.len());
            layout.names.push(field.name.clone());
            layout.types.push(ty);
            layout.initial.push(initial);
        }
        layout
    }

    /// Slot index of the field `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Declared (closed) type of the field at `index`
    pub fn type_at(&self, index: usize) -> &TypeRef {
        &self.types[index]
    }

    /// Field names in slot order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fresh storage with every field at its initial value
    pub(crate) fn initial_values(&self) -> Vec<Value> {
        self.initial.clone()
    }
}

/// Value a field holds when nothing initializes it
fn zero_value(ty: &TypeRef) -> Value {
    match ty {
        TypeRef::Bool => Value::Bool(false),
        TypeRef::Int => Value::Int(0),
        TypeRef::Float => Value::Float(0.0),
        _ => Value::Null,
    }
}

/// Constructor slot of a closed type
#[derive(Clone)]
pub(crate) struct ConstructorSlot {
    pub parameters: Vec<TypeRef>,
    pub body: ConstructorBody,
}

/// Method slot of a closed type
#[derive(Clone)]
pub struct MethodSlot {
    pub(crate) descriptor: Arc<MethodDescriptor>,
    pub(crate) body: MethodBody,
    pub(crate) route: Route,
}

impl MethodSlot {
    /// Closed descriptor
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Route
    pub fn route(&self) -> Route {
        self.route
    }

    pub(crate) fn param_types(&self) -> impl ExactSizeIterator<Item = &TypeRef> + '_ {
        self.descriptor.parameters.iter().map(|p| &p.type_ref)
    }
}

/// Accessor slot of a closed property
#[derive(Clone)]
pub(crate) struct AccessorSlot<B> {
    pub body: B,
    pub route: Route,
}

/// Property slot of a closed type
#[derive(Clone)]
pub struct PropertySlot {
    pub(crate) descriptor: Arc<PropertyDescriptor>,
    pub(crate) getter: Option<AccessorSlot<GetterBody>>,
    pub(crate) setter: Option<AccessorSlot<SetterBody>>,
}

impl PropertySlot {
    /// Closed descriptor
    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }

    /// Route of the getter, if exposed
    pub fn getter_route(&self) -> Option<Route> {
        self.getter.as_ref().map(|g| g.route)
    }

    /// Route of the setter, if exposed
    pub fn setter_route(&self) -> Option<Route> {
        self.setter.as_ref().map(|s| s.route)
    }
}

/// Closed, callable type that objects are instances of
pub struct RuntimeType {
    pub(crate) id: TypeId,
    pub(crate) type_ref: TypeRef,
    pub(crate) definition: Arc<TypeDef>,
    pub(crate) binding: GenericBinding,
    pub(crate) origin: Origin,
    pub(crate) fields: FieldLayout,
    pub(crate) constructors: Vec<ConstructorSlot>,
    pub(crate) methods: Vec<MethodSlot>,
    pub(crate) method_index: FxHashMap<String, Vec<usize>>,
    pub(crate) properties: Vec<PropertySlot>,
    pub(crate) property_index: FxHashMap<String, usize>,
    pub(crate) hooks: Vec<HookType>,
    pub(crate) parent: Option<Arc<RuntimeType>>,
    pub(crate) interfaces: Vec<TypeRef>,
    pub(crate) trace_invocations: bool,
}

impl RuntimeType {
    /// Unique id
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type reference, closed over the type arguments
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Display name, e.g. `Weave.ContainerProxy<int>`
    pub fn name(&self) -> String {
        self.type_ref.to_string()
    }

    /// Originating definition
    pub fn definition(&self) -> &Arc<TypeDef> {
        &self.definition
    }

    /// Concrete type arguments
    pub fn type_args(&self) -> &[TypeRef] {
        self.binding.args()
    }

    /// Origin
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Whether this type is a synthesized proxy
    pub fn is_proxy(&self) -> bool {
        matches!(self.origin, Origin::Proxy { .. })
    }

    /// Parent type (subclass-mode proxies)
    pub fn parent(&self) -> Option<&Arc<RuntimeType>> {
        self.parent.as_ref()
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> &[TypeRef] {
        &self.interfaces
    }

    /// Field layout
    pub fn fields(&self) -> &FieldLayout {
        &self.fields
    }

    /// Exposed method slots
    pub fn methods(&self) -> &[MethodSlot] {
        &self.methods
    }

    /// Slots of the methods named `name`
    pub fn methods_named(&self, name: &str) -> impl Iterator<Item = &MethodSlot> {
        self.method_index
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.methods[i])
    }

    /// Exposed property slots
    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    /// Slot of the property named `name`
    pub fn property(&self, name: &str) -> Option<&PropertySlot> {
        self.property_index.get(name).map(|&i| &self.properties[i])
    }

    /// Hook types filling this type's slots
    pub fn hook_types(&self) -> &[HookType] {
        &self.hooks
    }

    /// Parameter lists of the public constructors
    pub fn constructor_signatures(&self) -> impl Iterator<Item = &[TypeRef]> {
        self.constructors.iter().map(|c| c.parameters.as_slice())
    }

    /// Whether instances of this type are instances of `ty`: the type
    /// itself, any type on its parent chain, or any interface they implement
    pub fn is_assignable_to(&self, ty: &TypeRef) -> bool {
        let mut current = Some(self);
        while let Some(rt) = current {
            if &rt.type_ref == ty || rt.interfaces.contains(ty) {
                return true;
            }
            current = rt.parent.as_deref();
        }
        false
    }
}

impl fmt::Debug for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeType")
            .field("id", &self.id)
            .field("type_ref", &self.type_ref)
            .field("origin", &self.origin)
            .field("methods", &self.methods.len())
            .field("properties", &self.properties.len())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_ref)
    }
}

/// Close the members of `plan` over `binding`
pub(crate) fn close_members(
    def: &TypeDef,
    plan: &MemberPlan,
    binding: &GenericBinding,
    declaring: &TypeRef,
) -> (Vec<MethodSlot>, Vec<PropertySlot>) {
    let methods = plan
        .methods
        .iter()
        .map(|p| {
            let m = &def.methods[p.index];
            let descriptor = MethodDescriptor {
                declaring_type: declaring.clone(),
                name: m.name.clone(),
                parameters: m
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(index, param)| weave_sdk::ParameterDescriptor {
                        name: param.name.clone(),
                        type_ref: binding.bind(&param.type_ref),
                        index,
                    })
                    .collect(),
                return_type: binding.bind(&m.return_type),
            };
            MethodSlot {
                descriptor: Arc::new(descriptor),
                body: Arc::clone(&m.body),
                route: p.route,
            }
        })
        .collect();

    let properties = plan
        .properties
        .iter()
        .map(|p| {
            let prop = &def.properties[p.index];
            let descriptor = PropertyDescriptor {
                declaring_type: declaring.clone(),
                name: prop.name.clone(),
                type_ref: binding.bind(&prop.type_ref),
                can_read: p.getter.is_some(),
                can_write: p.setter.is_some(),
            };
            PropertySlot {
                descriptor: Arc::new(descriptor),
                getter: p.getter.zip(prop.getter.as_ref()).map(|(route, g)| AccessorSlot {
                    body: Arc::clone(&g.body),
                    route,
                }),
                setter: p.setter.zip(prop.setter.as_ref()).map(|(route, s)| AccessorSlot {
                    body: Arc::clone(&s.body),
                    route,
                }),
            }
        })
        .collect();

    (methods, properties)
}

/// Close the public constructors of `def` over `binding`
pub(crate) fn close_constructors(def: &TypeDef, binding: &GenericBinding) -> Vec<ConstructorSlot> {
    def.public_constructors()
        .map(|c| ConstructorSlot {
            parameters: binding.bind_all(c.parameter_types()),
            body: Arc::clone(&c.body),
        })
        .collect()
}

/// Name → slot indices for overload lookup
pub(crate) fn index_methods(methods: &[MethodSlot]) -> FxHashMap<String, Vec<usize>> {
    let mut index: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (i, slot) in methods.iter().enumerate() {
        index.entry(slot.descriptor.name.clone()).or_default().push(i);
    }
    index
}

/// Name → slot index for properties
pub(crate) fn index_properties(properties: &[PropertySlot]) -> FxHashMap<String, usize> {
    properties
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.descriptor.name.clone(), i))
        .collect()
}
