//! Member Marker Model
//!
//! Associates hook types with methods and property accessors. Designations
//! come from one of two sources:
//!
//! - **Inline**: `hooked*` markers on the type definition itself.
//! - **Declarative**: a [`DeclarativeTable`] built out-of-band with
//!   [`ProxyTypeBuilder`], for types that carry no markers.
//!
//! Both are resolved against a concrete definition into one
//! [`DesignationTable`]: every designated member maps to exactly one hook
//! slot, and every distinct hook type gets exactly one slot.

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use weave_sdk::{Accessor, HookType, TypeRef};

use crate::error::{EngineError, EngineResult};
use crate::model::{MethodDefinition, TypeDef, TypeRegistry};

// ============================================================================
// Member references
// ============================================================================

/// Reference to one or more methods of a target type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodRef {
    /// Every public overload with this name
    Name(String),
    /// The single public overload with these parameter types
    Overload {
        /// Method name
        name: String,
        /// Parameter types, exactly as declared
        params: Vec<TypeRef>,
    },
}

impl MethodRef {
    /// All overloads of `name`
    pub fn named(name: impl Into<String>) -> Self {
        MethodRef::Name(name.into())
    }

    /// One overload of `name`
    pub fn overload(name: impl Into<String>, params: impl IntoIterator<Item = TypeRef>) -> Self {
        MethodRef::Overload {
            name: name.into(),
            params: params.into_iter().collect(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        match self {
            MethodRef::Name(name) | MethodRef::Overload { name, .. } => name,
        }
    }

    fn matches(&self, method: &MethodDefinition) -> bool {
        match self {
            MethodRef::Name(name) => &method.name == name,
            MethodRef::Overload { name, params } => {
                &method.name == name && method.has_signature(params)
            }
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRef::Name(name) => f.write_str(name),
            MethodRef::Overload { name, params } => {
                write!(f, "{}({})", name, join_types(params.iter()))
            }
        }
    }
}

/// Which accessors of a property are hooked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyMode {
    /// Getter only (0b01)
    Getter,
    /// Setter only (0b10)
    Setter,
    /// Both accessors (0b11)
    Both,
}

impl PropertyMode {
    /// Mode bits: getter = 0b01, setter = 0b10
    pub fn bits(self) -> u8 {
        match self {
            PropertyMode::Getter => 0b01,
            PropertyMode::Setter => 0b10,
            PropertyMode::Both => 0b11,
        }
    }

    /// Whether the mode covers `accessor`
    pub fn covers(self, accessor: Accessor) -> bool {
        let bit = match accessor {
            Accessor::Get => 0b01,
            Accessor::Set => 0b10,
        };
        self.bits() & bit != 0
    }
}

/// Reference to a property and the accessors to hook
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyRef {
    /// Property name
    pub name: String,
    /// Hooked accessors
    pub mode: PropertyMode,
}

impl PropertyRef {
    /// Hook both accessors
    pub fn both(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: PropertyMode::Both,
        }
    }

    /// Hook the getter only
    pub fn getter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: PropertyMode::Getter,
        }
    }

    /// Hook the setter only
    pub fn setter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: PropertyMode::Setter,
        }
    }
}

// ============================================================================
// Declarative builder
// ============================================================================

/// Builds a [`DeclarativeTable`] for types lacking inline markers
///
/// ```ignore
/// let table = ProxyTypeBuilder::new()
///     .register_hook("log", "Log")
///     .map_method("log", MethodRef::named("myMethod"))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProxyTypeBuilder {
    aliases: Vec<(String, String)>,
    methods: Vec<(String, MethodRef)>,
    properties: Vec<(String, PropertyRef)>,
}

impl ProxyTypeBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `alias` as a name for the hook type `hook_type`
    pub fn register_hook(mut self, alias: impl Into<String>, hook_type: impl Into<String>) -> Self {
        self.aliases.push((alias.into(), hook_type.into()));
        self
    }

    /// Declare hook types under their own names
    pub fn with_hooks<I, S>(mut self, hook_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in hook_types {
            let name = name.into();
            self.aliases.push((name.clone(), name));
        }
        self
    }

    /// Wrap the referenced method(s) with the hook registered as `alias`
    pub fn map_method(mut self, alias: impl Into<String>, method: MethodRef) -> Self {
        self.methods.push((alias.into(), method));
        self
    }

    /// Wrap the referenced property accessor(s) with the hook registered as `alias`
    pub fn map_property(mut self, alias: impl Into<String>, property: PropertyRef) -> Self {
        self.properties.push((alias.into(), property));
        self
    }

    /// Resolve aliases and freeze the table
    pub fn build(self) -> EngineResult<DeclarativeTable> {
        let mut aliases: FxHashMap<String, String> = FxHashMap::default();
        for (alias, hook_type) in self.aliases {
            match aliases.get(&alias) {
                Some(existing) if existing != &hook_type => {
                    return Err(EngineError::DuplicateHookAlias {
                        alias,
                        existing: existing.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    aliases.insert(alias, hook_type);
                }
            }
        }

        let resolve = |alias: &str| {
            aliases
                .get(alias)
                .cloned()
                .ok_or_else(|| EngineError::UnknownHookName(alias.to_string()))
        };

        let mut methods = self
            .methods
            .into_iter()
            .map(|(alias, method)| Ok((resolve(&alias)?, method)))
            .collect::<EngineResult<Vec<_>>>()?;
        let mut properties = self
            .properties
            .into_iter()
            .map(|(alias, property)| Ok((resolve(&alias)?, property)))
            .collect::<EngineResult<Vec<_>>>()?;

        // canonical order: tables mapping the same members compare equal
        methods.sort();
        methods.dedup();
        properties.sort();
        properties.dedup();

        Ok(DeclarativeTable {
            methods,
            properties,
        })
    }
}

/// Frozen out-of-band designations, with aliases resolved to hook type names.
///
/// Equality and hashing are by content, so equal tables share one proxy type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarativeTable {
    methods: Vec<(String, MethodRef)>,
    properties: Vec<(String, PropertyRef)>,
}

impl DeclarativeTable {
    /// Whether the table maps nothing
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.properties.is_empty()
    }

    /// Method mappings as (hook type name, method reference)
    pub fn methods(&self) -> &[(String, MethodRef)] {
        &self.methods
    }

    /// Property mappings as (hook type name, property reference)
    pub fn properties(&self) -> &[(String, PropertyRef)] {
        &self.properties
    }
}

/// Where a proxy's designations come from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DesignationSource {
    /// Inline markers on the definition
    Inline,
    /// A declarative table, keyed by its mappings
    Declarative(DeclarativeTable),
}

// ============================================================================
// Designation table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MemberKey {
    Method(usize),
    Accessor(usize, Accessor),
}

/// Resolved designations for one definition
#[derive(Debug, Clone, Default)]
pub struct DesignationTable {
    hooks: Vec<HookType>,
    members: FxHashMap<MemberKey, usize>,
}

impl DesignationTable {
    /// Designations from inline markers on public members
    pub fn from_inline(def: &TypeDef, registry: &TypeRegistry) -> EngineResult<Self> {
        let mut designator = Designator::new(def, registry);

        for (index, method) in def.methods.iter().enumerate() {
            if !method.visibility.is_public() {
                continue;
            }
            if let Some(hook) = &method.hook {
                designator.designate(MemberKey::Method(index), hook)?;
            }
        }

        for (index, prop) in def.properties.iter().enumerate() {
            let accessors = [
                (Accessor::Get, prop.getter.as_ref().filter(|g| g.is_public()).map(|g| &g.hook)),
                (Accessor::Set, prop.setter.as_ref().filter(|s| s.is_public()).map(|s| &s.hook)),
            ];
            for (accessor, hook) in accessors {
                let Some(own) = hook else { continue };
                if let Some(hook) = &prop.hook {
                    designator.designate(MemberKey::Accessor(index, accessor), hook)?;
                }
                if let Some(hook) = own {
                    designator.designate(MemberKey::Accessor(index, accessor), hook)?;
                }
            }
        }

        Ok(designator.finish())
    }

    /// Designations from a declarative table; inline markers are ignored
    pub fn from_declarative(
        def: &TypeDef,
        table: &DeclarativeTable,
        registry: &TypeRegistry,
    ) -> EngineResult<Self> {
        if table.is_empty() {
            warn!(type_name = %def.name, "declarative table maps no members");
        }

        let mut designator = Designator::new(def, registry);

        for (hook, method_ref) in table.methods() {
            let matched: Vec<usize> = def
                .methods
                .iter()
                .enumerate()
                .filter(|(_, m)| m.visibility.is_public() && method_ref.matches(m))
                .map(|(i, _)| i)
                .collect();
            if matched.is_empty() {
                return Err(EngineError::MemberNotFound {
                    type_name: def.name.clone(),
                    member: method_ref.to_string(),
                });
            }
            for index in matched {
                designator.designate(MemberKey::Method(index), hook)?;
            }
        }

        for (hook, prop_ref) in table.properties() {
            let not_found = |member: String| EngineError::MemberNotFound {
                type_name: def.name.clone(),
                member,
            };
            let index = def
                .property_index(&prop_ref.name)
                .filter(|&i| def.properties[i].is_public())
                .ok_or_else(|| not_found(prop_ref.name.clone()))?;
            let prop = &def.properties[index];

            let mut designated = false;
            for (accessor, present, suffix) in [
                (Accessor::Get, prop.can_read(), "get"),
                (Accessor::Set, prop.can_write(), "set"),
            ] {
                if !prop_ref.mode.covers(accessor) {
                    continue;
                }
                if present {
                    designator.designate(MemberKey::Accessor(index, accessor), hook)?;
                    designated = true;
                } else if prop_ref.mode != PropertyMode::Both {
                    return Err(not_found(format!("{}.{}", prop.name, suffix)));
                }
            }
            if !designated {
                return Err(not_found(prop_ref.name.clone()));
            }
        }

        Ok(designator.finish())
    }

    /// Distinct hook types, indexed by slot
    pub fn hooks(&self) -> &[HookType] {
        &self.hooks
    }

    /// Hook slot designated for the method at `index`
    pub fn method_hook(&self, index: usize) -> Option<usize> {
        self.members.get(&MemberKey::Method(index)).copied()
    }

    /// Hook slot designated for an accessor of the property at `index`
    pub fn accessor_hook(&self, index: usize, accessor: Accessor) -> Option<usize> {
        self.members
            .get(&MemberKey::Accessor(index, accessor))
            .copied()
    }

    /// Indices of designated methods
    pub fn designated_methods(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.keys().filter_map(|key| match key {
            MemberKey::Method(i) => Some(*i),
            MemberKey::Accessor(..) => None,
        })
    }

    /// Indices of properties with at least one designated accessor
    pub fn designated_properties(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.keys().filter_map(|key| match key {
            MemberKey::Accessor(i, Accessor::Get) => Some(*i),
            MemberKey::Accessor(i, Accessor::Set) => {
                // counted once when both accessors are hooked
                (!self.members.contains_key(&MemberKey::Accessor(*i, Accessor::Get))).then_some(*i)
            }
            MemberKey::Method(_) => None,
        })
    }

    /// Whether nothing is designated
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Accumulates designations, enforcing one hook per member
struct Designator<'a> {
    def: &'a TypeDef,
    registry: &'a TypeRegistry,
    table: DesignationTable,
    slot_by_name: FxHashMap<String, usize>,
}

impl<'a> Designator<'a> {
    fn new(def: &'a TypeDef, registry: &'a TypeRegistry) -> Self {
        Self {
            def,
            registry,
            table: DesignationTable::default(),
            slot_by_name: FxHashMap::default(),
        }
    }

    fn designate(&mut self, key: MemberKey, hook: &str) -> EngineResult<()> {
        let label = self.label(key);
        if let Some(&slot) = self.table.members.get(&key) {
            let existing = self.table.hooks[slot].name();
            if existing == hook {
                return Ok(());
            }
            return Err(EngineError::AmbiguousDesignation {
                member: label,
                first: existing.to_string(),
                second: hook.to_string(),
            });
        }

        let slot = match self.slot_by_name.get(hook) {
            Some(&slot) => slot,
            None => {
                let hook_type = self.registry.resolve_hook(hook, &label)?;
                let slot = self.table.hooks.len();
                self.table.hooks.push(hook_type);
                self.slot_by_name.insert(hook.to_string(), slot);
                slot
            }
        };
        self.table.members.insert(key, slot);
        Ok(())
    }

    fn label(&self, key: MemberKey) -> String {
        match key {
            MemberKey::Method(i) => {
                let m = &self.def.methods[i];
                format!("{}.{}({})", self.def.name, m.name, join_types(m.parameter_types()))
            }
            MemberKey::Accessor(i, accessor) => {
                let suffix = match accessor {
                    Accessor::Get => "get",
                    Accessor::Set => "set",
                };
                format!("{}.{}.{}", self.def.name, self.def.properties[i].name, suffix)
            }
        }
    }

    fn finish(self) -> DesignationTable {
        debug!(
            type_name = %self.def.name,
            members = self.table.members.len(),
            hooks = self.table.hooks.len(),
            "resolved designations"
        );
        self.table
    }
}

fn join_types<'a>(types: impl Iterator<Item = &'a TypeRef>) -> String {
    types.map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
}
