//! Type Registry
//!
//! Holds every type definition and hook type known to an engine, indexed by
//! name. Definitions are immutable once registered and handed out as `Arc`s.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;
use weave_sdk::HookType;

use crate::error::{EngineError, EngineResult};
use crate::model::TypeDef;

#[derive(Default)]
struct RegistryState {
    /// Definitions in registration order
    defs: Vec<Arc<TypeDef>>,
    /// Name to index in `defs`
    name_to_index: FxHashMap<String, usize>,
    /// Hook types by name
    hooks: FxHashMap<String, HookType>,
}

/// Registry of type definitions and hook types
#[derive(Default)]
pub struct TypeRegistry {
    state: RwLock<RegistryState>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class or interface definition
    pub fn register(&self, def: TypeDef) -> EngineResult<Arc<TypeDef>> {
        let mut state = self.state.write();
        if state.name_to_index.contains_key(&def.name) || state.hooks.contains_key(&def.name) {
            return Err(EngineError::DuplicateType(def.name));
        }
        let def = Arc::new(def);
        let index = state.defs.len();
        state.name_to_index.insert(def.name.clone(), index);
        state.defs.push(Arc::clone(&def));
        debug!(
            name = %def.name,
            kind = ?def.kind,
            interceptable = def.interceptable,
            "registered type definition"
        );
        Ok(def)
    }

    /// Register a hook type under its own name
    pub fn register_hook(&self, hook: HookType) -> EngineResult<()> {
        let mut state = self.state.write();
        let name = hook.name().to_string();
        if state.hooks.contains_key(&name) || state.name_to_index.contains_key(&name) {
            return Err(EngineError::DuplicateType(name));
        }
        debug!(name = %name, "registered hook type");
        state.hooks.insert(name, hook);
        Ok(())
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> EngineResult<Arc<TypeDef>> {
        let state = self.state.read();
        state
            .name_to_index
            .get(name)
            .map(|&i| Arc::clone(&state.defs[i]))
            .ok_or_else(|| EngineError::TypeNotFound(name.to_string()))
    }

    /// Look up a hook type by name
    pub fn hook(&self, name: &str) -> Option<HookType> {
        self.state.read().hooks.get(name).cloned()
    }

    /// Resolve the hook type designated on `member`
    pub fn resolve_hook(&self, name: &str, member: &str) -> EngineResult<HookType> {
        self.hook(name).ok_or_else(|| EngineError::InvalidHookKind {
            hook: name.to_string(),
            member: member.to_string(),
        })
    }

    /// Whether a definition or hook type with this name exists
    pub fn contains(&self, name: &str) -> bool {
        let state = self.state.read();
        state.name_to_index.contains_key(name) || state.hooks.contains_key(name)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.state.read().defs.len()
    }

    /// Whether no definitions are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
