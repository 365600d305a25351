//! Type Module
//!
//! The append-only sink every synthesized type is registered in. It hands out
//! ids for runtime types and templates and unique names for templates. The
//! mutex is held only while a name is reserved or a finished type appended;
//! synthesis and closing happen outside it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::synth::RuntimeType;

/// Runtime type id
pub type TypeId = u32;

/// Proxy template id
pub type TemplateId = u32;

/// First id handed to runtime types
pub const TYPE_ID_BASE: TypeId = 1;

/// First id handed to proxy templates
pub const TEMPLATE_ID_BASE: TemplateId = 1;

#[derive(Default)]
struct ModuleState {
    /// Registered synthesized types, in registration order
    types: Vec<Arc<RuntimeType>>,
    /// Display name to index in `types`
    name_to_index: FxHashMap<String, usize>,
    /// Reserved template names with the number of reservations seen
    template_names: FxHashMap<String, u32>,
}

/// Sink for synthesized type definitions
pub struct TypeModule {
    state: Mutex<ModuleState>,
    next_type_id: AtomicU32,
    next_template_id: AtomicU32,
}

impl TypeModule {
    /// Create an empty module
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ModuleState::default()),
            next_type_id: AtomicU32::new(TYPE_ID_BASE),
            next_template_id: AtomicU32::new(TEMPLATE_ID_BASE),
        }
    }

    /// Allocate a runtime type id
    pub fn allocate_type_id(&self) -> TypeId {
        self.next_type_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocate a template id and reserve a unique template name derived
    /// from `base` (`base`, then `base_2`, `base_3`, ...)
    pub fn reserve_template(&self, base: &str) -> (TemplateId, String) {
        let id = self.next_template_id.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.lock();
        let seen = state.template_names.entry(base.to_string()).or_insert(0);
        *seen += 1;
        let name = if *seen == 1 {
            base.to_string()
        } else {
            format!("{}_{}", base, seen)
        };
        (id, name)
    }

    /// Append a finished synthesized type
    pub fn register(&self, ty: Arc<RuntimeType>) {
        let name = ty.name();
        let mut state = self.state.lock();
        let index = state.types.len();
        state.name_to_index.insert(name.clone(), index);
        state.types.push(ty);
        drop(state);
        debug!(name = %name, index, "registered synthesized type");
    }

    /// Synthesized type by display name
    pub fn get(&self, name: &str) -> Option<Arc<RuntimeType>> {
        let state = self.state.lock();
        state
            .name_to_index
            .get(name)
            .map(|&i| Arc::clone(&state.types[i]))
    }

    /// Snapshot of every registered type
    pub fn types(&self) -> Vec<Arc<RuntimeType>> {
        self.state.lock().types.clone()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.state.lock().types.len()
    }

    /// Whether no type has been registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeModule {
    fn default() -> Self {
        Self::new()
    }
}
