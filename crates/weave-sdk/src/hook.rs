//! Hook trait: the two-phase interception contract
//!
//! A hook wraps designated members of a proxied type. The engine builds one
//! instance of every distinct hook type per proxy object (never per call) and
//! drives it synchronously:
//!
//! ```text
//! caller ─▶ before(ctx) ─▶ original member ─▶ after(ctx) ─▶ caller
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::CallContext;
use crate::error::BoxError;
use crate::value::Value;

/// Trait implemented by interceptors
///
/// Both phases have defaults, so a hook only overrides what it needs.
/// Implementations that keep mutable state are responsible for their own
/// synchronization.
pub trait Hook: Send + Sync {
    /// Runs before the original member. May rewrite `ctx.args_mut()` or the
    /// property value being assigned.
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        let _ = ctx;
        Ok(())
    }

    /// Runs after the original member. The returned value becomes the
    /// member's final result.
    fn after(&self, ctx: &mut CallContext) -> Result<Value, BoxError> {
        Ok(ctx.default_outcome())
    }
}

/// A hook that changes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl Hook for NoopHook {}

/// Parameterless constructor for a hook type
pub type HookFactory = Arc<dyn Fn() -> Box<dyn Hook> + Send + Sync>;

/// A named, instantiable hook type
#[derive(Clone)]
pub struct HookType {
    name: String,
    factory: HookFactory,
}

impl HookType {
    /// Hook type built through `Default`
    pub fn of<H>(name: impl Into<String>) -> Self
    where
        H: Hook + Default + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(|| Box::new(H::default())),
        }
    }

    /// Hook type built through an explicit factory
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Hook> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
        }
    }

    /// Hook type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct a fresh instance
    pub fn instantiate(&self) -> Box<dyn Hook> {
        (self.factory)()
    }
}

impl fmt::Debug for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookType").field("name", &self.name).finish()
    }
}
