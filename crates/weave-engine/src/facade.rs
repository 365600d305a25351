//! Public facade
//!
//! [`Engine`] owns the type registry, the type module and the proxy cache.
//! It validates creation requests, picks the generation mode, goes through
//! the cache (synthesizing on a miss) and instantiates the result.
//!
//! Requests for types that do not carry the interceptable marker are not an
//! error: they yield plain instances of the original type.

use std::sync::Arc;

use tracing::debug;
use weave_sdk::{HookType, TypeRef, Value};

use crate::cache::{ClosedKey, ProxyCache, TemplateKey};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generic::{self, GenericBinding};
use crate::marker::{DeclarativeTable, DesignationSource, DesignationTable};
use crate::marshal;
use crate::model::{TypeDef, TypeRegistry};
use crate::module::TypeModule;
use crate::object::Object;
use crate::synth::{ProxyTemplate, RuntimeType, SynthesisMode, Synthesizer};

/// Where a subclass proxy takes its designations from
enum Designations<'t> {
    Inline,
    Declarative(&'t DeclarativeTable),
}

impl Designations<'_> {
    fn source(&self) -> DesignationSource {
        match self {
            Designations::Inline => DesignationSource::Inline,
            Designations::Declarative(table) => DesignationSource::Declarative((*table).clone()),
        }
    }
}

/// The interception engine
pub struct Engine {
    config: EngineConfig,
    registry: TypeRegistry,
    module: TypeModule,
    cache: ProxyCache,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with `config`
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            registry: TypeRegistry::new(),
            module: TypeModule::new(),
            cache: ProxyCache::new(),
        }
    }

    /// Configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Sink of synthesized types
    pub fn module(&self) -> &TypeModule {
        &self.module
    }

    /// Proxy cache
    pub fn cache(&self) -> &ProxyCache {
        &self.cache
    }

    /// Register a class or interface definition
    pub fn register(&self, def: TypeDef) -> EngineResult<Arc<TypeDef>> {
        self.registry.register(def)
    }

    /// Register a hook type
    pub fn register_hook(&self, hook: HookType) -> EngineResult<()> {
        self.registry.register_hook(hook)
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Proxy of `class` built with `args`, wrapping the members its inline
    /// markers designate. Unmarked classes yield plain instances.
    pub fn create_proxy_of_class(&self, class: &TypeRef, args: Vec<Value>) -> EngineResult<Object> {
        let (def, type_args) = self.class_request(class)?;
        check_constructor(&def, &type_args, &args)?;
        let ty = if def.interceptable {
            self.subclass_type(&def, &type_args, Designations::Inline)?
        } else {
            self.original_type(&def, &type_args)?
        };
        Object::construct(&ty, args)
    }

    /// Proxy exposing `interface`, backed by an instance of `implementation`
    /// built with `args`. An unmarked implementation yields a plain instance.
    pub fn create_proxy_of_interface(
        &self,
        interface: &TypeRef,
        implementation: &TypeRef,
        args: Vec<Value>,
    ) -> EngineResult<Object> {
        let (def, type_args) = self.class_request(implementation)?;
        let iface = self.interface_request(interface, &def, &type_args)?;
        check_constructor(&def, &type_args, &args)?;
        let ty = if def.interceptable {
            self.interface_type(&def, &type_args, iface)?
        } else {
            self.original_type(&def, &type_args)?
        };
        Object::construct(&ty, args)
    }

    /// Proxy of `class` whose designations come from `table` instead of
    /// inline markers; the class need not be marked interceptable.
    pub fn create_proxy_of_type(
        &self,
        class: &TypeRef,
        table: &DeclarativeTable,
        args: Vec<Value>,
    ) -> EngineResult<Object> {
        let (def, type_args) = self.class_request(class)?;
        check_constructor(&def, &type_args, &args)?;
        let ty = self.subclass_type(&def, &type_args, Designations::Declarative(table))?;
        Object::construct(&ty, args)
    }

    /// Runtime type a container should register for `service`: a subclass
    /// proxy when `service` and `implementation` are the same type, an
    /// interface proxy otherwise, and the original implementation type when
    /// it is not marked interceptable.
    pub fn proxy_or_passthrough(
        &self,
        service: &TypeRef,
        implementation: &TypeRef,
    ) -> EngineResult<Arc<RuntimeType>> {
        let (def, type_args) = self.class_request(implementation)?;
        if !def.interceptable {
            return self.original_type(&def, &type_args);
        }
        if service == implementation {
            self.subclass_type(&def, &type_args, Designations::Inline)
        } else {
            let iface = self.interface_request(service, &def, &type_args)?;
            self.interface_type(&def, &type_args, iface)
        }
    }

    /// Construct an instance of a runtime type
    pub fn instantiate(&self, ty: &Arc<RuntimeType>, args: Vec<Value>) -> EngineResult<Object> {
        Object::construct(ty, args)
    }

    /// Original runtime type of a closed class reference
    pub fn resolve(&self, class: &TypeRef) -> EngineResult<Arc<RuntimeType>> {
        let (def, type_args) = self.class_request(class)?;
        self.original_type(&def, &type_args)
    }

    /// Plain, unproxied instance of `class`
    pub fn create_instance(&self, class: &TypeRef, args: Vec<Value>) -> EngineResult<Object> {
        let ty = self.resolve(class)?;
        Object::construct(&ty, args)
    }

    // ========================================================================
    // Request validation
    // ========================================================================

    /// Resolve an instantiable, closed class reference
    fn class_request(&self, class: &TypeRef) -> EngineResult<(Arc<TypeDef>, Vec<TypeRef>)> {
        let name = class
            .name()
            .ok_or_else(|| EngineError::TypeNotFound(class.to_string()))?;
        let def = self.registry.get(name)?;
        if def.is_interface() {
            return Err(EngineError::NotInstantiable(class.clone()));
        }
        let type_args = generic::closed_args(&def, class)?;
        Ok((def, type_args))
    }

    /// Resolve `interface` and check that `def` closed over `type_args`
    /// implements exactly that instantiation
    fn interface_request(
        &self,
        interface: &TypeRef,
        def: &TypeDef,
        type_args: &[TypeRef],
    ) -> EngineResult<Arc<TypeDef>> {
        let name = interface
            .name()
            .ok_or_else(|| EngineError::NotAnInterface(interface.clone()))?;
        let iface = self.registry.get(name)?;
        if !iface.is_interface() {
            return Err(EngineError::NotAnInterface(interface.clone()));
        }
        generic::closed_args(&iface, interface)?;

        let binding = GenericBinding::new(def, type_args)?;
        let implemented = def
            .interface_named(name)
            .map(|declared| binding.bind(declared));
        if implemented.as_ref() != Some(interface) {
            return Err(EngineError::InterfaceNotImplemented {
                interface: interface.clone(),
                implementation: binding.bind(&def.type_ref()),
            });
        }
        Ok(iface)
    }

    // ========================================================================
    // Cached synthesis
    // ========================================================================

    fn original_type(&self, def: &Arc<TypeDef>, type_args: &[TypeRef]) -> EngineResult<Arc<RuntimeType>> {
        self.cache.original(&def.name, type_args, || {
            self.synthesizer().close_original(def, type_args)
        })
    }

    fn subclass_type(
        &self,
        def: &Arc<TypeDef>,
        type_args: &[TypeRef],
        designations: Designations<'_>,
    ) -> EngineResult<Arc<RuntimeType>> {
        let key = TemplateKey {
            definition: def.name.clone(),
            mode: SynthesisMode::Subclass.key(),
            source: designations.source(),
        };
        let template = self.cache.template(key, || {
            let table = match designations {
                Designations::Inline => DesignationTable::from_inline(def, &self.registry)?,
                Designations::Declarative(table) => {
                    DesignationTable::from_declarative(def, table, &self.registry)?
                }
            };
            self.synthesizer()
                .synthesize(def, &SynthesisMode::Subclass, &table)
                .map(Arc::new)
        })?;
        let parent = self.original_type(def, type_args)?;
        self.closed_type(&template, type_args, Some(parent))
    }

    fn interface_type(
        &self,
        def: &Arc<TypeDef>,
        type_args: &[TypeRef],
        iface: Arc<TypeDef>,
    ) -> EngineResult<Arc<RuntimeType>> {
        let mode = SynthesisMode::Interface(iface);
        let key = TemplateKey {
            definition: def.name.clone(),
            mode: mode.key(),
            source: DesignationSource::Inline,
        };
        let template = self.cache.template(key, || {
            let table = DesignationTable::from_inline(def, &self.registry)?;
            self.synthesizer().synthesize(def, &mode, &table).map(Arc::new)
        })?;
        self.closed_type(&template, type_args, None)
    }

    fn closed_type(
        &self,
        template: &Arc<ProxyTemplate>,
        type_args: &[TypeRef],
        parent: Option<Arc<RuntimeType>>,
    ) -> EngineResult<Arc<RuntimeType>> {
        let key = ClosedKey {
            template: template.id(),
            args: type_args.to_vec(),
        };
        self.cache.closed(key, || {
            debug!(template = %template.name(), args = type_args.len(), "closing proxy template");
            self.synthesizer().close(template, type_args, parent)
        })
    }

    fn synthesizer(&self) -> Synthesizer<'_> {
        Synthesizer::new(&self.module, &self.config)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail with `ConstructorNotFound` unless a public constructor of `def`
/// closed over `type_args` accepts `args` exactly
fn check_constructor(def: &TypeDef, type_args: &[TypeRef], args: &[Value]) -> EngineResult<()> {
    let binding = GenericBinding::new(def, type_args)?;
    let found = def.public_constructors().any(|ctor| {
        let params = binding.bind_all(ctor.parameter_types());
        marshal::signature_matches(&params, args)
    });
    if found {
        Ok(())
    } else {
        Err(EngineError::ConstructorNotFound {
            type_ref: binding.bind(&def.type_ref()),
            arg_types: marshal::arg_type_names(args),
        })
    }
}
