//! Type Synthesizer
//!
//! Builds proxy templates from definitions and closes them into runtime
//! types.
//!
//! - **Subclass mode**: the proxy extends the original. Every public member
//!   is inherited; designated members are overridden with intercepted slots,
//!   so they must be virtual.
//! - **Interface mode**: the proxy implements one interface of the original
//!   and exposes exactly that interface's members, routing undesignated ones
//!   straight to the held implementation.

mod dispatch;
mod layout;

use std::sync::Arc;

use tracing::debug;
use weave_sdk::{Accessor, TypeRef};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::generic::{self, GenericBinding};
use crate::marker::DesignationTable;
use crate::model::TypeDef;
use crate::module::TypeModule;

pub(crate) use dispatch::Frame;
pub(crate) use layout::MemberPlan;
pub use layout::{
    FieldLayout, GenerationMode, MethodSlot, Origin, PropertySlot, ProxyTemplate, Route,
    RuntimeType,
};

use layout::{
    close_constructors, close_members, index_methods, index_properties, MethodPlan, PropertyPlan,
};

/// Requested generation mode, with the interface definition resolved
#[derive(Debug, Clone)]
pub enum SynthesisMode {
    /// Extend the original
    Subclass,
    /// Implement this interface
    Interface(Arc<TypeDef>),
}

impl SynthesisMode {
    /// Cache-key form of the mode
    pub fn key(&self) -> GenerationMode {
        match self {
            SynthesisMode::Subclass => GenerationMode::Subclass,
            SynthesisMode::Interface(iface) => GenerationMode::Interface(iface.name.clone()),
        }
    }
}

/// Builds and closes proxy types
pub struct Synthesizer<'a> {
    module: &'a TypeModule,
    config: &'a EngineConfig,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer registering into `module`
    pub fn new(module: &'a TypeModule, config: &'a EngineConfig) -> Self {
        Self { module, config }
    }

    /// Synthesize the template of `def` in `mode` with the given designations
    pub fn synthesize(
        &self,
        def: &Arc<TypeDef>,
        mode: &SynthesisMode,
        designations: &DesignationTable,
    ) -> EngineResult<ProxyTemplate> {
        let (plan, interface) = match mode {
            SynthesisMode::Subclass => (subclass_plan(def, designations)?, None),
            SynthesisMode::Interface(iface) => {
                let (plan, declared) = interface_plan(def, iface, designations)?;
                (plan, Some(declared))
            }
        };

        let (id, name) = self
            .module
            .reserve_template(&self.config.naming.proxy_name(&def.name));

        debug!(
            template = id,
            name = %name,
            definition = %def.name,
            mode = %mode.key(),
            methods = plan.methods.len(),
            properties = plan.properties.len(),
            hooks = designations.hooks().len(),
            "synthesized proxy template"
        );

        Ok(ProxyTemplate {
            id,
            name,
            definition: Arc::clone(def),
            mode: mode.key(),
            generic_params: generic::mirror_params(def),
            interface,
            plan,
            hooks: designations.hooks().to_vec(),
        })
    }

    /// Close `template` over `args` and register the result in the module.
    /// `parent` is the closed original type in subclass mode.
    pub fn close(
        &self,
        template: &ProxyTemplate,
        args: &[TypeRef],
        parent: Option<Arc<RuntimeType>>,
    ) -> EngineResult<Arc<RuntimeType>> {
        let def = &template.definition;
        let binding =
            GenericBinding::for_params(&template.name, &template.generic_params, args)?;
        let declaring = binding.bind(&def.type_ref());
        let (methods, properties) = close_members(def, &template.plan, &binding, &declaring);
        let interfaces = template
            .interface
            .iter()
            .map(|iface| binding.bind(iface))
            .collect();

        let ty = Arc::new(RuntimeType {
            id: self.module.allocate_type_id(),
            type_ref: TypeRef::generic(template.name.clone(), args.iter().cloned()),
            definition: Arc::clone(def),
            fields: layout::FieldLayout::new(def, &binding),
            constructors: close_constructors(def, &binding),
            method_index: index_methods(&methods),
            property_index: index_properties(&properties),
            methods,
            properties,
            hooks: template.hooks.clone(),
            parent,
            interfaces,
            origin: Origin::Proxy {
                template: template.id,
                mode: template.mode.clone(),
            },
            binding,
            trace_invocations: self.config.trace_invocations,
        });

        debug!(
            id = ty.id,
            name = %ty.type_ref,
            template = template.id,
            "closed proxy type"
        );
        self.module.register(Arc::clone(&ty));
        Ok(ty)
    }

    /// Close the original definition `def` over `args`
    pub fn close_original(&self, def: &Arc<TypeDef>, args: &[TypeRef]) -> EngineResult<Arc<RuntimeType>> {
        let binding = GenericBinding::new(def, args)?;
        let type_ref = binding.bind(&def.type_ref());
        let plan = MemberPlan::direct(def);
        let (methods, properties) = close_members(def, &plan, &binding, &type_ref);
        let interfaces = binding.bind_all(&def.interfaces);

        let ty = Arc::new(RuntimeType {
            id: self.module.allocate_type_id(),
            type_ref,
            definition: Arc::clone(def),
            fields: layout::FieldLayout::new(def, &binding),
            constructors: close_constructors(def, &binding),
            method_index: index_methods(&methods),
            property_index: index_properties(&properties),
            methods,
            properties,
            hooks: Vec::new(),
            parent: None,
            interfaces,
            origin: Origin::Original,
            binding,
            trace_invocations: false,
        });
        debug!(id = ty.id, name = %ty.type_ref, "closed original type");
        Ok(ty)
    }
}

/// Subclass mode: inherit every public member, override designated ones
fn subclass_plan(def: &TypeDef, designations: &DesignationTable) -> EngineResult<MemberPlan> {
    let not_overridable = |member: &str| EngineError::NotOverridable {
        type_name: def.name.clone(),
        member: member.to_string(),
    };

    for index in designations.designated_methods() {
        let method = &def.methods[index];
        if !method.is_virtual {
            return Err(not_overridable(&method.name));
        }
    }
    for index in designations.designated_properties() {
        let prop = &def.properties[index];
        if !prop.is_virtual {
            return Err(not_overridable(&prop.name));
        }
    }

    let mut plan = MemberPlan::direct(def);
    apply_routes(&mut plan, designations);
    Ok(plan)
}

/// Interface mode: expose exactly the interface's members, each matched to
/// the implementation member with the same name and signature
fn interface_plan(
    def: &TypeDef,
    iface: &TypeDef,
    designations: &DesignationTable,
) -> EngineResult<(MemberPlan, TypeRef)> {
    let not_implemented = || EngineError::InterfaceNotImplemented {
        interface: iface.type_ref(),
        implementation: def.type_ref(),
    };

    let binding = generic::interface_binding(def, iface).ok_or_else(not_implemented)?;
    let declared = def
        .interface_named(&iface.name)
        .cloned()
        .ok_or_else(not_implemented)?;

    let mut plan = MemberPlan::default();

    for sig in &iface.methods {
        let params = binding.bind_all(sig.parameter_types());
        let ret = binding.bind(&sig.return_type);
        let index = def
            .public_methods_named(&sig.name)
            .find(|&i| def.methods[i].has_signature(&params) && def.methods[i].return_type == ret)
            .ok_or_else(not_implemented)?;
        plan.methods.push(MethodPlan {
            index,
            route: Route::Direct,
        });
    }

    for sig in &iface.properties {
        let ty = binding.bind(&sig.type_ref);
        let index = def
            .property_index(&sig.name)
            .filter(|&i| def.properties[i].type_ref == ty)
            .ok_or_else(not_implemented)?;
        let prop = &def.properties[index];
        if (sig.can_read() && !prop.can_read()) || (sig.can_write() && !prop.can_write()) {
            return Err(not_implemented());
        }
        plan.properties.push(PropertyPlan {
            index,
            getter: sig.can_read().then_some(Route::Direct),
            setter: sig.can_write().then_some(Route::Direct),
        });
    }

    apply_routes(&mut plan, designations);
    Ok((plan, declared))
}

/// Route designated members of `plan` through their hook slots
fn apply_routes(plan: &mut MemberPlan, designations: &DesignationTable) {
    for method in &mut plan.methods {
        method.route = Route::from_slot(designations.method_hook(method.index));
    }
    for prop in &mut plan.properties {
        if prop.getter.is_some() {
            prop.getter = Some(Route::from_slot(
                designations.accessor_hook(prop.index, Accessor::Get),
            ));
        }
        if prop.setter.is_some() {
            prop.setter = Some(Route::from_slot(
                designations.accessor_hook(prop.index, Accessor::Set),
            ));
        }
    }
}
