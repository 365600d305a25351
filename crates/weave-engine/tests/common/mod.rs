//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use weave_engine::{
    BoxError, CallContext, ClassBuilder, ConstructorDefinition, Engine, Hook, HookType,
    InterfaceBuilder, MethodDefinition, PropertyDefinition, TypeRef, Value,
};

/// Adds one to every integer argument, adds 666 to integer results
#[derive(Default)]
pub struct Log;

impl Hook for Log {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        for arg in ctx.args_mut() {
            if let Value::Int(i) = arg {
                *i += 1;
            }
        }
        Ok(())
    }

    fn after(&self, ctx: &mut CallContext) -> Result<Value, BoxError> {
        Ok(match ctx.default_outcome() {
            Value::Int(i) => Value::Int(i + 666),
            other => other,
        })
    }
}

/// Ignores the original result
#[derive(Default)]
pub struct Constant;

impl Hook for Constant {
    fn after(&self, _ctx: &mut CallContext) -> Result<Value, BoxError> {
        Ok(Value::Int(42))
    }
}

/// Shared, ordered event log
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// Records both phases, with the member and accessor involved
pub struct Recorder {
    events: Events,
}

impl Hook for Recorder {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        self.events.push(format!("before:{}{}", ctx.member_name(), accessor_suffix(ctx)));
        Ok(())
    }

    fn after(&self, ctx: &mut CallContext) -> Result<Value, BoxError> {
        self.events.push(format!("after:{}{}", ctx.member_name(), accessor_suffix(ctx)));
        Ok(ctx.default_outcome())
    }
}

fn accessor_suffix(ctx: &CallContext) -> &'static str {
    match ctx.accessor() {
        Some(weave_engine::Accessor::Get) => ".get",
        Some(weave_engine::Accessor::Set) => ".set",
        None => "",
    }
}

/// Hook type building recorders over `events`, counting instantiations
pub fn recorder_type(events: &Events, built: &Arc<AtomicUsize>) -> HookType {
    let events = events.clone();
    let built = Arc::clone(built);
    HookType::with_factory("Recorder", move || {
        built.fetch_add(1, Ordering::SeqCst);
        Box::new(Recorder {
            events: events.clone(),
        })
    })
}

/// `Test`: the interceptable class most tests proxy
///
/// - `sum(a, b)` hooked by `Log`
/// - `echo(s)` hooked by `Recorder`, logs `body:echo`
/// - `twice(n)` unhooked
/// - `A: string` with only the getter hooked by `Recorder`
/// - `B: string` with both accessors hooked by `Recorder`
/// - constructors `()` and `(name: string)`
pub fn test_class(events: &Events) -> weave_engine::TypeDef {
    let body_events = events.clone();
    ClassBuilder::new("Test")
        .interceptable()
        .implements(TypeRef::named("ITest"))
        .field(weave_engine::FieldDefinition::new("name", TypeRef::Str))
        .constructor(ConstructorDefinition::new())
        .constructor(
            ConstructorDefinition::new()
                .with_param("name", TypeRef::Str)
                .body(|this, args| Ok(this.set_field("name", args[0].clone())?)),
        )
        .method(
            MethodDefinition::new("sum")
                .with_param("a", TypeRef::Int)
                .with_param("b", TypeRef::Int)
                .returns(TypeRef::Int)
                .as_virtual()
                .hooked("Log")
                .body(|_, args| {
                    let a = args[0].as_int().unwrap_or_default();
                    let b = args[1].as_int().unwrap_or_default();
                    Ok(Value::Int(a + b))
                }),
        )
        .method(
            MethodDefinition::new("echo")
                .with_param("s", TypeRef::Str)
                .returns(TypeRef::Str)
                .as_virtual()
                .hooked("Recorder")
                .body(move |_, args| {
                    body_events.push("body:echo");
                    Ok(args[0].clone())
                }),
        )
        .method(
            MethodDefinition::new("twice")
                .with_param("n", TypeRef::Int)
                .returns(TypeRef::Int)
                .body(|_, args| Ok(Value::Int(args[0].as_int().unwrap_or_default() * 2))),
        )
        .method(
            MethodDefinition::new("name")
                .returns(TypeRef::Str)
                .body(|this, _| Ok(this.field("name")?.clone())),
        )
        .property(
            PropertyDefinition::auto("A", TypeRef::Str)
                .as_virtual()
                .hooked_getter("Recorder"),
        )
        .property(PropertyDefinition::auto("B", TypeRef::Str).as_virtual().hooked("Recorder"))
        .build()
}

/// `ITest`: the part of `Test` exposed in interface mode
pub fn itest() -> weave_engine::TypeDef {
    InterfaceBuilder::new("ITest")
        .method(
            MethodDefinition::new("sum")
                .with_param("a", TypeRef::Int)
                .with_param("b", TypeRef::Int)
                .returns(TypeRef::Int),
        )
        .property(PropertyDefinition::new("A", TypeRef::Str).readable().writable())
        .build()
}

/// Engine with `Log`, `Constant` and `Recorder` hooks plus `Test`/`ITest`
pub struct Fixture {
    pub engine: Engine,
    pub events: Events,
    pub built: Arc<AtomicUsize>,
}

pub fn fixture() -> Fixture {
    fixture_with(Engine::new())
}

pub fn fixture_with(engine: Engine) -> Fixture {
    let events = Events::default();
    let built = Arc::new(AtomicUsize::new(0));
    engine.register_hook(HookType::of::<Log>("Log")).unwrap();
    engine.register_hook(HookType::of::<Constant>("Constant")).unwrap();
    engine.register_hook(recorder_type(&events, &built)).unwrap();
    engine.register(test_class(&events)).unwrap();
    engine.register(itest()).unwrap();
    Fixture {
        engine,
        events,
        built,
    }
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| Value::Int(v)).collect()
}
