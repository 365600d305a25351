//! Method and property interception through subclass-mode proxies

mod common;

use std::error::Error;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{fixture, fixture_with, ints, Events};
use weave_engine::{
    BoxError, CallContext, ClassBuilder, Engine, EngineConfig, Hook, HookType, InvokeError,
    MethodDefinition, Origin, PropertyDefinition, TypeRef, Value,
};

fn test_ref() -> TypeRef {
    TypeRef::named("Test")
}

// ============================================================================
// Methods
// ============================================================================

#[test]
fn test_sum_is_670() {
    let fx = fixture();
    let mut test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    // before: 1 + 1 -> 2 + 2; body: 4; after: 4 + 666
    let sum: i64 = test.call("sum", ints(&[1, 1])).unwrap();
    assert_eq!(sum, 670);
}

#[test]
fn test_plain_instance_is_not_intercepted() {
    let fx = fixture();
    let mut test = fx.engine.create_instance(&test_ref(), vec![]).unwrap();

    assert!(!test.is_proxy());
    assert_eq!(test.call::<i64>("sum", ints(&[1, 1])).unwrap(), 2);
}

#[test]
fn test_phases_run_in_order_once_per_call() {
    let fx = fixture();
    let mut test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    for _ in 0..2 {
        let echoed: String = test.call("echo", vec!["hi".into()]).unwrap();
        assert_eq!(echoed, "hi");
        assert_eq!(fx.events.take(), vec!["before:echo", "body:echo", "after:echo"]);
    }
}

#[test]
fn test_undesignated_members_pass_through() {
    let fx = fixture();
    let mut test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    assert_eq!(test.call::<i64>("twice", ints(&[21])).unwrap(), 42);
    assert!(fx.events.take().is_empty());
}

#[test]
fn test_constant_after_replaces_result() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<common::Constant>("Constant")).unwrap();
    engine
        .register(
            ClassBuilder::new("Calc")
                .interceptable()
                .method(
                    MethodDefinition::new("compute")
                        .with_param("n", TypeRef::Int)
                        .returns(TypeRef::Int)
                        .as_virtual()
                        .hooked("Constant")
                        .body(|_, args| Ok(args[0].clone())),
                )
                .build(),
        )
        .unwrap();

    let mut calc = engine
        .create_proxy_of_class(&TypeRef::named("Calc"), vec![])
        .unwrap();
    for n in [0, 7, -3] {
        assert_eq!(calc.call::<i64>("compute", ints(&[n])).unwrap(), 42);
    }
}

#[derive(Default)]
struct Rewrite;

impl Hook for Rewrite {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        ctx.set_arg(0, 10i64)?;
        Ok(())
    }
}

#[test]
fn test_argument_rewrite_reaches_body() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<Rewrite>("Rewrite")).unwrap();
    engine
        .register(
            ClassBuilder::new("Echo")
                .interceptable()
                .method(
                    MethodDefinition::new("id")
                        .with_param("n", TypeRef::Int)
                        .returns(TypeRef::Int)
                        .as_virtual()
                        .hooked("Rewrite")
                        .body(|_, args| Ok(args[0].clone())),
                )
                .build(),
        )
        .unwrap();

    let mut echo = engine
        .create_proxy_of_class(&TypeRef::named("Echo"), vec![])
        .unwrap();
    assert_eq!(echo.call::<i64>("id", ints(&[1])).unwrap(), 10);
}

#[derive(Default)]
struct BadRewrite;

impl Hook for BadRewrite {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        ctx.set_arg(0, "not an int")?;
        Ok(())
    }

    fn after(&self, _ctx: &mut CallContext) -> Result<Value, BoxError> {
        Ok(Value::Str("not an int either".into()))
    }
}

#[test]
fn test_rewrite_to_wrong_type_is_argument_mismatch() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<BadRewrite>("BadRewrite")).unwrap();
    engine
        .register(
            ClassBuilder::new("Echo")
                .interceptable()
                .method(
                    MethodDefinition::new("id")
                        .with_param("n", TypeRef::Int)
                        .returns(TypeRef::Int)
                        .as_virtual()
                        .hooked("BadRewrite")
                        .body(|_, args| Ok(args[0].clone())),
                )
                .build(),
        )
        .unwrap();

    let mut echo = engine
        .create_proxy_of_class(&TypeRef::named("Echo"), vec![])
        .unwrap();
    let err = echo.invoke("id", ints(&[1])).unwrap_err();
    assert!(matches!(err, InvokeError::ArgumentMismatch { index: 0, ref expected, .. } if *expected == TypeRef::Int));
}

#[test]
fn test_after_of_wrong_type_is_return_mismatch() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<common::Constant>("Constant")).unwrap();
    engine
        .register(
            ClassBuilder::new("Greeter")
                .interceptable()
                .method(
                    MethodDefinition::new("greet")
                        .returns(TypeRef::Str)
                        .as_virtual()
                        .hooked("Constant")
                        .body(|_, _| Ok(Value::Str("hello".into()))),
                )
                .build(),
        )
        .unwrap();

    let mut greeter = engine
        .create_proxy_of_class(&TypeRef::named("Greeter"), vec![])
        .unwrap();
    assert!(matches!(
        greeter.invoke("greet", vec![]),
        Err(InvokeError::ReturnMismatch { .. })
    ));
}

#[test]
fn test_void_method_discards_after_value() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<common::Constant>("Constant")).unwrap();
    engine
        .register(
            ClassBuilder::new("Counter")
                .interceptable()
                .field(weave_engine::FieldDefinition::new("count", TypeRef::Int))
                .method(
                    MethodDefinition::new("bump")
                        .as_virtual()
                        .hooked("Constant")
                        .body(|this, _| {
                            let count: i64 = this.field_as("count")?;
                            this.set_field("count", count + 1)?;
                            Ok(Value::Null)
                        }),
                )
                .build(),
        )
        .unwrap();

    let mut counter = engine
        .create_proxy_of_class(&TypeRef::named("Counter"), vec![])
        .unwrap();
    assert_eq!(counter.invoke("bump", vec![]).unwrap(), Value::Null);
    counter.invoke("bump", vec![]).unwrap();
    assert_eq!(counter.field("count"), Some(&Value::Int(2)));
}

// ============================================================================
// Errors raised by hooks and bodies
// ============================================================================

#[derive(Debug)]
struct Denied;

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("denied")
    }
}

impl Error for Denied {}

#[derive(Default)]
struct Guard;

impl Hook for Guard {
    fn before(&self, _ctx: &mut CallContext) -> Result<(), BoxError> {
        Err(Box::new(Denied))
    }
}

#[test]
fn test_hook_error_propagates_unmodified() {
    let events = Events::default();
    let body_events = events.clone();
    let engine = Engine::new();
    engine.register_hook(HookType::of::<Guard>("Guard")).unwrap();
    engine
        .register(
            ClassBuilder::new("Vault")
                .interceptable()
                .method(
                    MethodDefinition::new("open")
                        .as_virtual()
                        .hooked("Guard")
                        .body(move |_, _| {
                            body_events.push("opened");
                            Ok(Value::Null)
                        }),
                )
                .build(),
        )
        .unwrap();

    let mut vault = engine
        .create_proxy_of_class(&TypeRef::named("Vault"), vec![])
        .unwrap();
    match vault.invoke("open", vec![]) {
        Err(InvokeError::Raised(err)) => assert!(err.downcast_ref::<Denied>().is_some()),
        other => panic!("expected raised error, got {:?}", other),
    }
    assert!(events.take().is_empty());
}

#[test]
fn test_body_error_propagates() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<common::Log>("Log")).unwrap();
    engine
        .register(
            ClassBuilder::new("Faulty")
                .interceptable()
                .method(
                    MethodDefinition::new("fail")
                        .as_virtual()
                        .hooked("Log")
                        .body(|_, _| Err(Box::new(Denied))),
                )
                .build(),
        )
        .unwrap();

    let mut faulty = engine
        .create_proxy_of_class(&TypeRef::named("Faulty"), vec![])
        .unwrap();
    let err = faulty.invoke("fail", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "denied");
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_getter_only_designation() {
    let fx = fixture();
    let mut test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    test.set("A", "x").unwrap();
    test.set("A", "y").unwrap();
    assert!(fx.events.take().is_empty());

    assert_eq!(test.get_as::<String>("A").unwrap(), "y");
    assert_eq!(fx.events.take(), vec!["before:A.get", "after:A.get"]);
}

#[test]
fn test_property_level_designation_covers_both_accessors() {
    let fx = fixture();
    let mut test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    test.set("B", "v").unwrap();
    assert_eq!(test.get("B").unwrap(), Value::Str("v".into()));
    assert_eq!(
        fx.events.take(),
        vec!["before:B.set", "after:B.set", "before:B.get", "after:B.get"]
    );
}

#[derive(Default)]
struct Upper;

impl Hook for Upper {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        if let Some(s) = ctx.property_value().as_str() {
            let upper = s.to_uppercase();
            ctx.set_property_value(upper);
        }
        Ok(())
    }

    fn after(&self, _ctx: &mut CallContext) -> Result<Value, BoxError> {
        Ok(Value::Str("ignored".into()))
    }
}

#[derive(Default)]
struct Snapshot;

impl Hook for Snapshot {
    fn after(&self, ctx: &mut CallContext) -> Result<Value, BoxError> {
        // the getter stores the read value both as result and property value
        assert_eq!(ctx.result(), ctx.property_value());
        Ok(Value::Str(format!("<{}>", ctx.property_value().as_str().unwrap_or(""))))
    }
}

#[test]
fn test_setter_rewrite_and_getter_result() {
    let engine = Engine::new();
    engine.register_hook(HookType::of::<Upper>("Upper")).unwrap();
    engine.register_hook(HookType::of::<Snapshot>("Snapshot")).unwrap();
    engine
        .register(
            ClassBuilder::new("Person")
                .interceptable()
                .property(
                    PropertyDefinition::auto("Name", TypeRef::Str)
                        .as_virtual()
                        .hooked_getter("Snapshot")
                        .hooked_setter("Upper"),
                )
                .build(),
        )
        .unwrap();

    let mut person = engine
        .create_proxy_of_class(&TypeRef::named("Person"), vec![])
        .unwrap();
    person.set("Name", "ada").unwrap();
    assert_eq!(person.field("<Name>"), Some(&Value::Str("ADA".into())));
    assert_eq!(person.get("Name").unwrap(), Value::Str("<ADA>".into()));
}

#[test]
fn test_property_access_errors() {
    let engine = Engine::new();
    engine
        .register(
            ClassBuilder::new("Reading")
                .interceptable()
                .property(PropertyDefinition::auto("Count", TypeRef::Int).private_setter())
                .property(PropertyDefinition::new("Sink", TypeRef::Int).setter(|_, _| Ok(())))
                .build(),
        )
        .unwrap();

    let mut reading = engine
        .create_proxy_of_class(&TypeRef::named("Reading"), vec![])
        .unwrap();
    assert_eq!(reading.get("Count").unwrap(), Value::Int(0));
    assert!(matches!(reading.set("Count", 1i64), Err(InvokeError::NotWritable(_))));
    assert!(matches!(reading.get("Sink"), Err(InvokeError::NotReadable(_))));
    assert!(matches!(
        reading.set("Sink", "text"),
        Err(InvokeError::ArgumentMismatch { .. })
    ));
    assert!(matches!(
        reading.get("Missing"),
        Err(InvokeError::MemberNotFound { .. })
    ));
}

// ============================================================================
// Call context and hook instances
// ============================================================================

struct Inspect {
    seen: Events,
}

impl Hook for Inspect {
    fn before(&self, ctx: &mut CallContext) -> Result<(), BoxError> {
        let method = ctx.method().map(|m| m.to_string()).unwrap_or_default();
        self.seen.push(format!(
            "{} {} {:?} {}",
            ctx.target_type(),
            method,
            ctx.constructor_args(),
            ctx.result()
        ));
        Ok(())
    }
}

#[test]
fn test_context_carries_type_and_constructor_args() {
    let seen = Events::default();
    let hook_seen = seen.clone();
    let engine = Engine::new();
    engine
        .register_hook(HookType::with_factory("Inspect", move || {
            Box::new(Inspect {
                seen: hook_seen.clone(),
            })
        }))
        .unwrap();
    engine
        .register(
            ClassBuilder::new("Named")
                .interceptable()
                .constructor(weave_engine::ConstructorDefinition::new())
                .constructor(
                    weave_engine::ConstructorDefinition::new().with_param("tag", TypeRef::Str),
                )
                .method(
                    MethodDefinition::new("run")
                        .with_param("n", TypeRef::Int)
                        .as_virtual()
                        .hooked("Inspect"),
                )
                .build(),
        )
        .unwrap();

    let mut tagged = engine
        .create_proxy_of_class(&TypeRef::named("Named"), vec!["t".into()])
        .unwrap();
    tagged.invoke("run", ints(&[1])).unwrap();
    let mut bare = engine
        .create_proxy_of_class(&TypeRef::named("Named"), vec![])
        .unwrap();
    bare.invoke("run", ints(&[1])).unwrap();

    assert_eq!(
        seen.take(),
        vec![
            "Weave.NamedProxy Named::run(n: int) -> void [Str(\"t\")] null",
            "Weave.NamedProxy Named::run(n: int) -> void [] null",
        ]
    );
}

#[test]
fn test_one_hook_instance_per_object_and_type() {
    let fx = fixture();
    let mut first = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();
    let mut second = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    // echo, A and B all use Recorder: one slot, filled once per object
    assert_eq!(fx.built.load(Ordering::SeqCst), 2);

    for _ in 0..3 {
        first.call::<String>("echo", vec!["x".into()]).unwrap();
        second.get("B").unwrap();
    }
    assert_eq!(fx.built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_constructor_body_runs_for_proxy() {
    let fx = fixture();
    let mut test = fx
        .engine
        .create_proxy_of_class(&test_ref(), vec!["ada".into()])
        .unwrap();
    assert_eq!(test.call::<String>("name", vec![]).unwrap(), "ada");
    assert_eq!(test.constructor_args(), &[Value::Str("ada".into())]);
}

// ============================================================================
// Object-typed members
// ============================================================================

#[test]
fn test_object_parameters_and_results_accept_any_value() {
    let fx = fixture();
    fx.engine
        .register(
            ClassBuilder::new("Bag")
                .interceptable()
                .method(
                    MethodDefinition::new("echo")
                        .with_param("o", TypeRef::Object)
                        .returns(TypeRef::Object)
                        .as_virtual()
                        .hooked("Log")
                        .body(|_, args| Ok(args[0].clone())),
                )
                .method(
                    MethodDefinition::new("label")
                        .returns(TypeRef::Object)
                        .as_virtual()
                        .hooked("Constant")
                        .body(|_, _| Ok(Value::Str("bag".into()))),
                )
                .build(),
        )
        .unwrap();

    let mut bag = fx
        .engine
        .create_proxy_of_class(&TypeRef::named("Bag"), vec![])
        .unwrap();
    // Log rewrites the int argument and the int result
    assert_eq!(bag.invoke("echo", ints(&[1])).unwrap(), Value::Int(668));
    assert_eq!(
        bag.invoke("echo", vec![Value::Str("s".into())]).unwrap(),
        Value::Str("s".into())
    );
    assert_eq!(bag.invoke("echo", vec![Value::Null]).unwrap(), Value::Null);
    assert_eq!(
        bag.invoke("echo", vec![Value::Type(TypeRef::Str)]).unwrap(),
        Value::Type(TypeRef::Str)
    );
    // an int after-value is a valid object result
    assert_eq!(bag.invoke("label", vec![]).unwrap(), Value::Int(42));
}

// ============================================================================
// Types, caching and naming
// ============================================================================

#[test]
fn test_proxy_type_identity() {
    let fx = fixture();
    let test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();

    assert!(test.is_proxy());
    assert_eq!(test.type_ref(), &TypeRef::named("Weave.TestProxy"));
    assert!(test.is_instance_of(&TypeRef::named("Weave.TestProxy")));
    assert!(test.is_instance_of(&test_ref()));
    assert!(test.is_instance_of(&TypeRef::named("ITest")));
    assert!(!test.is_instance_of(&TypeRef::named("Other")));

    let ty = test.runtime_type();
    assert!(matches!(ty.origin(), Origin::Proxy { .. }));
    assert_eq!(ty.parent().map(|p| p.type_ref().clone()), Some(test_ref()));
}

#[test]
fn test_same_request_same_type() {
    let fx = fixture();
    let a = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();
    let b = fx
        .engine
        .create_proxy_of_class(&test_ref(), vec!["x".into()])
        .unwrap();

    assert!(Arc::ptr_eq(a.runtime_type(), b.runtime_type()));
    assert_eq!(fx.engine.module().len(), 1);
    assert_eq!(fx.engine.cache().template_count(), 1);
    assert!(fx.engine.module().get("Weave.TestProxy").is_some());
}

#[test]
fn test_unmarked_class_passes_through() {
    let engine = Engine::new();
    engine
        .register(
            ClassBuilder::new("Plain")
                .method(
                    MethodDefinition::new("one")
                        .returns(TypeRef::Int)
                        .body(|_, _| Ok(Value::Int(1))),
                )
                .build(),
        )
        .unwrap();

    let mut plain = engine
        .create_proxy_of_class(&TypeRef::named("Plain"), vec![])
        .unwrap();
    assert!(!plain.is_proxy());
    assert_eq!(plain.type_ref(), &TypeRef::named("Plain"));
    assert_eq!(plain.call::<i64>("one", vec![]).unwrap(), 1);
    assert!(engine.module().is_empty());
}

#[test]
fn test_naming_follows_config() {
    let config: EngineConfig = r#"
        [naming]
        namespace = "Aspects"
        suffix = "AOPClass"
        "#
    .parse()
    .unwrap();
    let fx = fixture_with(Engine::with_config(config));
    let test = fx.engine.create_proxy_of_class(&test_ref(), vec![]).unwrap();
    assert_eq!(test.runtime_type().name(), "Aspects.TestAOPClass");
}
