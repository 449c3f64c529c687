use jvm_rs::prelude::*;
use jvm_rs::types::constant_pool::ConstantTag;
use jvm_rs::utils::sync::Ordering;

fn define(registry: &ClassRegistry, source: ClassSource) -> ClassDescription {
    let name = source.name().clone();
    registry.add_source(LoaderId::BOOTSTRAP, source);
    registry
        .load_named_class(&name, LoaderId::BOOTSTRAP)
        .unwrap_or_else(|e| panic!("failed to load {name}: {e}"))
}

fn resolver(registry: &ClassRegistry) -> ResolverService<'_> {
    ResolverService::with_config(registry, ResolverConfig::default())
}

#[test]
fn test_invokespecial_binds_superclass_implementation() {
    let registry = ClassRegistry::new();
    define(&registry, ClassSource::new("A").method("f", "()V", AccessFlags::PUBLIC));
    let b = define(
        &registry,
        ClassSource::new("B").extends("A").method("f", "()V", AccessFlags::PUBLIC),
    );
    let mut c = ClassSource::new("C")
        .extends("B")
        .method("f", "()V", AccessFlags::PUBLIC);
    let super_f = c.pool().method_ref("B", "f", "()V");
    let c = define(&registry, c);
    let r = resolver(&registry);

    let special = r
        .resolve_method(super_f, c, SpecialMode::Special, true)
        .unwrap();
    assert_eq!(special.class, Some(b));
    let method = special.method.unwrap();
    assert_eq!(method.parent, b);
    assert_eq!(method.member_name().as_ref(), "f");

    let ordinary = r
        .resolve_method(super_f, c, SpecialMode::Ordinary, true)
        .unwrap();
    assert_eq!(ordinary.method.unwrap().parent, b);
}

#[test]
fn test_invokespecial_skipping_a_level_searches_from_direct_superclass() {
    let registry = ClassRegistry::new();
    let a = define(&registry, ClassSource::new("A").method("f", "()V", AccessFlags::PUBLIC));
    let b = define(
        &registry,
        ClassSource::new("B").extends("A").method("f", "()V", AccessFlags::PUBLIC),
    );
    let mut c = ClassSource::new("C").extends("B");
    let a_f = c.pool().method_ref("A", "f", "()V");
    let c = define(&registry, c);

    let info = resolver(&registry)
        .resolve_method(a_f, c, SpecialMode::Special, true)
        .unwrap();
    assert_eq!(info.class, Some(a));
    assert_eq!(info.method.unwrap().parent, b);
}

#[test]
fn test_abstract_method_traps_on_invocation() {
    let registry = ClassRegistry::new();
    define(
        &registry,
        ClassSource::new("Shape")
            .access(AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
            .abstract_method("area", "()D"),
    );
    let mut main = ClassSource::new("Main");
    let area = main.pool().method_ref("Shape", "area", "()D");
    let main = define(&registry, main);
    let r = resolver(&registry);

    let first = r
        .resolve_method(area, main, SpecialMode::Ordinary, true)
        .unwrap();
    let second = r
        .resolve_method(area, main, SpecialMode::Ordinary, true)
        .unwrap();
    assert_eq!(first, second);

    let method = second.method.unwrap();
    let err = method.invoke_target().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AbstractMethodInvoked);
    assert_eq!(err.throwable_class(), "java/lang/AbstractMethodError");
    assert!(method.member_flags().contains(AccessFlags::NATIVE | AccessFlags::ABSTRACT));
    assert_eq!(main.definition().constants().tag(area), ConstantTag::Methodref);
    assert_eq!(first.class.unwrap().methods().len(), 1);
}

#[test]
fn test_interface_fallback_scans_direct_interfaces_only() {
    let registry = ClassRegistry::new();
    define(&registry, ClassSource::interface("J").abstract_method("g", "()V"));
    define(&registry, ClassSource::interface("I").implements("J"));
    define(&registry, ClassSource::new("X").implements("I"));
    let mut main = ClassSource::new("Main");
    let g = main.pool().method_ref("X", "g", "()V");
    let main = define(&registry, main);

    let info = resolver(&registry)
        .resolve_method(g, main, SpecialMode::InterfaceSuper, true)
        .unwrap();
    assert!(info.class.is_some());
    assert!(info.method.is_none());
}

#[test]
fn test_interface_fallback_finds_direct_interface_method() {
    let registry = ClassRegistry::new();
    let i = define(&registry, ClassSource::interface("I").abstract_method("g", "()V"));
    define(&registry, ClassSource::interface("K"));
    define(&registry, ClassSource::new("X").implements("K").implements("I"));
    let mut main = ClassSource::new("Main");
    let g = main.pool().method_ref("X", "g", "()V");
    let main = define(&registry, main);
    let r = resolver(&registry);

    let found = r
        .resolve_method(g, main, SpecialMode::InterfaceSuper, true)
        .unwrap();
    assert_eq!(found.method.unwrap().parent, i);

    let ordinary = r
        .resolve_method(g, main, SpecialMode::Ordinary, true)
        .unwrap();
    assert!(ordinary.method.is_none());
}

#[test]
fn test_field_resolution_does_not_walk_superclasses() {
    let registry = ClassRegistry::new();
    define(&registry, ClassSource::new("Base").field("count", "I", AccessFlags::PUBLIC));
    define(&registry, ClassSource::new("Derived").extends("Base"));
    let mut main = ClassSource::new("Main");
    let count = main.pool().field_ref("Derived", "count", "I");
    let main = define(&registry, main);

    let err = resolver(&registry)
        .resolve_field(count, main, false)
        .unwrap_err();
    assert_eq!(
        err,
        ResolutionError::NoSuchField {
            class: "Derived".into(),
            name: "count".into(),
        }
    );
    assert_eq!(err.throwable_class(), "java/lang/NoSuchFieldError");
}

#[test]
fn test_malformed_tag_never_populates_a_binding() {
    let registry = ClassRegistry::new();
    define(&registry, ClassSource::new("P").field("x", "I", AccessFlags::PUBLIC));
    let mut main = ClassSource::new("Main");
    let field = main.pool().field_ref("P", "x", "I");
    let int = main.pool().integer(7);
    let main = define(&registry, main);
    let r = resolver(&registry);

    for index in [field, int, ConstIndex(0), ConstIndex(500)] {
        for eager in [false, true] {
            let err = r
                .resolve_method(index, main, SpecialMode::Ordinary, eager)
                .unwrap_err();
            assert_eq!(err.error.kind(), ErrorKind::MalformedConstantPool);
            assert!(err.partial.is_none());
        }
    }
}

#[test]
fn test_class_slot_retry_after_failure() {
    let registry = ClassRegistry::new();
    let mut main = ClassSource::new("Main");
    let slot = main.pool().class("Plugin");
    let call = main.pool().method_ref("Plugin", "start", "()V");
    let main = define(&registry, main);
    let r = resolver(&registry);

    let err = r
        .resolve_method(call, main, SpecialMode::Ordinary, true)
        .unwrap_err();
    let partial = err.partial.unwrap();
    assert_eq!(partial.class_name.as_deref(), Some("Plugin"));
    assert_eq!(main.constants().tag(slot), ConstantTag::Class);

    registry.add_source(
        LoaderId::BOOTSTRAP,
        ClassSource::new("Plugin").method("start", "()V", AccessFlags::PUBLIC),
    );
    let plugin = r.resolve_class(slot, main).unwrap();
    assert_eq!(main.constants().tag(slot), ConstantTag::ResolvedClass);

    let requests = registry.load_requests.load(Ordering::Relaxed);
    let info = r
        .resolve_method(call, main, SpecialMode::Ordinary, true)
        .unwrap();
    assert_eq!(info.class, Some(plugin));
    assert!(info.method.is_some());
    assert_eq!(registry.load_requests.load(Ordering::Relaxed), requests);
}

#[test]
fn test_find_declared_member_does_not_resolve() {
    let registry = ClassRegistry::new();
    let mut holder = ClassSource::new("Holder")
        .method("get", "()LValue;", AccessFlags::PUBLIC)
        .field("value", "LValue;", AccessFlags::PRIVATE);
    let slot = holder.pool().class("Value");
    let holder = define(&registry, holder);

    let method = find_declared_member(holder, "get", "()LValue;").unwrap();
    assert!(method.as_method().is_some());
    let field = find_declared_member(holder, "value", "LValue;").unwrap();
    assert_eq!(field.declaring_class(), holder);
    assert!(find_declared_member(holder, "missing", "()V").is_none());

    assert!(registry.find_loaded_class("Value", LoaderId::BOOTSTRAP).is_none());
    assert_eq!(holder.constants().tag(slot), ConstantTag::Class);
}
