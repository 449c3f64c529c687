//! # jvm-loader
//!
//! An in-memory class-loading collaborator. Class sources are registered per
//! loader; loading turns a source into a canonical [`ClassDescription`],
//! pulling in its superclass and interfaces first. Non-bootstrap loaders
//! delegate to the bootstrap loader when they have no source of their own.
use dashmap::{DashMap, mapref::entry::Entry};
use jvm_types::{
    ARRAY_MARKER, ClassDescription, ClassLoading, Utf8,
    access::AccessFlags,
    class::{Class, ClassInit, ClassState},
    constant_pool::ConstantPoolBuilder,
    error::LoadError,
};
use jvm_utils::{
    LoaderId,
    sync::{Arc, AtomicU64, Ordering, RwLock},
};
use std::{cell::RefCell, collections::HashMap};
use tracing::{debug, trace};

mod source;

pub use source::{ClassSource, LoadFault};

pub const OBJECT_CLASS: &str = "java/lang/Object";

thread_local! {
    /// Classes this thread is currently defining, for circularity detection.
    static DEFINING: RefCell<Vec<(Utf8, LoaderId)>> = const { RefCell::new(Vec::new()) };
}

pub struct ClassRegistry {
    sources: RwLock<HashMap<(LoaderId, Utf8), Arc<ClassSource>>>,
    classes: DashMap<(Utf8, LoaderId), ClassDescription>,
    pub load_requests: AtomicU64,
    pub classes_defined: AtomicU64,
    pub initializations: AtomicU64,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            classes: DashMap::new(),
            load_requests: AtomicU64::new(0),
            classes_defined: AtomicU64::new(0),
            initializations: AtomicU64::new(0),
        }
    }

    /// Makes `source` available to `loader`. Sources may be added at any
    /// time; a name that failed to load earlier can succeed afterwards.
    pub fn add_source(&self, loader: LoaderId, source: ClassSource) {
        let key = (loader, source.name.clone());
        self.sources.write().insert(key, Arc::new(source));
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    fn source(&self, loader: LoaderId, name: &str) -> Option<(LoaderId, Arc<ClassSource>)> {
        let sources = self.sources.read();
        if let Some(s) = sources.get(&(loader, Utf8::from(name))) {
            return Some((loader, s.clone()));
        }
        if !loader.is_bootstrap()
            && let Some(s) = sources.get(&(LoaderId::BOOTSTRAP, Utf8::from(name)))
        {
            return Some((LoaderId::BOOTSTRAP, s.clone()));
        }
        None
    }

    fn cached(&self, name: &str, loader: LoaderId) -> Option<ClassDescription> {
        self.classes.get(&(Utf8::from(name), loader)).map(|c| *c)
    }

    /// Records `class` under (name, loader) unless something is already
    /// there, and returns whichever class is canonical.
    fn publish(&self, name: &Utf8, loader: LoaderId, class: ClassDescription) -> ClassDescription {
        match self.classes.entry((name.clone(), loader)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(v) => {
                v.insert(class);
                class
            }
        }
    }

    /// Only classes that finished linking are handed out. Published classes
    /// are at least `Linked` or `Failed`, so the lower states never match.
    fn usable(class: ClassDescription) -> Result<ClassDescription, LoadError> {
        if class.is_at_least(ClassState::Linked) {
            Ok(class)
        } else {
            Err(LoadError::NoClassDefFound(class.name().clone()))
        }
    }

    fn define(&self, source: &ClassSource, loader: LoaderId) -> Result<ClassDescription, LoadError> {
        if let Some(LoadFault::Format(message)) = &source.fault {
            return Err(LoadError::ClassFormat {
                class: source.name.clone(),
                message: message.clone(),
            });
        }

        let key = (source.name.clone(), loader);
        let circular = DEFINING.with(|d| d.borrow().contains(&key));
        if circular {
            return Err(LoadError::Linkage {
                class: source.name.clone(),
                message: "class circularity".to_string(),
            });
        }
        DEFINING.with(|d| d.borrow_mut().push(key));
        let result = self.define_with_supertypes(source, loader);
        DEFINING.with(|d| d.borrow_mut().pop());
        result
    }

    fn define_with_supertypes(
        &self,
        source: &ClassSource,
        loader: LoaderId,
    ) -> Result<ClassDescription, LoadError> {
        let superclass = match &source.superclass {
            Some(name) => {
                let parent = self.load_named_class(name, loader)?;
                if parent.is_interface() {
                    return Err(LoadError::Linkage {
                        class: source.name.clone(),
                        message: format!("superclass {} is an interface", parent.name()),
                    });
                }
                Some(parent)
            }
            None => None,
        };

        let mut interfaces = Vec::with_capacity(source.interfaces.len());
        for name in &source.interfaces {
            let interface = self.load_named_class(name, loader)?;
            if !interface.is_interface() {
                return Err(LoadError::Linkage {
                    class: source.name.clone(),
                    message: format!("{} is not an interface", interface.name()),
                });
            }
            interfaces.push(interface);
        }

        let class = ClassDescription::leak(Class::new(ClassInit {
            name: source.name.clone(),
            loader,
            access: source.access,
            superclass,
            interfaces,
            methods: source.build_methods(),
            fields: source.build_fields(),
            constants: source.pool.build(),
        }));

        // Linkage is settled before the class becomes visible to other threads.
        let verify = match &source.fault {
            Some(LoadFault::Verify(message)) => {
                class.mark_failed();
                Some(message)
            }
            _ => {
                class.advance_state(ClassState::Linked);
                None
            }
        };

        let canonical = self.publish(&source.name, loader, class);
        if canonical != class {
            trace!("lost definition race for {:?}", canonical);
            return Self::usable(canonical);
        }
        self.classes_defined.fetch_add(1, Ordering::Relaxed);

        if let Some(message) = verify {
            debug!("verification of {} failed: {}", source.name, message);
            return Err(LoadError::Verify {
                class: source.name.clone(),
                message: message.clone(),
            });
        }
        trace!("defined {:?}", canonical);
        Ok(canonical)
    }

    fn array_component(
        &self,
        name: &str,
        loader: LoaderId,
    ) -> Result<Option<ClassDescription>, LoadError> {
        let missing = || LoadError::NoClassDefFound(name.into());
        let element = name.strip_prefix(ARRAY_MARKER).ok_or_else(missing)?;
        match element.as_bytes().first() {
            Some(b'[') => Ok(Some(self.load_array_class(element, loader)?)),
            Some(b'L') => {
                let inner = element
                    .strip_prefix('L')
                    .and_then(|e| e.strip_suffix(';'))
                    .filter(|e| !e.is_empty() && !e.contains(';'))
                    .ok_or_else(missing)?;
                Ok(Some(self.load_named_class(inner, loader)?))
            }
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') if element.len() == 1 => {
                Ok(None)
            }
            _ => Err(missing()),
        }
    }
}

impl ClassLoading for ClassRegistry {
    fn load_named_class(
        &self,
        name: &str,
        loader: LoaderId,
    ) -> Result<ClassDescription, LoadError> {
        self.load_requests.fetch_add(1, Ordering::Relaxed);
        if let Some(class) = self.cached(name, loader) {
            return Self::usable(class);
        }

        let Some((defining, source)) = self.source(loader, name) else {
            debug!("no source for {} in {}", name, loader);
            return Err(LoadError::NoClassDefFound(name.into()));
        };

        let class = match self.cached(name, defining) {
            Some(class) => Self::usable(class)?,
            None => self.define(&source, defining)?,
        };
        if defining != loader {
            self.publish(&source.name, loader, class);
        }
        Ok(class)
    }

    fn load_array_class(
        &self,
        name: &str,
        loader: LoaderId,
    ) -> Result<ClassDescription, LoadError> {
        self.load_requests.fetch_add(1, Ordering::Relaxed);
        if let Some(class) = self.cached(name, loader) {
            return Self::usable(class);
        }

        let component = self.array_component(name, loader)?;
        let defining = component.map_or(LoaderId::BOOTSTRAP, |c| c.loader());
        let array_name: Utf8 = name.into();

        let class = match self.cached(name, defining) {
            Some(class) => class,
            None => {
                let superclass = if self.source(LoaderId::BOOTSTRAP, OBJECT_CLASS).is_some() {
                    Some(self.load_named_class(OBJECT_CLASS, LoaderId::BOOTSTRAP)?)
                } else {
                    None
                };
                let class = ClassDescription::leak(Class::new(ClassInit {
                    name: array_name.clone(),
                    loader: defining,
                    access: AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::ABSTRACT,
                    superclass,
                    interfaces: vec![],
                    methods: vec![],
                    fields: vec![],
                    constants: ConstantPoolBuilder::new().build(),
                }));
                class.advance_state(ClassState::Complete);
                let canonical = self.publish(&array_name, defining, class);
                if canonical == class {
                    self.classes_defined.fetch_add(1, Ordering::Relaxed);
                }
                canonical
            }
        };
        if defining != loader {
            self.publish(&array_name, loader, class);
        }
        Ok(class)
    }

    fn drive_linkage(&self, class: ClassDescription, target: ClassState) -> Result<(), LoadError> {
        Self::usable(class)?;
        if class.is_at_least(target) {
            return Ok(());
        }

        if target == ClassState::Complete
            && let Some(parent) = class.superclass()
        {
            self.drive_linkage(parent, ClassState::Complete)?;
        }

        let fault = self
            .source(class.loader(), class.name())
            .and_then(|(_, s)| s.fault.clone());

        let mut state = class.state();
        while state < target {
            let Some(next) = state.next() else { break };
            if next == ClassState::Complete {
                if let Some(LoadFault::Initializer(message)) = &fault {
                    debug!("static initializer of {} failed: {}", class.name(), message);
                    class.mark_failed();
                    return Err(LoadError::Initializer {
                        class: class.name().clone(),
                        message: message.clone(),
                    });
                }
                self.initializations.fetch_add(1, Ordering::Relaxed);
            }
            state = class.advance_state(next);
            if state == ClassState::Failed {
                return Err(LoadError::NoClassDefFound(class.name().clone()));
            }
        }
        Ok(())
    }

    fn find_loaded_class(&self, name: &str, loader: LoaderId) -> Option<ClassDescription> {
        self.cached(name, loader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ClassRegistry {
        let r = ClassRegistry::new();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new(OBJECT_CLASS));
        r
    }

    #[test]
    fn test_loads_are_canonical() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("A").extends(OBJECT_CLASS));
        let a1 = r.load_named_class("A", LoaderId::BOOTSTRAP).unwrap();
        let a2 = r.load_named_class("A", LoaderId::BOOTSTRAP).unwrap();
        assert_eq!(a1, a2);
        assert!(a1.is_at_least(ClassState::Linked));
        assert_eq!(a1.superclass().unwrap().name().as_ref(), OBJECT_CLASS);
        assert_eq!(r.classes_defined.load(Ordering::Relaxed), 2);
        assert_eq!(r.class_count(), 2);
    }

    #[test]
    fn test_missing_class_can_be_added_later() {
        let r = registry();
        let err = r.load_named_class("Late", LoaderId::BOOTSTRAP).unwrap_err();
        assert_eq!(err, LoadError::NoClassDefFound("Late".into()));
        assert!(r.find_loaded_class("Late", LoaderId::BOOTSTRAP).is_none());

        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("Late"));
        assert!(r.load_named_class("Late", LoaderId::BOOTSTRAP).is_ok());
    }

    #[test]
    fn test_missing_superclass_reports_dependency() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("Child").extends("Gone"));
        let err = r.load_named_class("Child", LoaderId::BOOTSTRAP).unwrap_err();
        assert_eq!(err, LoadError::NoClassDefFound("Gone".into()));
    }

    #[test]
    fn test_verify_failure_is_permanent() {
        let r = registry();
        r.add_source(
            LoaderId::BOOTSTRAP,
            ClassSource::new("Bad").with_fault(LoadFault::Verify("bad stack".into())),
        );
        let first = r.load_named_class("Bad", LoaderId::BOOTSTRAP).unwrap_err();
        assert!(matches!(first, LoadError::Verify { .. }));
        let second = r.load_named_class("Bad", LoaderId::BOOTSTRAP).unwrap_err();
        assert_eq!(second, LoadError::NoClassDefFound("Bad".into()));
        let recorded = r.find_loaded_class("Bad", LoaderId::BOOTSTRAP).unwrap();
        assert_eq!(recorded.state(), ClassState::Failed);
    }

    #[test]
    fn test_circularity_detected() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("X").extends("Y"));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("Y").extends("X"));
        let err = r.load_named_class("X", LoaderId::BOOTSTRAP).unwrap_err();
        assert!(matches!(err, LoadError::Linkage { .. }));
    }

    #[test]
    fn test_interface_checks() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::interface("I"));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("NotI"));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("BadSuper").extends("I"));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("BadImpl").implements("NotI"));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("Good").implements("I"));

        assert!(r.load_named_class("BadSuper", LoaderId::BOOTSTRAP).is_err());
        assert!(r.load_named_class("BadImpl", LoaderId::BOOTSTRAP).is_err());
        let good = r.load_named_class("Good", LoaderId::BOOTSTRAP).unwrap();
        assert_eq!(good.interfaces().len(), 1);
    }

    #[test]
    fn test_delegation_to_bootstrap() {
        let r = registry();
        let app = LoaderId(1);
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("Shared"));
        r.add_source(app, ClassSource::new("Mine").extends("Shared"));

        let mine = r.load_named_class("Mine", app).unwrap();
        assert_eq!(mine.loader(), app);
        let shared = mine.superclass().unwrap();
        assert_eq!(shared.loader(), LoaderId::BOOTSTRAP);
        assert_eq!(r.find_loaded_class("Shared", app), Some(shared));
        assert_eq!(r.load_named_class("Shared", LoaderId::BOOTSTRAP).unwrap(), shared);
    }

    #[test]
    fn test_array_classes() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("E"));

        let ints = r.load_array_class("[I", LoaderId(2)).unwrap();
        assert_eq!(ints.loader(), LoaderId::BOOTSTRAP);
        assert!(ints.is_array());
        assert_eq!(ints.state(), ClassState::Complete);
        assert_eq!(ints, r.load_array_class("[I", LoaderId::BOOTSTRAP).unwrap());

        let nested = r.load_array_class("[[LE;", LoaderId::BOOTSTRAP).unwrap();
        assert_eq!(nested.name().as_ref(), "[[LE;");
        assert!(r.find_loaded_class("[LE;", LoaderId::BOOTSTRAP).is_some());

        for bad in ["[", "[Q", "[II", "[L;", "[LMissing;"] {
            assert!(r.load_array_class(bad, LoaderId::BOOTSTRAP).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_drive_linkage_runs_initializers_once() {
        let r = registry();
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("P").extends(OBJECT_CLASS));
        r.add_source(LoaderId::BOOTSTRAP, ClassSource::new("K").extends("P"));
        let k = r.load_named_class("K", LoaderId::BOOTSTRAP).unwrap();

        r.drive_linkage(k, ClassState::Complete).unwrap();
        r.drive_linkage(k, ClassState::Complete).unwrap();
        assert_eq!(k.state(), ClassState::Complete);
        assert_eq!(k.superclass().unwrap().state(), ClassState::Complete);
        assert_eq!(r.initializations.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_initializer_failure_marks_class_failed() {
        let r = registry();
        r.add_source(
            LoaderId::BOOTSTRAP,
            ClassSource::new("Boom").with_fault(LoadFault::Initializer("npe".into())),
        );
        let boom = r.load_named_class("Boom", LoaderId::BOOTSTRAP).unwrap();
        r.drive_linkage(boom, ClassState::Prepared).unwrap();
        let err = r.drive_linkage(boom, ClassState::Complete).unwrap_err();
        assert!(matches!(err, LoadError::Initializer { .. }));
        assert_eq!(boom.state(), ClassState::Failed);
        assert_eq!(
            r.drive_linkage(boom, ClassState::Complete).unwrap_err(),
            LoadError::NoClassDefFound("Boom".into())
        );
    }

    #[test]
    fn test_format_fault_records_nothing() {
        let r = registry();
        r.add_source(
            LoaderId::BOOTSTRAP,
            ClassSource::new("Garbled").with_fault(LoadFault::Format("truncated".into())),
        );
        let err = r.load_named_class("Garbled", LoaderId::BOOTSTRAP).unwrap_err();
        assert!(matches!(err, LoadError::ClassFormat { .. }));
        assert!(r.find_loaded_class("Garbled", LoaderId::BOOTSTRAP).is_none());
    }
}
