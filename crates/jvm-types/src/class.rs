use crate::{
    ClassDescription, Utf8,
    access::AccessFlags,
    constant_pool::ConstantPool,
    members::{Field, Method},
};
use jvm_utils::{
    LoaderId,
    sync::{AtomicU8, Mutex, MutexGuard, Ordering},
};
use std::fmt::{Debug, Formatter};

/// Linkage progress of a class. Every state but `Failed` only moves forward;
/// `Failed` absorbs and compares below everything else.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClassState {
    Failed = 0,
    Loaded = 1,
    Linked = 2,
    Verified = 3,
    Prepared = 4,
    Complete = 5,
}

impl ClassState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ClassState::Loaded,
            2 => ClassState::Linked,
            3 => ClassState::Verified,
            4 => ClassState::Prepared,
            5 => ClassState::Complete,
            _ => ClassState::Failed,
        }
    }

    /// The state after `self` on the way to `Complete`.
    pub fn next(self) -> Option<Self> {
        match self {
            ClassState::Loaded => Some(ClassState::Linked),
            ClassState::Linked => Some(ClassState::Verified),
            ClassState::Verified => Some(ClassState::Prepared),
            ClassState::Prepared => Some(ClassState::Complete),
            ClassState::Complete | ClassState::Failed => None,
        }
    }
}

/// Everything a class-file reader hands over to build a [`Class`].
pub struct ClassInit {
    pub name: Utf8,
    pub loader: LoaderId,
    pub access: AccessFlags,
    pub superclass: Option<ClassDescription>,
    pub interfaces: Vec<ClassDescription>,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub constants: ConstantPool,
}

pub struct Class {
    name: Utf8,
    loader: LoaderId,
    access: AccessFlags,
    superclass: Option<ClassDescription>,
    interfaces: Box<[ClassDescription]>,
    methods: Box<[Method]>,
    fields: Box<[Field]>,
    constants: ConstantPool,
    state: AtomicU8,
    /// Serializes transitions of this class's constant-pool `Class` slots.
    resolution_lock: Mutex<()>,
}

impl Class {
    pub fn new(init: ClassInit) -> Self {
        Self {
            name: init.name,
            loader: init.loader,
            access: init.access,
            superclass: init.superclass,
            interfaces: init.interfaces.into_boxed_slice(),
            methods: init.methods.into_boxed_slice(),
            fields: init.fields.into_boxed_slice(),
            constants: init.constants,
            state: AtomicU8::new(ClassState::Loaded as u8),
            resolution_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &Utf8 {
        &self.name
    }

    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access
    }

    pub fn is_interface(&self) -> bool {
        self.access.contains(AccessFlags::INTERFACE)
    }

    pub fn is_array(&self) -> bool {
        self.name.starts_with('[')
    }

    pub fn superclass(&self) -> Option<ClassDescription> {
        self.superclass
    }

    /// Direct interfaces in declaration order.
    pub fn interfaces(&self) -> &[ClassDescription] {
        &self.interfaces
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    pub fn state(&self) -> ClassState {
        ClassState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_at_least(&self, target: ClassState) -> bool {
        let state = self.state();
        state != ClassState::Failed && state >= target
    }

    /// Moves the class forward to `target` unless it is already further along
    /// or has failed. Returns the state after the update.
    pub fn advance_state(&self, target: ClassState) -> ClassState {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                let current = ClassState::from_raw(raw);
                if current == ClassState::Failed || current >= target {
                    None
                } else {
                    Some(target as u8)
                }
            });
        match result {
            Ok(_) => target,
            Err(raw) => ClassState::from_raw(raw),
        }
    }

    pub fn mark_failed(&self) {
        self.state.store(ClassState::Failed as u8, Ordering::Release);
    }

    /// Takes this class's resolution lock. Hold it only across constant-pool
    /// slot reads and writes, never across class loading.
    pub fn lock_resolution(&self) -> MutexGuard<'_, ()> {
        self.resolution_lock.lock()
    }
}

impl Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("loader", &self.loader)
            .field("state", &self.state())
            .field("superclass", &self.superclass.map(|s| s.name().clone()))
            .field("methods", &self.methods)
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_pool::{Constant, ConstantPoolBuilder, ConstantTag};

    fn bare(name: &str, constants: ConstantPool) -> Class {
        Class::new(ClassInit {
            name: name.into(),
            loader: LoaderId::BOOTSTRAP,
            access: AccessFlags::PUBLIC,
            superclass: None,
            interfaces: vec![],
            methods: vec![],
            fields: vec![],
            constants,
        })
    }

    #[test]
    fn test_state_is_monotonic() {
        let c = bare("A", ConstantPoolBuilder::new().build());
        assert_eq!(c.state(), ClassState::Loaded);
        assert_eq!(c.advance_state(ClassState::Prepared), ClassState::Prepared);
        assert_eq!(c.advance_state(ClassState::Linked), ClassState::Prepared);
        assert!(c.is_at_least(ClassState::Linked));
        assert!(!c.is_at_least(ClassState::Complete));
    }

    #[test]
    fn test_failed_absorbs() {
        let c = bare("A", ConstantPoolBuilder::new().build());
        c.advance_state(ClassState::Linked);
        c.mark_failed();
        assert_eq!(c.advance_state(ClassState::Complete), ClassState::Failed);
        assert!(!c.is_at_least(ClassState::Loaded));
    }

    #[test]
    fn test_state_chain_ends_at_complete() {
        let mut s = ClassState::Loaded;
        let mut steps = 0;
        while let Some(n) = s.next() {
            s = n;
            steps += 1;
        }
        assert_eq!((s, steps), (ClassState::Complete, 4));
        assert_eq!(ClassState::Failed.next(), None);
    }

    #[test]
    fn test_compare_and_resolve_keeps_first_value() {
        let target = ClassDescription::leak(bare("T", ConstantPoolBuilder::new().build()));
        let other = ClassDescription::leak(bare("T", ConstantPoolBuilder::new().build()));

        let mut b = ConstantPoolBuilder::new();
        let slot = b.class("T");
        let owner = ClassDescription::leak(bare("Owner", b.build()));
        let pool = owner.constants();

        {
            let guard = owner.lock_resolution();
            assert_eq!(pool.compare_and_resolve_class(&guard, slot, target), Ok(target));
            assert_eq!(pool.compare_and_resolve_class(&guard, slot, target), Ok(target));
            assert_eq!(pool.compare_and_resolve_class(&guard, slot, other), Ok(target));
        }
        assert_eq!(pool.tag(slot), ConstantTag::ResolvedClass);
        assert_eq!(pool.read(slot), Constant::ResolvedClass(target));
        assert_eq!(&**pool.class_name(slot).as_ref().unwrap(), "T");
    }

    #[test]
    fn test_compare_and_resolve_rejects_non_class_slot() {
        let target = ClassDescription::leak(bare("T", ConstantPoolBuilder::new().build()));
        let mut b = ConstantPoolBuilder::new();
        let utf = b.utf8("T");
        let owner = ClassDescription::leak(bare("Owner", b.build()));
        let guard = owner.lock_resolution();
        assert!(owner
            .constants()
            .compare_and_resolve_class(&guard, utf, target)
            .is_err());
    }
}
