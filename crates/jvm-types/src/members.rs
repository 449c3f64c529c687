use crate::{ClassDescription, Utf8, access::AccessFlags, error::ResolutionError};
use enum_dispatch::enum_dispatch;
use jvm_utils::sync::{AtomicU8, AtomicU16, Ordering};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
};

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const CLASS_INITIALIZER_NAME: &str = "<clinit>";

/// Where a call to a method ends up.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DispatchTarget {
    Bytecode = 0,
    Native = 1,
    /// Stand-in installed on abstract methods of non-interface classes.
    AbstractMethodTrap = 2,
}

impl DispatchTarget {
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => DispatchTarget::Native,
            2 => DispatchTarget::AbstractMethodTrap,
            _ => DispatchTarget::Bytecode,
        }
    }
}

pub struct Method {
    name: Utf8,
    signature: Utf8,
    access: AtomicU16,
    dispatch: AtomicU8,
}

impl Method {
    pub fn new(name: impl Into<Utf8>, signature: impl Into<Utf8>, access: AccessFlags) -> Self {
        let dispatch = if access.contains(AccessFlags::NATIVE) {
            DispatchTarget::Native
        } else {
            DispatchTarget::Bytecode
        };
        Self {
            name: name.into(),
            signature: signature.into(),
            access: AtomicU16::new(access.bits()),
            dispatch: AtomicU8::new(dispatch as u8),
        }
    }

    pub fn name(&self) -> &Utf8 {
        &self.name
    }

    pub fn signature(&self) -> &Utf8 {
        &self.signature
    }

    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags::from_bits_retain(self.access.load(Ordering::Acquire))
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags().contains(AccessFlags::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags().contains(AccessFlags::NATIVE)
    }

    pub fn is_static(&self) -> bool {
        self.access_flags().contains(AccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == CONSTRUCTOR_NAME
    }

    pub fn dispatch_target(&self) -> DispatchTarget {
        DispatchTarget::from_raw(self.dispatch.load(Ordering::Acquire))
    }

    /// Routes any future invocation to the abstract-method trap and marks the
    /// method native. Every writer stores the same values, so concurrent and
    /// repeated calls are harmless.
    pub fn install_abstract_trap(&self) {
        self.dispatch
            .store(DispatchTarget::AbstractMethodTrap as u8, Ordering::Release);
        self.access
            .fetch_or(AccessFlags::NATIVE.bits(), Ordering::AcqRel);
    }
}

impl Debug for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.signature)
    }
}

pub struct Field {
    name: Utf8,
    signature: Utf8,
    access: AccessFlags,
}

impl Field {
    pub fn new(name: impl Into<Utf8>, signature: impl Into<Utf8>, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            access,
        }
    }

    pub fn name(&self) -> &Utf8 {
        &self.name
    }

    pub fn signature(&self) -> &Utf8 {
        &self.signature
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access
    }

    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }
}

impl Debug for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_static() {
            write!(f, "static ")?;
        }
        write!(f, "{} {}", self.signature, self.name)
    }
}

#[derive(Clone, Copy)]
pub struct MethodDescription {
    pub parent: ClassDescription,
    pub method: &'static Method,
}

impl MethodDescription {
    /// The target a call through this method would jump to.
    ///
    /// Abstract methods found by local search have been patched with the
    /// trap, which surfaces here as `AbstractMethodInvoked`.
    pub fn invoke_target(&self) -> Result<DispatchTarget, ResolutionError> {
        match self.method.dispatch_target() {
            DispatchTarget::AbstractMethodTrap => Err(ResolutionError::AbstractMethodInvoked {
                class: self.parent.name().clone(),
                name: self.method.name().clone(),
                signature: self.method.signature().clone(),
            }),
            target => Ok(target),
        }
    }
}

impl Debug for MethodDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}{}",
            self.parent.name(),
            self.method.name(),
            self.method.signature()
        )
    }
}

impl PartialEq for MethodDescription {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.method, other.method)
    }
}

impl Eq for MethodDescription {}

impl Hash for MethodDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.method as *const Method).hash(state);
    }
}

#[derive(Clone, Copy)]
pub struct FieldDescription {
    pub parent: ClassDescription,
    pub field: &'static Field,
}

impl Debug for FieldDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.field.is_static() {
            write!(f, "static ")?;
        }
        write!(
            f,
            "{} {}.{}",
            self.field.signature(),
            self.parent.name(),
            self.field.name()
        )
    }
}

impl PartialEq for FieldDescription {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.field, other.field)
    }
}

impl Eq for FieldDescription {}

impl Hash for FieldDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.field as *const Field).hash(state);
    }
}

#[enum_dispatch]
pub trait MemberInfo {
    fn declaring_class(&self) -> ClassDescription;
    fn member_name(&self) -> &Utf8;
    fn member_signature(&self) -> &Utf8;
    fn member_flags(&self) -> AccessFlags;
}

impl MemberInfo for MethodDescription {
    fn declaring_class(&self) -> ClassDescription {
        self.parent
    }
    fn member_name(&self) -> &Utf8 {
        self.method.name()
    }
    fn member_signature(&self) -> &Utf8 {
        self.method.signature()
    }
    fn member_flags(&self) -> AccessFlags {
        self.method.access_flags()
    }
}

impl MemberInfo for FieldDescription {
    fn declaring_class(&self) -> ClassDescription {
        self.parent
    }
    fn member_name(&self) -> &Utf8 {
        self.field.name()
    }
    fn member_signature(&self) -> &Utf8 {
        self.field.signature()
    }
    fn member_flags(&self) -> AccessFlags {
        self.field.access_flags()
    }
}

/// A method or field declared directly by a class.
#[enum_dispatch(MemberInfo)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Member {
    MethodDescription,
    FieldDescription,
}

impl Member {
    pub fn as_method(&self) -> Option<MethodDescription> {
        match self {
            Member::MethodDescription(m) => Some(*m),
            Member::FieldDescription(_) => None,
        }
    }

    pub fn as_field(&self) -> Option<FieldDescription> {
        match self {
            Member::FieldDescription(f) => Some(*f),
            Member::MethodDescription(_) => None,
        }
    }
}
