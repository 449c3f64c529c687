//! # jvm-types
//!
//! Runtime representation of loaded classes, their members and constant pools.
//! This crate provides the descriptors used by the resolver and the interface
//! it expects from a class-loading implementation.
//!
//! ## Core Types
//!
//! - **[`ClassDescription`]**: Handle to a loaded [`Class`](class::Class), compared by identity.
//! - **[`MethodDescription`](members::MethodDescription)**: A method together with its declaring class.
//! - **[`FieldDescription`](members::FieldDescription)**: A field together with its declaring class.
//! - **[`ConstantPool`](constant_pool::ConstantPool)**: Per-class symbolic references.
//! - **[`ClassLoading`]**: The class-loading collaborator.
use crate::{
    class::{Class, ClassState},
    error::LoadError,
};
use jvm_utils::LoaderId;
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    ops::Deref,
    ptr,
    sync::Arc,
};

pub mod access;
pub mod class;
pub mod constant_pool;
pub mod error;
pub mod members;
pub mod signature;

/// Interned modified-UTF-8 string as stored in a constant pool.
pub type Utf8 = Arc<str>;

/// Marker that starts the internal name of an array class.
pub const ARRAY_MARKER: char = '[';

/// The class-loading collaborator.
///
/// Implementations canonicalize classes by (name, loader): asking twice for
/// the same pair must yield the same [`ClassDescription`].
pub trait ClassLoading: Send + Sync {
    /// Loads a non-array class by internal name. The result is at least `Linked`.
    fn load_named_class(&self, name: &str, loader: LoaderId)
    -> Result<ClassDescription, LoadError>;

    /// Loads or synthesizes an array class such as `[I` or `[Ljava/lang/String;`.
    fn load_array_class(&self, name: &str, loader: LoaderId)
    -> Result<ClassDescription, LoadError>;

    /// Drives `class` forward to at least `target`, running static
    /// initialization when `target` is `Complete`.
    fn drive_linkage(&self, class: ClassDescription, target: ClassState)
    -> Result<(), LoadError>;

    /// Returns the class already recorded for (name, loader), in whatever state
    /// it is in, without attempting to load it.
    fn find_loaded_class(&self, name: &str, loader: LoaderId) -> Option<ClassDescription>;
}

/// Handle to a loaded class.
///
/// Classes are never unloaded, so the handle is a plain `'static` reference
/// and equality is identity.
#[derive(Clone, Copy)]
pub struct ClassDescription(&'static Class);

impl ClassDescription {
    /// Moves `class` into storage that lives for the rest of the program.
    pub fn leak(class: Class) -> Self {
        Self(Box::leak(Box::new(class)))
    }

    pub const fn from_static(class: &'static Class) -> Self {
        Self(class)
    }

    pub fn definition(&self) -> &'static Class {
        self.0
    }

    /// Walks superclasses, then superinterfaces, looking for `other`.
    pub fn is_subtype_of(self, other: ClassDescription) -> bool {
        if self == other {
            return true;
        }
        if let Some(parent) = self.superclass()
            && parent.is_subtype_of(other)
        {
            return true;
        }
        self.interfaces().iter().any(|i| i.is_subtype_of(other))
    }

    /// Iterates over this class and its superclasses, nearest first.
    pub fn ancestors(self) -> impl Iterator<Item = ClassDescription> {
        std::iter::successors(Some(self), |c| c.superclass())
    }
}

impl Deref for ClassDescription {
    type Target = Class;
    fn deref(&self) -> &'static Self::Target {
        self.0
    }
}

impl Debug for ClassDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.loader().is_bootstrap() {
            write!(f, "{}", self.0.name())
        } else {
            write!(f, "{}@{}", self.0.name(), self.0.loader())
        }
    }
}

impl PartialEq for ClassDescription {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for ClassDescription {}

impl Hash for ClassDescription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 as *const Class).hash(state);
    }
}
