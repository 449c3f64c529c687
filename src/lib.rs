//! # jvm-rs
//!
//! Symbolic resolution and linking for a Java-style virtual machine.
//!
//! This crate re-exports the workspace members:
//!
//! - [`utils`]: synchronization primitives and index newtypes.
//! - [`types`]: classes, members, constant pools and errors.
//! - [`loader`]: an in-memory class-loading collaborator.
//! - [`vm`]: the resolver itself.
pub use jvm_loader as loader;
pub use jvm_types as types;
pub use jvm_utils as utils;
pub use jvm_vm as vm;

pub mod prelude {
    pub use jvm_loader::{ClassRegistry, ClassSource, LoadFault};
    pub use jvm_types::{
        ClassDescription, ClassLoading,
        access::AccessFlags,
        class::ClassState,
        error::{ErrorKind, LoadError, ResolutionError},
        members::{DispatchTarget, Member, MemberInfo, MethodDescription},
    };
    pub use jvm_utils::{ConstIndex, LoaderId};
    pub use jvm_vm::{
        CallInfo, FieldInfo, MethodRefError, ResolverConfig, ResolverService, SpecialMode,
        lookup::{find_declared_member, find_method_local},
    };
}
