//! # jvm-vm
//!
//! Symbolic resolution and linking for the `jvm-rs` runtime. Turns constant-pool
//! references into live classes, methods and fields, lazily and at most once
//! per slot, in a way that stays correct when many threads resolve the same
//! slot at the same time.
//!
//! ## Subsystems
//!
//! - **Resolver** (`resolver/`): class, method and field resolution behind [`ResolverService`].
//! - **Lookup** (`lookup`): non-resolving search of one class's own member tables.
//! - **Bindings** (`binding`): the call and field bindings handed back to callers.
//! - **forName** (`for_name`): named class lookup with its exception-shaping rules.
//! - **Metrics** (`metrics`) and **Config** (`config`).
pub mod binding;
pub mod config;
mod for_name;
pub mod lookup;
pub mod metrics;
pub mod resolver;

pub use binding::{CallInfo, FieldInfo, MethodRefError};
pub use config::ResolverConfig;
pub use metrics::{ResolutionMetrics, ResolutionStats};
pub use resolver::{ResolverService, SpecialMode};
