//! Class, method and field resolution over per-class constant pools.
//!
//! The [`ResolverService`] ties a [`ClassLoading`] collaborator to the
//! constant pools of the classes it produces. Every operation takes the
//! *context* class, the class whose constant pool holds the reference and
//! whose loader is used to load anything it names.
//!
//! # Caching Strategy
//!
//! Only `Class` slots are cached. Resolving one reads the slot without a lock
//! first; on a miss the context class's resolution lock is taken just long
//! enough to re-read the slot and fetch the class name, then released while
//! the collaborator loads the class. The lock is taken again to store the
//! result. Two threads may both load the same class; the collaborator hands
//! both the same canonical class, so the stored value is the same either way.
//!
//! Failures are never cached in the slot. The collaborator remembers classes
//! that failed permanently, and a later attempt for a class that was simply
//! missing may succeed.
//!
//! # Example
//!
//! ```ignore
//! let resolver = ResolverService::new(&registry);
//!
//! let class = resolver.resolve_class(class_index, context)?;
//! let call = resolver.resolve_method(method_index, context, SpecialMode::Ordinary, true)?;
//! let method = call.require_method()?;
//! ```
use crate::{config::ResolverConfig, metrics::ResolutionMetrics};
use jvm_types::ClassLoading;
use jvm_utils::sync::Arc;

mod classes;
mod fields;
mod methods;

pub use methods::SpecialMode;

/// Service for resolving constant-pool references.
pub struct ResolverService<'l> {
    pub loader: &'l dyn ClassLoading,
    pub metrics: Arc<ResolutionMetrics>,
    pub config: ResolverConfig,
}

impl<'l> ResolverService<'l> {
    /// Creates a service configured from the environment.
    pub fn new(loader: &'l dyn ClassLoading) -> Self {
        Self::with_config(loader, ResolverConfig::from_env())
    }

    pub fn with_config(loader: &'l dyn ClassLoading, config: ResolverConfig) -> Self {
        Self {
            loader,
            metrics: Arc::new(ResolutionMetrics::new()),
            config,
        }
    }

    pub(crate) fn metrics(&self) -> Option<&ResolutionMetrics> {
        self.config.collect_metrics.then_some(&*self.metrics)
    }

    pub fn loader(&self) -> &'l dyn ClassLoading {
        self.loader
    }
}
