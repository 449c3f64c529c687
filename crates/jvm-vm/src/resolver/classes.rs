use crate::resolver::ResolverService;
use jvm_types::{
    ARRAY_MARKER, ClassDescription,
    constant_pool::{Constant, ConstantTag},
    error::ResolutionError,
};
use jvm_utils::ConstIndex;
use tracing::debug;

impl<'l> ResolverService<'l> {
    /// Resolves the `Class` slot at `index` in `context`'s constant pool.
    ///
    /// On success the slot holds the class for good and the class is at
    /// least `Linked`. Loader failures are passed through unchanged and leave
    /// the slot untouched.
    pub fn resolve_class(
        &self,
        index: ConstIndex,
        context: ClassDescription,
    ) -> Result<ClassDescription, ResolutionError> {
        let pool = context.definition().constants();

        if let Constant::ResolvedClass(class) = pool.read(index) {
            if let Some(metrics) = self.metrics() {
                metrics.record_class_slot_hit();
            }
            return Ok(class);
        }

        let name = {
            let _guard = context.lock_resolution();
            let slot = pool.read(index);
            if let Constant::ResolvedClass(class) = slot {
                if let Some(metrics) = self.metrics() {
                    metrics.record_class_slot_hit();
                }
                return Ok(class);
            }
            if let Some(metrics) = self.metrics() {
                metrics.record_class_slot_miss();
            }
            match slot {
                Constant::Class(name) => pool.utf8(name)?,
                other => {
                    debug!("no Class found for {} in {:?}", index, context);
                    return Err(ResolutionError::MalformedConstantPool {
                        index,
                        tag: other.tag(),
                        expected: "Class",
                    });
                }
            }
        };

        if let Some(metrics) = self.metrics() {
            metrics.record_external_load();
        }
        let loaded = if name.starts_with(ARRAY_MARKER) {
            self.loader.load_array_class(&name, context.loader())
        } else {
            self.loader.load_named_class(&name, context.loader())
        };
        let class = loaded.map_err(|e| {
            debug!("resolving {} from {:?} failed: {}", name, context, e);
            ResolutionError::from(e)
        })?;

        let guard = context.lock_resolution();
        if pool.tag(index) == ConstantTag::ResolvedClass
            && let Some(metrics) = self.metrics()
        {
            metrics.record_redundant_slot_write();
        }
        pool.compare_and_resolve_class(&guard, index, class)
    }
}
