//! Named class lookup for `Class.forName`-style callers.
//!
//! `ClassNotFoundException` is the only checked exception such a lookup
//! throws, so a load failure that really means "this class does not exist"
//! is rewritten into [`ResolutionError::ClassNotFound`]:
//!
//! - a verification failure is always rewritten;
//! - `NoClassDefFoundError` is rewritten when it names the requested class
//!   itself, or when an array class was requested;
//! - `NoClassDefFoundError` for a dependency stays a linkage error;
//! - a class already recorded as `Failed` is never rewritten, so a second
//!   attempt reports the same error as any other use of that class.
//!
//! Failures while initializing the class are passed through unchanged.
use crate::resolver::ResolverService;
use jvm_types::{
    ARRAY_MARKER, ClassDescription,
    class::ClassState,
    error::{LoadError, ResolutionError},
};
use jvm_utils::{LoaderId, classname_to_pathname};
use tracing::debug;

impl<'l> ResolverService<'l> {
    /// Looks up a class by binary name (`java.lang.String`, `[I`,
    /// `[Ljava.lang.Object;`) through `loader`, optionally initializing it.
    pub fn class_for_name(
        &self,
        name: &str,
        loader: LoaderId,
        initialize: bool,
    ) -> Result<ClassDescription, ResolutionError> {
        let pathname = classname_to_pathname(name);
        let loaded = if pathname.starts_with(ARRAY_MARKER) {
            self.loader.load_array_class(&pathname, loader)
        } else {
            self.loader.load_named_class(&pathname, loader)
        };

        let class = loaded.map_err(|e| self.shape_load_error(&pathname, loader, e))?;
        if initialize && !class.is_at_least(ClassState::Complete) {
            self.loader.drive_linkage(class, ClassState::Complete)?;
        }
        Ok(class)
    }

    fn shape_load_error(&self, pathname: &str, loader: LoaderId, error: LoadError) -> ResolutionError {
        let upgrade = match &error {
            LoadError::Verify { .. } => true,
            LoadError::NoClassDefFound(missing) => {
                let already_failed = self
                    .loader
                    .find_loaded_class(pathname, loader)
                    .is_some_and(|c| c.state() == ClassState::Failed);
                !already_failed && (pathname.starts_with(ARRAY_MARKER) || &**missing == pathname)
            }
            _ => false,
        };

        if !upgrade {
            debug!("forName({}) failed: {}", pathname, error);
            return error.into();
        }
        if let Some(metrics) = self.metrics() {
            metrics.record_for_name_upgrade();
        }
        debug!("forName({}) failed, reporting ClassNotFound: {}", pathname, error);
        ResolutionError::ClassNotFound(error.to_string())
    }
}
