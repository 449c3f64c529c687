use crate::{
    binding::{CallInfo, MethodRefError},
    lookup::find_method_local,
    resolver::ResolverService,
};
use jvm_types::{
    ClassDescription,
    class::ClassState,
    constant_pool::Constant,
    error::{ErrorKind, ResolutionError},
    members::{CONSTRUCTOR_NAME, MethodDescription},
    signature::MethodSignature,
};
use jvm_utils::ConstIndex;
use tracing::debug;

/// How the search for a method implementation is rooted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpecialMode {
    #[default]
    Ordinary,
    /// `invokespecial` naming a superclass or private method.
    Special,
    /// Interface super-call; falls back to the resolved class's direct interfaces.
    InterfaceSuper,
}

impl<'l> ResolverService<'l> {
    /// Resolves the `Methodref` or `InterfaceMethodref` at `index`.
    ///
    /// With `eager` unset only the name, signature and stack accounting are
    /// produced and nothing is loaded. Otherwise the owning class is resolved
    /// and searched; finding no method is still a success.
    pub fn resolve_method(
        &self,
        index: ConstIndex,
        context: ClassDescription,
        mode: SpecialMode,
        eager: bool,
    ) -> Result<CallInfo, MethodRefError> {
        let pool = context.definition().constants();
        let (class_index, name_and_type) = match pool.read(index) {
            Constant::Methodref {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodref {
                class,
                name_and_type,
            } => (class, name_and_type),
            other => {
                debug!("no Methodref found for {} in {:?}", index, context);
                return Err(ResolutionError::MalformedConstantPool {
                    index,
                    tag: other.tag(),
                    expected: "Methodref",
                }
                .into());
            }
        };

        let (name, signature) = pool.name_and_type(name_and_type)?;
        let arity = match MethodSignature::parse(&signature) {
            Ok(arity) => arity,
            Err(error) => {
                // Name and signature still reach the caller, with no stack effect.
                let mut info = CallInfo::unresolved(name, signature, MethodSignature::EMPTY);
                info.class_name = pool.class_name(class_index).ok();
                return Err(MethodRefError {
                    partial: Some(info),
                    error,
                });
            }
        };
        let mut info = CallInfo::unresolved(name, signature, arity);
        if !eager {
            return Ok(info);
        }

        let class = match self.resolve_class(class_index, context) {
            Ok(class) => class,
            Err(error) if error.kind() == ErrorKind::MalformedConstantPool => {
                return Err(error.into());
            }
            Err(error) => {
                info.class_name = pool.class_name(class_index).ok();
                return Err(MethodRefError {
                    partial: Some(info),
                    error,
                });
            }
        };
        info.class = Some(class);
        info.class_name = Some(class.name().clone());

        let mut root = Some(class);
        if mode == SpecialMode::Special
            && &*info.name != CONSTRUCTOR_NAME
            && class != context
            && context.is_subtype_of(class)
        {
            root = context.superclass();
        }

        info.method = root
            .into_iter()
            .flat_map(ClassDescription::ancestors)
            .find_map(|c| find_method_local(c, &info.name, &info.signature));

        if info.method.is_none() && mode == SpecialMode::InterfaceSuper {
            info.method = class
                .definition()
                .interfaces()
                .iter()
                .rev()
                .find_map(|i| find_method_local(*i, &info.name, &info.signature));
        }

        if let Some(metrics) = self.metrics() {
            metrics.record_method_lookup(info.method.is_some());
        }
        if self.config.log_lookups {
            debug!(
                "resolve_method({:?}, {}, {}) -> {}",
                class,
                info.name,
                info.signature,
                if info.method.is_some() {
                    "success"
                } else {
                    "failure"
                }
            );
        }
        Ok(info)
    }

    /// Finds the implementation of `name` + `signature` for a class about to
    /// be used, driving the class to `Complete` first.
    pub fn find_method(
        &self,
        class: ClassDescription,
        name: &str,
        signature: &str,
    ) -> Result<MethodDescription, ResolutionError> {
        if !class.is_at_least(ClassState::Complete) {
            self.loader.drive_linkage(class, ClassState::Complete)?;
        }

        let found = class
            .ancestors()
            .find_map(|c| find_method_local(c, name, signature));
        if let Some(metrics) = self.metrics() {
            metrics.record_method_lookup(found.is_some());
        }
        found.ok_or_else(|| {
            debug!("find_method({:?}, {}, {}) -> NOT FOUND", class, name, signature);
            ResolutionError::NoSuchMethod {
                class: class.name().clone(),
                name: name.into(),
                signature: signature.into(),
            }
        })
    }
}
