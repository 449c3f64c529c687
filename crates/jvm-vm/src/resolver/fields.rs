use crate::{binding::FieldInfo, lookup::find_field_local, resolver::ResolverService};
use jvm_types::{
    ClassDescription,
    access::AccessFlags,
    constant_pool::Constant,
    error::ResolutionError,
    members::FieldDescription,
};
use jvm_utils::ConstIndex;
use tracing::{debug, trace};

impl<'l> ResolverService<'l> {
    /// Resolves the `Fieldref` at `index` to a field declared by the named
    /// class itself. Superclasses are not searched.
    pub fn resolve_field(
        &self,
        index: ConstIndex,
        context: ClassDescription,
        is_static: bool,
    ) -> Result<FieldInfo, ResolutionError> {
        let pool = context.definition().constants();
        let Constant::Fieldref {
            class: class_index,
            name_and_type,
        } = pool.read(index)
        else {
            debug!("no Fieldref found for {} in {:?}", index, context);
            return Err(ResolutionError::MalformedConstantPool {
                index,
                tag: pool.tag(index),
                expected: "Fieldref",
            });
        };

        let class = self.resolve_class(class_index, context)?;
        let (name, signature) = pool.name_and_type(name_and_type)?;
        trace!("resolve_field({:?}, {}, {})", class, name, signature);

        let field = find_field_local(class, &name, is_static).filter(|f| accessible(f, context));
        if let Some(metrics) = self.metrics() {
            metrics.record_field_lookup(field.is_some());
        }
        match field {
            Some(field) => Ok(FieldInfo { class, field }),
            None => {
                debug!("no field {} in {:?}", name, class);
                Err(ResolutionError::NoSuchField {
                    class: class.name().clone(),
                    name,
                })
            }
        }
    }
}

/// Private fields are only visible to their declaring class.
fn accessible(field: &FieldDescription, context: ClassDescription) -> bool {
    !field.field.access_flags().contains(AccessFlags::PRIVATE) || field.parent == context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use jvm_loader::{ClassRegistry, ClassSource};
    use jvm_types::{ClassLoading, constant_pool::ConstantTag, error::ErrorKind};
    use jvm_utils::LoaderId;

    fn load(registry: &ClassRegistry, source: ClassSource) -> ClassDescription {
        let name = source.name().clone();
        registry.add_source(LoaderId::BOOTSTRAP, source);
        registry.load_named_class(&name, LoaderId::BOOTSTRAP).unwrap()
    }

    #[test]
    fn test_instance_and_static_fields() {
        let registry = ClassRegistry::new();
        let point = load(
            &registry,
            ClassSource::new("Point")
                .field("x", "I", AccessFlags::PUBLIC)
                .field("ORIGIN", "LPoint;", AccessFlags::PUBLIC | AccessFlags::STATIC),
        );
        let mut main = ClassSource::new("Main");
        let x = main.pool().field_ref("Point", "x", "I");
        let origin = main.pool().field_ref("Point", "ORIGIN", "LPoint;");
        let main = load(&registry, main);
        let r = ResolverService::with_config(&registry, ResolverConfig::default());

        let info = r.resolve_field(x, main, false).unwrap();
        assert_eq!(info.class, point);
        assert_eq!((&**info.name(), &**info.signature()), ("x", "I"));
        assert!(!info.is_static());

        assert!(r.resolve_field(origin, main, true).unwrap().is_static());
        let err = r.resolve_field(origin, main, false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSuchField);
        assert_eq!(r.metrics.snapshot().fields_not_found, 1);
    }

    #[test]
    fn test_private_field_of_other_class_is_absent() {
        let registry = ClassRegistry::new();
        let mut vault = ClassSource::new("Vault").field("secret", "J", AccessFlags::PRIVATE);
        let own = vault.pool().field_ref("Vault", "secret", "J");
        let vault = load(&registry, vault);
        let mut thief = ClassSource::new("Thief");
        let stolen = thief.pool().field_ref("Vault", "secret", "J");
        let thief = load(&registry, thief);
        let r = ResolverService::with_config(&registry, ResolverConfig::default());

        assert_eq!(r.resolve_field(own, vault, false).unwrap().class, vault);
        assert_eq!(
            r.resolve_field(stolen, thief, false).unwrap_err(),
            ResolutionError::NoSuchField {
                class: "Vault".into(),
                name: "secret".into(),
            }
        );
    }

    #[test]
    fn test_wrong_tag_and_missing_class() {
        let registry = ClassRegistry::new();
        let mut main = ClassSource::new("Main");
        let m = main.pool().method_ref("Main", "f", "()V");
        let gone = main.pool().field_ref("Gone", "f", "I");
        let main = load(&registry, main);
        let r = ResolverService::with_config(&registry, ResolverConfig::default());

        assert_eq!(
            r.resolve_field(m, main, false).unwrap_err(),
            ResolutionError::MalformedConstantPool {
                index: m,
                tag: ConstantTag::Methodref,
                expected: "Fieldref",
            }
        );
        assert_eq!(
            r.resolve_field(gone, main, false).unwrap_err().kind(),
            ErrorKind::ClassResolutionFailed
        );
    }
}
