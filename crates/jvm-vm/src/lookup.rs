//! Search of a single class's own member tables.
//!
//! Nothing here resolves classes or takes a resolution lock, and visibility is
//! not checked. The one side effect is the abstract-method trap.
use jvm_types::{
    ClassDescription,
    members::{FieldDescription, Member, MethodDescription},
};
use tracing::trace;

/// Finds the method `name` + `signature` declared by `class` itself.
///
/// An abstract method of a non-interface class gets the abstract-method trap
/// installed every time it is found, so invoking it fails cleanly.
pub fn find_method_local(
    class: ClassDescription,
    name: &str,
    signature: &str,
) -> Option<MethodDescription> {
    let def = class.definition();
    let found = def
        .methods()
        .iter()
        .find(|m| &**m.name() == name && &**m.signature() == signature);

    match found {
        Some(method) => {
            if method.is_abstract() && !def.is_interface() {
                method.install_abstract_trap();
            }
            trace!("find_method_local({:?}, {}, {}) -> found", class, name, signature);
            Some(MethodDescription {
                parent: class,
                method,
            })
        }
        None => {
            trace!("find_method_local({:?}, {}, {}) -> NOT FOUND", class, name, signature);
            None
        }
    }
}

/// Finds the field `name` declared by `class` itself with the given static-ness.
pub fn find_field_local(
    class: ClassDescription,
    name: &str,
    is_static: bool,
) -> Option<FieldDescription> {
    let field = class
        .definition()
        .fields()
        .iter()
        .find(|f| &**f.name() == name && f.is_static() == is_static)?;
    Some(FieldDescription {
        parent: class,
        field,
    })
}

/// Finds a method or field declared by `class` with this exact name and
/// signature, without resolving anything. Methods are searched first.
pub fn find_declared_member(class: ClassDescription, name: &str, signature: &str) -> Option<Member> {
    if let Some(method) = find_method_local(class, name, signature) {
        return Some(method.into());
    }
    class
        .definition()
        .fields()
        .iter()
        .find(|f| &**f.name() == name && &**f.signature() == signature)
        .map(|field| {
            FieldDescription {
                parent: class,
                field,
            }
            .into()
        })
}
