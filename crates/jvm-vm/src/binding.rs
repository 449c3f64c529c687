use jvm_types::{
    ClassDescription, Utf8,
    error::ResolutionError,
    members::{FieldDescription, MethodDescription},
    signature::MethodSignature,
};
use thiserror::Error;

/// Outcome of resolving a method reference.
///
/// `name`, `signature` and the stack accounting are filled in whenever the
/// reference itself is well formed, even when the owning class could not be
/// resolved. A resolved class with no `method` is a valid result; the caller
/// reports the missing method where it is used.
#[derive(Clone, Debug, PartialEq)]
pub struct CallInfo {
    /// The statically resolved class, not necessarily the one declaring `method`.
    pub class: Option<ClassDescription>,
    pub class_name: Option<Utf8>,
    pub method: Option<MethodDescription>,
    pub name: Utf8,
    pub signature: Utf8,
    pub ins: u16,
    pub outs: u8,
    pub return_type: char,
}

impl CallInfo {
    pub(crate) fn unresolved(name: Utf8, signature: Utf8, arity: MethodSignature) -> Self {
        Self {
            class: None,
            class_name: None,
            method: None,
            name,
            signature,
            ins: arity.ins,
            outs: arity.outs,
            return_type: arity.return_type,
        }
    }

    /// The bound method, or the `NoSuchMethod` error a use site raises.
    pub fn require_method(&self) -> Result<MethodDescription, ResolutionError> {
        self.method.ok_or_else(|| ResolutionError::NoSuchMethod {
            class: self.class_name.clone().unwrap_or_else(|| "".into()),
            name: self.name.clone(),
            signature: self.signature.clone(),
        })
    }
}

/// Failed method resolution, together with whatever could be bound before
/// the failure.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{error}")]
pub struct MethodRefError {
    /// Present exactly when the reference was well formed but its class did
    /// not resolve.
    pub partial: Option<CallInfo>,
    #[source]
    pub error: ResolutionError,
}

impl From<ResolutionError> for MethodRefError {
    fn from(error: ResolutionError) -> Self {
        Self {
            partial: None,
            error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldInfo {
    pub class: ClassDescription,
    pub field: FieldDescription,
}

impl FieldInfo {
    pub fn name(&self) -> &Utf8 {
        self.field.field.name()
    }

    pub fn signature(&self) -> &Utf8 {
        self.field.field.signature()
    }

    pub fn is_static(&self) -> bool {
        self.field.field.is_static()
    }
}
