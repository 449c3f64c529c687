use crate::{Utf8, constant_pool::ConstantTag};
use jvm_utils::ConstIndex;
use thiserror::Error;

/// Failures reported by the class-loading collaborator.
///
/// The `Display` form is the message a language-level throwable would carry;
/// for `NoClassDefFound` that is the internal name of the missing class.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("{0}")]
    NoClassDefFound(Utf8),
    #[error("{class}: {message}")]
    ClassFormat { class: Utf8, message: String },
    #[error("{class}: {message}")]
    Verify { class: Utf8, message: String },
    #[error("{class}: {message}")]
    Linkage { class: Utf8, message: String },
    #[error("{class}: {message}")]
    Initializer { class: Utf8, message: String },
    #[error("out of memory")]
    OutOfMemory,
}

impl LoadError {
    pub fn throwable_class(&self) -> &'static str {
        match self {
            LoadError::NoClassDefFound(_) => "java/lang/NoClassDefFoundError",
            LoadError::ClassFormat { .. } => "java/lang/ClassFormatError",
            LoadError::Verify { .. } => "java/lang/VerifyError",
            LoadError::Linkage { .. } => "java/lang/LinkageError",
            LoadError::Initializer { .. } => "java/lang/ExceptionInInitializerError",
            LoadError::OutOfMemory => "java/lang/OutOfMemoryError",
        }
    }
}

/// Semantic category of a [`ResolutionError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedConstantPool,
    ClassResolutionFailed,
    NoSuchMethod,
    NoSuchField,
    AbstractMethodInvoked,
    MalformedSignature,
    ClassNotFound,
    OutOfMemory,
}

/// Out-of-band error descriptor produced by resolution.
///
/// Nothing here is thrown; the top-level caller decides whether to discard it,
/// escalate it through [`ResolutionError::throwable_class`], or rewrite it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("malformed constant pool: expected {expected} at {index}, found {tag}")]
    MalformedConstantPool {
        index: ConstIndex,
        tag: ConstantTag,
        expected: &'static str,
    },
    #[error("class resolution failed: {0}")]
    ClassResolutionFailed(#[from] LoadError),
    #[error("{class}.{name}{signature}")]
    NoSuchMethod {
        class: Utf8,
        name: Utf8,
        signature: Utf8,
    },
    #[error("{class}.{name}")]
    NoSuchField { class: Utf8, name: Utf8 },
    #[error("{class}.{name}{signature}")]
    AbstractMethodInvoked {
        class: Utf8,
        name: Utf8,
        signature: Utf8,
    },
    #[error("malformed method signature: {0}")]
    MalformedSignature(Utf8),
    #[error("{0}")]
    ClassNotFound(String),
    #[error("out of memory")]
    OutOfMemory,
}

impl ResolutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolutionError::MalformedConstantPool { .. } => ErrorKind::MalformedConstantPool,
            ResolutionError::ClassResolutionFailed(_) => ErrorKind::ClassResolutionFailed,
            ResolutionError::NoSuchMethod { .. } => ErrorKind::NoSuchMethod,
            ResolutionError::NoSuchField { .. } => ErrorKind::NoSuchField,
            ResolutionError::AbstractMethodInvoked { .. } => ErrorKind::AbstractMethodInvoked,
            ResolutionError::MalformedSignature(_) => ErrorKind::MalformedSignature,
            ResolutionError::ClassNotFound(_) => ErrorKind::ClassNotFound,
            ResolutionError::OutOfMemory => ErrorKind::OutOfMemory,
        }
    }

    /// Internal name of the throwable a caller raises when escalating this error.
    pub fn throwable_class(&self) -> &'static str {
        match self {
            ResolutionError::MalformedConstantPool { .. } => "java/lang/ClassFormatError",
            ResolutionError::ClassResolutionFailed(e) => e.throwable_class(),
            ResolutionError::NoSuchMethod { .. } => "java/lang/NoSuchMethodError",
            ResolutionError::NoSuchField { .. } => "java/lang/NoSuchFieldError",
            ResolutionError::AbstractMethodInvoked { .. } => "java/lang/AbstractMethodError",
            ResolutionError::MalformedSignature(_) => "java/lang/ClassFormatError",
            ResolutionError::ClassNotFound(_) => "java/lang/ClassNotFoundException",
            ResolutionError::OutOfMemory => "java/lang/OutOfMemoryError",
        }
    }

    /// `ClassNotFound` is the only checked exception this layer produces.
    pub fn is_checked_exception(&self) -> bool {
        matches!(self, ResolutionError::ClassNotFound(_))
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            ResolutionError::ClassResolutionFailed(e) => Some(e),
            _ => None,
        }
    }
}
