//! Per-class constant pool.
//!
//! The shape of the pool is fixed once a class is built. The only mutation is
//! a `Class` slot turning into a resolved class reference, which happens at
//! most once per slot and is serialized by the owning class's resolution lock.
use crate::{ClassDescription, Utf8, error::ResolutionError};
use jvm_utils::{ConstIndex, sync::OnceLock};
use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter},
};

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantTag {
    Unusable = 0,
    Utf8 = 1,
    Integer = 3,
    Class = 7,
    String = 8,
    Fieldref = 9,
    Methodref = 10,
    InterfaceMethodref = 11,
    NameAndType = 12,
    ResolvedClass = 23,
}

impl Display for ConstantTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as u8)
    }
}

/// A snapshot of one constant-pool slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Unusable,
    Utf8(Utf8),
    Integer(i32),
    String(ConstIndex),
    Class(ConstIndex),
    ResolvedClass(ClassDescription),
    Fieldref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    Methodref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    InterfaceMethodref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    NameAndType {
        name: ConstIndex,
        signature: ConstIndex,
    },
}

impl Constant {
    pub fn tag(&self) -> ConstantTag {
        match self {
            Constant::Unusable => ConstantTag::Unusable,
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::String(_) => ConstantTag::String,
            Constant::Class(_) => ConstantTag::Class,
            Constant::ResolvedClass(_) => ConstantTag::ResolvedClass,
            Constant::Fieldref { .. } => ConstantTag::Fieldref,
            Constant::Methodref { .. } => ConstantTag::Methodref,
            Constant::InterfaceMethodref { .. } => ConstantTag::InterfaceMethodref,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
        }
    }
}

/// Unresolved form of a slot, as produced by a class-file reader.
#[derive(Clone, Debug, PartialEq)]
pub enum PoolEntry {
    Unusable,
    Utf8(Utf8),
    Integer(i32),
    String(ConstIndex),
    Class(ConstIndex),
    Fieldref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    Methodref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    InterfaceMethodref {
        class: ConstIndex,
        name_and_type: ConstIndex,
    },
    NameAndType {
        name: ConstIndex,
        signature: ConstIndex,
    },
}

enum Slot {
    Fixed(Constant),
    Class {
        name: ConstIndex,
        resolved: OnceLock<ClassDescription>,
    },
}

pub struct ConstantPool {
    slots: Box<[Slot]>,
}

impl fmt::Debug for ConstantPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.slots.len()).map(|i| self.read(ConstIndex(i as u16))))
            .finish()
    }
}

impl ConstantPool {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1
    }

    /// Reads a slot without taking any lock. Out-of-range indices read as
    /// `Unusable`.
    pub fn read(&self, index: ConstIndex) -> Constant {
        match self.slots.get(index.as_usize()) {
            None => Constant::Unusable,
            Some(Slot::Fixed(c)) => c.clone(),
            Some(Slot::Class { name, resolved }) => match resolved.get() {
                Some(class) => Constant::ResolvedClass(*class),
                None => Constant::Class(*name),
            },
        }
    }

    pub fn tag(&self, index: ConstIndex) -> ConstantTag {
        match self.slots.get(index.as_usize()) {
            None => ConstantTag::Unusable,
            Some(Slot::Fixed(c)) => c.tag(),
            Some(Slot::Class { resolved, .. }) => {
                if resolved.get().is_some() {
                    ConstantTag::ResolvedClass
                } else {
                    ConstantTag::Class
                }
            }
        }
    }

    pub fn utf8(&self, index: ConstIndex) -> Result<Utf8, ResolutionError> {
        match self.read(index) {
            Constant::Utf8(s) => Ok(s),
            other => Err(malformed(index, other.tag(), "Utf8")),
        }
    }

    /// Name and signature strings of a `NameAndType` slot.
    pub fn name_and_type(&self, index: ConstIndex) -> Result<(Utf8, Utf8), ResolutionError> {
        match self.read(index) {
            Constant::NameAndType { name, signature } => {
                Ok((self.utf8(name)?, self.utf8(signature)?))
            }
            other => Err(malformed(index, other.tag(), "NameAndType")),
        }
    }

    /// Internal name named by a `Class` slot, resolved or not.
    pub fn class_name(&self, index: ConstIndex) -> Result<Utf8, ResolutionError> {
        match self.read(index) {
            Constant::Class(name) => self.utf8(name),
            Constant::ResolvedClass(class) => Ok(class.name().clone()),
            other => Err(malformed(index, other.tag(), "Class")),
        }
    }

    /// Transitions a `Class` slot to `ResolvedClass`.
    ///
    /// The caller must hold the owning class's resolution lock, which the
    /// guard parameter witnesses. Redundant calls are harmless: a slot that is
    /// already resolved keeps its value, and the canonical value is returned.
    pub fn compare_and_resolve_class<G>(
        &self,
        _guard: &G,
        index: ConstIndex,
        class: ClassDescription,
    ) -> Result<ClassDescription, ResolutionError> {
        match self.slots.get(index.as_usize()) {
            Some(Slot::Class { resolved, .. }) => {
                let stored = *resolved.get_or_init(|| class);
                if stored != class {
                    tracing::warn!(
                        "constant pool slot {} already resolved to {:?}, ignoring {:?}",
                        index,
                        stored,
                        class
                    );
                }
                Ok(stored)
            }
            _ => Err(malformed(index, self.tag(index), "Class")),
        }
    }
}

fn malformed(index: ConstIndex, tag: ConstantTag, expected: &'static str) -> ResolutionError {
    ResolutionError::MalformedConstantPool {
        index,
        tag,
        expected,
    }
}

/// Assembles a constant pool, deduplicating strings and class references.
///
/// Slot 0 is reserved and always `Unusable`.
#[derive(Clone, Debug)]
pub struct ConstantPoolBuilder {
    entries: Vec<PoolEntry>,
    utf8s: HashMap<Utf8, ConstIndex>,
    classes: HashMap<ConstIndex, ConstIndex>,
}

impl Default for ConstantPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPoolBuilder {
    pub fn new() -> Self {
        Self {
            entries: vec![PoolEntry::Unusable],
            utf8s: HashMap::new(),
            classes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Appends an entry verbatim, without validating the indices it carries.
    pub fn push(&mut self, entry: PoolEntry) -> ConstIndex {
        let index = match u16::try_from(self.entries.len()) {
            Ok(i) => ConstIndex(i),
            Err(_) => panic!("constant pool overflow: more than {} entries", u16::MAX),
        };
        self.entries.push(entry);
        index
    }

    pub fn utf8(&mut self, s: &str) -> ConstIndex {
        if let Some(idx) = self.utf8s.get(s) {
            return *idx;
        }
        let value: Utf8 = s.into();
        let idx = self.push(PoolEntry::Utf8(value.clone()));
        self.utf8s.insert(value, idx);
        idx
    }

    pub fn integer(&mut self, value: i32) -> ConstIndex {
        self.push(PoolEntry::Integer(value))
    }

    pub fn string(&mut self, s: &str) -> ConstIndex {
        let utf = self.utf8(s);
        self.push(PoolEntry::String(utf))
    }

    pub fn class(&mut self, name: &str) -> ConstIndex {
        let utf = self.utf8(name);
        if let Some(idx) = self.classes.get(&utf) {
            return *idx;
        }
        let idx = self.push(PoolEntry::Class(utf));
        self.classes.insert(utf, idx);
        idx
    }

    pub fn name_and_type(&mut self, name: &str, signature: &str) -> ConstIndex {
        let name = self.utf8(name);
        let signature = self.utf8(signature);
        self.push(PoolEntry::NameAndType { name, signature })
    }

    pub fn field_ref(&mut self, class: &str, name: &str, signature: &str) -> ConstIndex {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, signature);
        self.push(PoolEntry::Fieldref {
            class,
            name_and_type,
        })
    }

    pub fn method_ref(&mut self, class: &str, name: &str, signature: &str) -> ConstIndex {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, signature);
        self.push(PoolEntry::Methodref {
            class,
            name_and_type,
        })
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, signature: &str) -> ConstIndex {
        let class = self.class(class);
        let name_and_type = self.name_and_type(name, signature);
        self.push(PoolEntry::InterfaceMethodref {
            class,
            name_and_type,
        })
    }

    pub fn build(&self) -> ConstantPool {
        let slots = self
            .entries
            .iter()
            .map(|e| match e {
                PoolEntry::Class(name) => Slot::Class {
                    name: *name,
                    resolved: OnceLock::new(),
                },
                PoolEntry::Unusable => Slot::Fixed(Constant::Unusable),
                PoolEntry::Utf8(s) => Slot::Fixed(Constant::Utf8(s.clone())),
                PoolEntry::Integer(i) => Slot::Fixed(Constant::Integer(*i)),
                PoolEntry::String(s) => Slot::Fixed(Constant::String(*s)),
                PoolEntry::Fieldref {
                    class,
                    name_and_type,
                } => Slot::Fixed(Constant::Fieldref {
                    class: *class,
                    name_and_type: *name_and_type,
                }),
                PoolEntry::Methodref {
                    class,
                    name_and_type,
                } => Slot::Fixed(Constant::Methodref {
                    class: *class,
                    name_and_type: *name_and_type,
                }),
                PoolEntry::InterfaceMethodref {
                    class,
                    name_and_type,
                } => Slot::Fixed(Constant::InterfaceMethodref {
                    class: *class,
                    name_and_type: *name_and_type,
                }),
                PoolEntry::NameAndType { name, signature } => Slot::Fixed(Constant::NameAndType {
                    name: *name,
                    signature: *signature,
                }),
            })
            .collect();
        ConstantPool { slots }
    }
}
