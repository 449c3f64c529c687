use std::fmt::{self, Display, Formatter};

/// Index of a slot in a class's constant pool.
///
/// Slot 0 is never a valid reference; class files number their entries from 1.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstIndex(pub u16);

impl Display for ConstIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u16> for ConstIndex {
    fn from(index: u16) -> Self {
        ConstIndex(index)
    }
}

impl From<ConstIndex> for usize {
    fn from(index: ConstIndex) -> Self {
        index.0 as usize
    }
}

impl ConstIndex {
    pub const NONE: Self = ConstIndex(0);

    pub fn new(index: u16) -> Self {
        ConstIndex(index)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Identity of a class loader. Classes are canonical per (name, loader) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LoaderId(pub u32);

impl Display for LoaderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_bootstrap() {
            write!(f, "<bootstrap>")
        } else {
            write!(f, "loader#{}", self.0)
        }
    }
}

impl LoaderId {
    pub const BOOTSTRAP: Self = LoaderId(0);

    pub fn is_bootstrap(self) -> bool {
        self == Self::BOOTSTRAP
    }
}
