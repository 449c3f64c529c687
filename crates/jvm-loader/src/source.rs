use jvm_types::{
    Utf8,
    access::AccessFlags,
    constant_pool::ConstantPoolBuilder,
    members::{Field, Method},
};

/// A failure the registry reproduces when it processes a class.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadFault {
    /// Reported while defining the class; nothing is recorded.
    Format(String),
    /// Reported while linking; the class is recorded as `Failed`.
    Verify(String),
    /// Reported by static initialization on the way to `Complete`.
    Initializer(String),
}

#[derive(Clone, Debug)]
pub(crate) struct MemberSpec {
    pub name: Utf8,
    pub signature: Utf8,
    pub access: AccessFlags,
}

/// The parsed form of a class file as the registry sees it: names of the
/// supertypes, member tables and a constant pool still being assembled.
#[derive(Clone, Debug)]
pub struct ClassSource {
    pub(crate) name: Utf8,
    pub(crate) access: AccessFlags,
    pub(crate) superclass: Option<Utf8>,
    pub(crate) interfaces: Vec<Utf8>,
    pub(crate) methods: Vec<MemberSpec>,
    pub(crate) fields: Vec<MemberSpec>,
    pub(crate) pool: ConstantPoolBuilder,
    pub(crate) fault: Option<LoadFault>,
}

impl ClassSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            access: AccessFlags::PUBLIC,
            superclass: None,
            interfaces: vec![],
            methods: vec![],
            fields: vec![],
            pool: ConstantPoolBuilder::new(),
            fault: None,
        }
    }

    pub fn interface(name: &str) -> Self {
        let mut this = Self::new(name);
        this.access = AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT;
        this
    }

    pub fn name(&self) -> &Utf8 {
        &self.name
    }

    pub fn access(mut self, access: AccessFlags) -> Self {
        self.access = access;
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn method(mut self, name: &str, signature: &str, access: AccessFlags) -> Self {
        self.methods.push(MemberSpec {
            name: name.into(),
            signature: signature.into(),
            access,
        });
        self
    }

    pub fn abstract_method(self, name: &str, signature: &str) -> Self {
        self.method(name, signature, AccessFlags::PUBLIC | AccessFlags::ABSTRACT)
    }

    pub fn field(mut self, name: &str, signature: &str, access: AccessFlags) -> Self {
        self.fields.push(MemberSpec {
            name: name.into(),
            signature: signature.into(),
            access,
        });
        self
    }

    pub fn with_fault(mut self, fault: LoadFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// The constant pool under construction. Indices handed out here are the
    /// indices the loaded class will use.
    pub fn pool(&mut self) -> &mut ConstantPoolBuilder {
        &mut self.pool
    }

    pub(crate) fn build_methods(&self) -> Vec<Method> {
        self.methods
            .iter()
            .map(|m| Method::new(m.name.clone(), m.signature.clone(), m.access))
            .collect()
    }

    pub(crate) fn build_fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .map(|f| Field::new(f.name.clone(), f.signature.clone(), f.access))
            .collect()
    }
}
