/// Class and Instance object types. Attribute storage on both is a Dict
/// keyed by interned symbols; instance lookup falls back to the class.
use std::fmt;

use crate::containers::HashIndexedAnyContainer;
use crate::dict::Dict;
use crate::error::{ErrorKind, RuntimeError};
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::safeptr::{CellPtr, MutatorScope, ScopedPtr, TaggedScopedPtr};
use crate::symbol::Symbol;
use crate::taggedptr::Value;

pub struct Class {
    name: CellPtr<Symbol>,
    attrs: CellPtr<Dict>,
}

impl Class {
    /// Allocate a Class object on the heap
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        name: &str,
    ) -> Result<ScopedPtr<'guard, Class>, RuntimeError> {
        let name = match *mem.lookup_sym(name) {
            Value::Symbol(s) => s,
            _ => unreachable!("symbol lookup returns a symbol"),
        };

        let attrs = Dict::alloc(mem)?;

        mem.alloc(Class {
            name: CellPtr::new_with(name),
            attrs: CellPtr::new_with(attrs),
        })
    }

    pub fn name<'guard>(&self, guard: &'guard dyn MutatorScope) -> &'guard str {
        self.name.get(guard).as_str(guard)
    }

    /// Class-level attribute storage
    pub fn attrs<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Dict> {
        self.attrs.get(guard)
    }

    /// Look up a class attribute by symbol
    pub fn lookup_attr<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        name: TaggedScopedPtr<'guard>,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        self.attrs.get(guard).lookup(guard, name)
    }

    /// Set a class attribute
    pub fn set_attr<'guard>(
        &self,
        mem: &'guard MutatorView,
        name: TaggedScopedPtr<'guard>,
        value: TaggedScopedPtr<'guard>,
    ) -> Result<(), RuntimeError> {
        self.attrs.get(mem).assoc(mem, name, value)
    }
}

impl Print for Class {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<class '{}'>", self.name(guard))
    }
}

pub struct Instance {
    class: CellPtr<Class>,
    attrs: CellPtr<Dict>,
}

impl Instance {
    /// Allocate an Instance of the given Class on the heap
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        class: ScopedPtr<'guard, Class>,
    ) -> Result<ScopedPtr<'guard, Instance>, RuntimeError> {
        let attrs = Dict::alloc(mem)?;

        mem.alloc(Instance {
            class: CellPtr::new_with(class),
            attrs: CellPtr::new_with(attrs),
        })
    }

    pub fn class<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Class> {
        self.class.get(guard)
    }

    /// Instance-level attribute storage
    pub fn attrs<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Dict> {
        self.attrs.get(guard)
    }

    /// Look up an attribute by symbol, falling back to the class when the
    /// instance has no binding of its own
    pub fn lookup_attr<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        name: TaggedScopedPtr<'guard>,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        match self.attrs.get(guard).lookup(guard, name) {
            Ok(value) => Ok(value),
            Err(e) if *e.error_kind() == ErrorKind::KeyError => {
                self.class.get(guard).lookup_attr(guard, name)
            }
            Err(e) => Err(e),
        }
    }

    /// Set an instance attribute
    pub fn set_attr<'guard>(
        &self,
        mem: &'guard MutatorView,
        name: TaggedScopedPtr<'guard>,
        value: TaggedScopedPtr<'guard>,
    ) -> Result<(), RuntimeError> {
        self.attrs.get(mem).assoc(mem, name, value)
    }
}

impl Print for Instance {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<{} object>", self.class.get(guard).name(guard))
    }
}

#[cfg(test)]
mod test {
    use super::{Class, Instance};
    use crate::error::{ErrorKind, RuntimeError};
    use crate::memory::{Memory, Mutator, MutatorView};

    #[test]
    fn instance_attr_fallback_to_class() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let class = Class::alloc(mem, "Point")?;
                let instance = Instance::alloc(mem, class)?;

                let attr = mem.lookup_sym("origin");
                let class_val = mem.number(0);
                let inst_val = mem.number(7);

                // not set anywhere yet
                match instance.lookup_attr(mem, attr) {
                    Ok(_) => panic!("attribute should not exist yet"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::KeyError),
                }

                // set on the class, visible through the instance
                class.set_attr(mem, attr, class_val)?;
                assert!(instance.lookup_attr(mem, attr)? == class_val);

                // instance binding shadows the class binding
                instance.set_attr(mem, attr, inst_val)?;
                assert!(instance.lookup_attr(mem, attr)? == inst_val);
                assert!(class.lookup_attr(mem, attr)? == class_val);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
