/// A mutable Set of unique values, built on the Dict hash table with the
/// members stored as keys.
use std::fmt;

use crate::containers::{Container, HashIndexedAnyContainer};
use crate::dict::{Dict, DictItem};
use crate::error::{ErrorKind, RuntimeError};
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::rawarray::ArraySize;
use crate::safeptr::{MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};

pub struct Set {
    members: Dict,
}

impl Set {
    /// Allocate a new instance on the heap
    pub fn alloc<'guard>(mem: &'guard MutatorView) -> Result<ScopedPtr<'guard, Set>, RuntimeError> {
        mem.alloc(Set::new())
    }

    /// Add a member. Adding an existing member is a no-op.
    pub fn add<'guard>(
        &self,
        mem: &'guard MutatorView,
        member: TaggedScopedPtr<'guard>,
    ) -> Result<(), RuntimeError> {
        self.members.assoc(mem, member, mem.boolean(true))
    }

    /// Return true if the value is a member of the set
    pub fn contains<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        member: TaggedScopedPtr,
    ) -> Result<bool, RuntimeError> {
        self.members.exists(guard, member)
    }

    /// Remove a member, erroring if it was not present
    pub fn remove<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        member: TaggedScopedPtr,
    ) -> Result<(), RuntimeError> {
        self.members.dissoc(guard, member)?;
        Ok(())
    }

    /// Remove a member if present, reporting whether it was
    pub fn discard<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        member: TaggedScopedPtr,
    ) -> Result<bool, RuntimeError> {
        match self.members.dissoc(guard, member) {
            Ok(_) => Ok(true),
            Err(e) if *e.error_kind() == ErrorKind::KeyError => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Call the given function once per member
    pub fn each_member<'guard, F>(
        &self,
        guard: &'guard dyn MutatorScope,
        mut f: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&TaggedCellPtr),
    {
        self.members.each_entry(guard, |key, _value| f(key))
    }
}

impl Container<DictItem> for Set {
    fn new() -> Set {
        Set {
            members: Dict::new(),
        }
    }

    fn with_capacity<'guard>(
        mem: &'guard MutatorView,
        capacity: ArraySize,
    ) -> Result<Set, RuntimeError> {
        Ok(Set {
            members: Dict::with_capacity(mem, capacity)?,
        })
    }

    fn clear<'guard>(&self, mem: &'guard MutatorView) -> Result<(), RuntimeError> {
        self.members.clear(mem)
    }

    fn length(&self) -> ArraySize {
        self.members.length()
    }
}

impl Print for Set {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        if self.length() == 0 {
            return write!(f, "set()");
        }

        write!(f, "{{")?;

        let mut first = true;
        self.each_member(guard, |member| {
            if !first {
                let _ = write!(f, ", ");
            }
            first = false;
            let _ = write!(f, "{}", member.get(guard).value());
        })
        .map_err(|_| fmt::Error)?;

        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::{Container, Set};
    use crate::error::{ErrorKind, RuntimeError};
    use crate::memory::{Memory, Mutator, MutatorView};

    #[test]
    fn set_add_contains_remove() {
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
                let set = Set::new();

                let member = mem.lookup_sym("member");
                let other = mem.lookup_sym("other");

                set.add(mem, member)?;
                assert!(set.contains(mem, member)?);
                assert!(!set.contains(mem, other)?);
                assert!(set.length() == 1);

                // adding again does not grow the set
                set.add(mem, member)?;
                assert!(set.length() == 1);

                set.remove(mem, member)?;
                assert!(!set.contains(mem, member)?);
                assert!(set.length() == 0);

                match set.remove(mem, member) {
                    Ok(_) => panic!("member should already have been removed"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::KeyError),
                }

                assert!(!set.discard(mem, member)?);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn set_int_members() {
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
                let set = Set::with_capacity(mem, 16)?;

                for n in 0..100 {
                    set.add(mem, mem.number(n))?;
                }

                assert!(set.length() == 100);

                for n in 0..100 {
                    assert!(set.contains(mem, mem.number(n))?);
                }
                assert!(!set.contains(mem, mem.number(100))?);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
