/// A heap-allocated single-slot box. Closures that capture a mutable local
/// variable share one of these so that writes through any capturing closure
/// are visible to all of them.
use std::fmt;

use crate::error::RuntimeError;
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::safeptr::{MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};

pub struct SharedCell {
    value: TaggedCellPtr,
}

impl SharedCell {
    /// Allocate a SharedCell on the heap, boxing the given value
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        value: TaggedScopedPtr<'guard>,
    ) -> Result<ScopedPtr<'guard, SharedCell>, RuntimeError> {
        mem.alloc(SharedCell {
            value: TaggedCellPtr::new_with(value),
        })
    }

    pub fn get<'guard>(&self, guard: &'guard dyn MutatorScope) -> TaggedScopedPtr<'guard> {
        self.value.get(guard)
    }

    pub fn set(&self, value: TaggedScopedPtr) {
        self.value.set(value)
    }

    /// The boxed slot itself, for the tracer
    pub fn cell(&self) -> &TaggedCellPtr {
        &self.value
    }
}

impl Print for SharedCell {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<cell: {}>", self.value.get(guard).value())
    }
}
