/// An immutable fixed-length sequence of values.
use std::fmt;
use std::ptr::read;

use itertools::join;

use crate::error::{ErrorKind, RuntimeError};
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::rawarray::{ArraySize, RawArray};
use crate::safeptr::{MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};

/// Length and contents are fixed at construction, so no borrow flag is
/// needed: the backing store is never reallocated or resized.
pub struct Tuple {
    length: ArraySize,
    data: RawArray<TaggedCellPtr>,
}

impl Tuple {
    /// Allocate a Tuple on the heap with the given contents
    pub fn alloc_from_slice<'guard>(
        mem: &'guard MutatorView,
        items: &[TaggedScopedPtr<'guard>],
    ) -> Result<ScopedPtr<'guard, Tuple>, RuntimeError> {
        let length = items.len() as ArraySize;
        let data: RawArray<TaggedCellPtr> = RawArray::with_capacity(mem, length)?;

        if let Some(ptr) = data.as_ptr() {
            for (index, item) in items.iter().enumerate() {
                unsafe {
                    std::ptr::write(
                        ptr.offset(index as isize) as *mut TaggedCellPtr,
                        TaggedCellPtr::new_with(*item),
                    );
                }
            }
        }

        mem.alloc(Tuple { length, data })
    }

    /// Allocate the zero-length Tuple
    pub fn alloc_empty<'guard>(
        mem: &'guard MutatorView,
    ) -> Result<ScopedPtr<'guard, Tuple>, RuntimeError> {
        mem.alloc(Tuple {
            length: 0,
            data: RawArray::new(),
        })
    }

    pub fn length(&self) -> ArraySize {
        self.length
    }

    /// Return the value at the given index. Bounds-checked.
    pub fn get<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        index: ArraySize,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        if index >= self.length {
            return Err(RuntimeError::new(ErrorKind::BoundsError));
        }

        let ptr = self
            .data
            .as_ptr()
            .ok_or(RuntimeError::new(ErrorKind::BoundsError))?;

        let cell = unsafe { read(ptr.offset(index as isize)) };
        Ok(cell.get(guard))
    }

    /// Call the given function once per contained value
    pub fn each_item<'guard, F>(&self, _guard: &'guard dyn MutatorScope, mut f: F)
    where
        F: FnMut(&TaggedCellPtr),
    {
        if let Some(ptr) = self.data.as_ptr() {
            for index in 0..self.length {
                let cell = unsafe { &*ptr.offset(index as isize) };
                f(cell);
            }
        }
    }
}

impl Print for Tuple {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        let mut items = Vec::new();
        self.each_item(guard, |cell| {
            items.push(format!("{}", cell.get(guard).value()));
        });

        if self.length == 1 {
            write!(f, "({},)", items[0])
        } else {
            write!(f, "({})", join(items, ", "))
        }
    }
}
