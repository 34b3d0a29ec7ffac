/// The untyped backing-store layer under every variable-length container.
use std::mem::size_of;
use std::ptr::NonNull;

pub use bumpalloc::ArraySize;

use crate::error::{ErrorKind, RuntimeError};
use crate::memory::MutatorView;

/// Arrays start out at this capacity by default
pub const DEFAULT_ARRAY_SIZE: ArraySize = 8;

/// Arrays grow at this rate by default
pub fn default_array_growth(capacity: ArraySize) -> Result<ArraySize, RuntimeError> {
    if capacity == 0 {
        Ok(DEFAULT_ARRAY_SIZE)
    } else {
        capacity
            .checked_add(capacity / 2)
            .ok_or(RuntimeError::new(ErrorKind::BadAllocationRequest))
    }
}

/// Fundamental array type on which the variable-length heap types are built.
/// Analagous to RawVec. Copy is implemented so the struct can live in a Cell
/// inside the containers built on top, which follow interior-mutability-only
/// rules.
pub struct RawArray<T: Sized> {
    /// Count of T-sized objects that can fit in the array
    capacity: ArraySize,
    ptr: Option<NonNull<T>>,
}

impl<T: Sized> Clone for RawArray<T> {
    fn clone(&self) -> Self {
        RawArray {
            capacity: self.capacity,
            ptr: self.ptr,
        }
    }
}

impl<T: Sized> Copy for RawArray<T> {}

impl<T: Sized> RawArray<T> {
    /// Return a RawArray of capacity 0 with no array bytes allocated
    pub fn new() -> RawArray<T> {
        RawArray {
            capacity: 0,
            ptr: None,
        }
    }

    /// Return a RawArray with a backing store for `capacity` objects
    pub fn with_capacity<'scope>(
        mem: &'scope MutatorView,
        capacity: ArraySize,
    ) -> Result<RawArray<T>, RuntimeError> {
        let capacity_bytes = bytes_for::<T>(capacity)?;

        Ok(RawArray {
            capacity,
            ptr: NonNull::new(mem.alloc_array(capacity_bytes)?.as_ptr() as *mut T),
        })
    }

    /// Resize the backing store to the new capacity, copying over the
    /// current contents. The old store is left for the collector.
    pub fn resize<'scope>(
        &mut self,
        mem: &'scope MutatorView,
        new_capacity: ArraySize,
    ) -> Result<(), RuntimeError> {
        // shrinking to zero simply detaches the backing store
        if new_capacity == 0 {
            self.capacity = 0;
            self.ptr = None;
            return Ok(());
        }

        match self.ptr {
            Some(old_ptr) => {
                let old_capacity_bytes = bytes_for::<T>(self.capacity)?;
                let new_capacity_bytes = bytes_for::<T>(new_capacity)?;

                let new_ptr = mem.alloc_array(new_capacity_bytes)?.as_ptr() as *mut T;

                let copy_bytes = old_capacity_bytes.min(new_capacity_bytes) as usize;
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        old_ptr.as_ptr() as *const u8,
                        new_ptr as *mut u8,
                        copy_bytes,
                    );
                }

                self.ptr = NonNull::new(new_ptr);
                self.capacity = new_capacity;

                Ok(())
            }

            None => {
                *self = Self::with_capacity(mem, new_capacity)?;
                Ok(())
            }
        }
    }

    /// Return the capacity of the array in the count of objects it can hold
    pub fn capacity(&self) -> ArraySize {
        self.capacity
    }

    /// Return a pointer to the backing store, if any is allocated
    pub fn as_ptr(&self) -> Option<*const T> {
        self.ptr.map(|ptr| ptr.as_ptr() as *const T)
    }
}

/// Object count to byte count, erroring if the result overflows ArraySize
fn bytes_for<T>(capacity: ArraySize) -> Result<ArraySize, RuntimeError> {
    capacity
        .checked_mul(size_of::<T>() as ArraySize)
        .ok_or(RuntimeError::new(ErrorKind::BadAllocationRequest))
}
