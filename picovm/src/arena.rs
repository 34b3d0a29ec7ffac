/// A memory arena implemented as an ever growing pool of blocks, for interned
/// values that live as long as the runtime.
use std::ptr::NonNull;

use bumpalloc::{
    AllocError, AllocHeader, AllocObject, AllocRaw, ArraySize, BumpHeap, Mark, RawPtr, SizeClass,
};

use crate::headers::TypeList;

/// Allocation header for an Arena-allocated value
pub struct ArenaHeader {}

/// Since we're not using mark/sweep functionality in an Arena, the impl is
/// just a set of no-ops.
impl AllocHeader for ArenaHeader {
    type TypeId = TypeList;

    fn new<O: AllocObject<Self::TypeId>>(
        _size: u32,
        _size_class: SizeClass,
        _mark: Mark,
    ) -> ArenaHeader {
        ArenaHeader {}
    }

    fn new_array(_size: ArraySize, _size_class: SizeClass, _mark: Mark) -> ArenaHeader {
        ArenaHeader {}
    }

    fn mark(&mut self) {}

    fn is_marked(&self) -> bool {
        true
    }

    fn size_class(&self) -> SizeClass {
        SizeClass::Small
    }

    fn size(&self) -> u32 {
        1
    }

    fn type_id(&self) -> TypeList {
        TypeList::Symbol
    }
}

/// A non-garbage-collected pool of memory blocks for interned values.
/// These values are not dropped on Arena deallocation.
/// Values must be "atomic", that is, not composed of other object
/// pointers that need to be traced.
pub struct Arena {
    heap: BumpHeap<ArenaHeader>,
}

impl Arena {
    pub fn new() -> Arena {
        Arena {
            heap: BumpHeap::new(),
        }
    }
}

impl AllocRaw for Arena {
    type Header = ArenaHeader;

    fn alloc<T>(&self, object: T) -> Result<RawPtr<T>, AllocError>
    where
        T: AllocObject<TypeList>,
    {
        self.heap.alloc(object)
    }

    fn alloc_array(&self, size_bytes: ArraySize) -> Result<RawPtr<u8>, AllocError> {
        self.heap.alloc_array(size_bytes)
    }

    fn get_header(object: NonNull<()>) -> NonNull<Self::Header> {
        BumpHeap::<ArenaHeader>::get_header(object)
    }

    fn get_object(header: NonNull<Self::Header>) -> NonNull<()> {
        BumpHeap::<ArenaHeader>::get_object(header)
    }
}
