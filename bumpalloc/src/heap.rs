use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::mem::{replace, size_of};
use std::ptr::{write, write_bytes, NonNull};
use std::sync::atomic::{fence, Ordering};

use crate::allocator::{
    alloc_size_of, header_offset, AllocError, AllocHeader, AllocObject, AllocRaw, ArraySize, Mark,
    SizeClass,
};
use crate::bumpblock::BumpBlock;
use crate::constants;
use crate::rawptr::RawPtr;

/// The current block being allocated into plus the list of filled blocks
struct BlockList {
    head: Option<BumpBlock>,
    rest: Vec<BumpBlock>,
}

impl BlockList {
    fn new() -> BlockList {
        BlockList {
            head: None,
            rest: Vec::new(),
        }
    }

    /// Find a hole of `alloc_size` bytes, opening a fresh block if the
    /// current head is too full.
    fn find_space(&mut self, alloc_size: usize) -> Result<*const u8, AllocError> {
        let head = match self.head {
            Some(ref mut head) => head,
            None => {
                let mut head = BumpBlock::new()?;
                let space = head
                    .inner_alloc(alloc_size)
                    .ok_or(AllocError::BadRequest)?;
                self.head = Some(head);
                return Ok(space);
            }
        };

        match head.inner_alloc(alloc_size) {
            Some(space) => Ok(space),
            None => {
                let previous = replace(head, BumpBlock::new()?);
                self.rest.push(previous);

                head.inner_alloc(alloc_size).ok_or(AllocError::BadRequest)
            }
        }
    }
}

/// A type that implements `AllocRaw` as a chain of bump-allocated blocks.
/// Does not allocate internally on initialization.
pub struct BumpHeap<H> {
    blocks: UnsafeCell<BlockList>,

    _header_type: PhantomData<*const H>,
}

impl<H> BumpHeap<H> {
    pub fn new() -> BumpHeap<H> {
        BumpHeap {
            blocks: UnsafeCell::new(BlockList::new()),
            _header_type: PhantomData,
        }
    }
}

impl<H: AllocHeader> AllocRaw for BumpHeap<H> {
    type Header = H;

    fn alloc<T>(&self, object: T) -> Result<RawPtr<T>, AllocError>
    where
        T: AllocObject<<Self::Header as AllocHeader>::TypeId>,
    {
        let blocks = unsafe { &mut *self.blocks.get() };

        let object_size = size_of::<T>();
        let alloc_size = header_offset::<Self::Header>() + alloc_size_of(object_size);

        // objects larger than a block are not supported by this heap
        if alloc_size > constants::BLOCK_SIZE {
            return Err(AllocError::BadRequest);
        }
        let size_class = SizeClass::get_for_size(alloc_size)?;

        let space = blocks.find_space(alloc_size)?;

        let header = Self::Header::new::<T>(object_size as u32, size_class, Mark::Allocated);

        let object_space = unsafe {
            write(space as *mut Self::Header, header);

            let object_space = space.add(header_offset::<Self::Header>());
            write(object_space as *mut T, object);
            object_space
        };

        // Header and object contents must be visible before the pointer
        // escapes this call: allocation can happen inside interrupt-driven
        // callbacks and no other execution context may observe a partially
        // constructed object.
        fence(Ordering::Release);

        Ok(RawPtr::new(object_space as *const T))
    }

    fn alloc_array(&self, size_bytes: ArraySize) -> Result<RawPtr<u8>, AllocError> {
        let blocks = unsafe { &mut *self.blocks.get() };

        let alloc_size = header_offset::<Self::Header>() + alloc_size_of(size_bytes as usize);

        if alloc_size > constants::BLOCK_SIZE {
            return Err(AllocError::BadRequest);
        }
        let size_class = SizeClass::get_for_size(alloc_size)?;

        let space = blocks.find_space(alloc_size)?;

        let header = Self::Header::new_array(size_bytes, size_class, Mark::Allocated);

        let array_space = unsafe {
            write(space as *mut Self::Header, header);

            let array_space = space.add(header_offset::<Self::Header>());
            // backing arrays are handed out zero-initialized
            write_bytes(array_space as *mut u8, 0, size_bytes as usize);
            array_space
        };

        fence(Ordering::Release);

        Ok(RawPtr::new(array_space as *const u8))
    }

    fn get_header(object: NonNull<()>) -> NonNull<Self::Header> {
        unsafe {
            let header = object.cast::<u8>().as_ptr().sub(header_offset::<Self::Header>());
            NonNull::new_unchecked(header as *mut Self::Header)
        }
    }

    fn get_object(header: NonNull<Self::Header>) -> NonNull<()> {
        unsafe {
            let object = header.cast::<u8>().as_ptr().add(header_offset::<Self::Header>());
            NonNull::new_unchecked(object as *mut ())
        }
    }
}

impl<H> Default for BumpHeap<H> {
    fn default() -> BumpHeap<H> {
        BumpHeap::new()
    }
}
