/// Acquisition of blocks of memory that are:
///  - powers of two in size
///  - aligned to their size
///
/// Built on the stabilized std alloc API. Alignment to the block size makes
/// masking a pointer down to its containing block a single bitwise op.
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

pub type BlockPtr = NonNull<u8>;
pub type BlockSize = usize;

/// Set of possible block allocation failures
#[derive(Debug, PartialEq)]
pub enum BlockError {
    /// The requested block size, and therefore alignment, wasn't a power
    /// of two
    BadRequest,
    /// Insufficient memory, couldn't allocate a block
    OOM,
}

/// A block-size-aligned block of memory
pub struct Block {
    ptr: BlockPtr,
    size: BlockSize,
}

impl Block {
    /// Instantiate a new block of the given size. Size must be a power of two.
    pub fn new(size: BlockSize) -> Result<Block, BlockError> {
        if !size.is_power_of_two() {
            return Err(BlockError::BadRequest);
        }

        let ptr = unsafe {
            let layout = Layout::from_size_align_unchecked(size, size);
            alloc(layout)
        };

        match NonNull::new(ptr) {
            Some(ptr) => Ok(Block { ptr, size }),
            None => Err(BlockError::OOM),
        }
    }

    /// Return a bare pointer to the base of the block
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Return the size in bytes of the block
    pub fn size(&self) -> BlockSize {
        self.size
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.size, self.size);
            dealloc(self.ptr.as_ptr(), layout);
        }
    }
}
