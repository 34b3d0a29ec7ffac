use crate::allocator::AllocError;
use crate::block::Block;
use crate::constants;

/// A block of heap with its bump cursor. Allocation proceeds upward from
/// the base of the block; sizes handed to `inner_alloc` must already be
/// rounded to the allocation alignment.
pub struct BumpBlock {
    cursor: usize,
    block: Block,
}

impl BumpBlock {
    /// Create a new empty block of heap space
    pub fn new() -> Result<BumpBlock, AllocError> {
        Ok(BumpBlock {
            cursor: 0,
            block: Block::new(constants::BLOCK_SIZE)?,
        })
    }

    /// Bump-allocate the given number of bytes, returning a pointer to the
    /// space, or None if this block does not have enough room left.
    pub fn inner_alloc(&mut self, alloc_size: usize) -> Option<*const u8> {
        let next_bump = self.cursor.checked_add(alloc_size)?;

        if next_bump > constants::BLOCK_SIZE {
            None
        } else {
            let offset = self.cursor;
            self.cursor = next_bump;
            unsafe { Some(self.block.as_ptr().add(offset)) }
        }
    }

    /// Number of bytes still available in this block
    pub fn remaining(&self) -> usize {
        constants::BLOCK_SIZE - self.cursor
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TEST_UNIT_SIZE: usize = constants::ALLOC_ALIGN_BYTES;

    #[test]
    fn fill_whole_block() {
        let mut b = BumpBlock::new().unwrap();

        let mut allocated = Vec::new();
        while let Some(ptr) = b.inner_alloc(TEST_UNIT_SIZE) {
            let word_ptr = ptr as *mut usize;
            assert!(!allocated.contains(&word_ptr));

            unsafe { *word_ptr = allocated.len() };
            allocated.push(word_ptr);
        }

        assert!(allocated.len() == constants::BLOCK_SIZE / TEST_UNIT_SIZE);
        assert!(b.remaining() == 0);

        // no allocation overwrote another
        for (index, word_ptr) in allocated.iter().enumerate() {
            unsafe { assert!(**word_ptr == index) };
        }
    }

    #[test]
    fn oversize_request() {
        let mut b = BumpBlock::new().unwrap();
        assert!(b.inner_alloc(constants::BLOCK_SIZE + 1).is_none());
    }
}
