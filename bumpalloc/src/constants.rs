use std::mem::size_of;

/// Block size for all bump blocks. Must be a power of two.
pub const BLOCK_SIZE: usize = 32 * 1024;

/// Line size used only to classify object sizes; this heap does not do
/// line-level accounting itself.
pub const LINE_SIZE: usize = 128;

/// All allocations are rounded up to a double-word boundary.
pub const ALLOC_ALIGN_BYTES: usize = size_of::<usize>() * 2;
