//! Bump-allocated heap memory for a hosted runtime.
//!
//! This crate owns raw memory acquisition (size-aligned blocks from the
//! std alloc API), a chain of bump-allocated blocks, and the traits that
//! describe allocatable objects and their headers. The collector that
//! eventually reclaims this memory is an external collaborator; nothing
//! here frees individual objects.

mod allocator;
mod block;
mod bumpblock;
mod constants;
mod heap;
mod rawptr;

pub use crate::allocator::{
    alloc_size_of, AllocError, AllocHeader, AllocObject, AllocRaw, AllocTypeId, ArraySize, Mark,
    SizeClass,
};
pub use crate::block::{Block, BlockError};
pub use crate::heap::BumpHeap;
pub use crate::rawptr::RawPtr;
