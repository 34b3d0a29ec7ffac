use std::mem::size_of;
use std::ptr::NonNull;

use crate::block::BlockError;
use crate::constants;
use crate::rawptr::RawPtr;

/// Array size and index type for heap backing arrays
pub type ArraySize = u32;

/// An allocation error type
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AllocError {
    /// Some attribute of the allocation, most likely the size requested,
    /// could not be fulfilled
    BadRequest,
    /// Out of memory - allocating the space failed
    OOM,
}

impl From<BlockError> for AllocError {
    fn from(error: BlockError) -> AllocError {
        match error {
            BlockError::BadRequest => AllocError::BadRequest,
            BlockError::OOM => AllocError::OOM,
        }
    }
}

/// Object size class.
/// - Small objects fit inside a line
/// - Medium objects span more than one line
/// - Large objects span more than one block
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub fn get_for_size(object_size: usize) -> Result<SizeClass, AllocError> {
        if object_size == 0 {
            Err(AllocError::BadRequest)
        } else if object_size <= constants::LINE_SIZE {
            Ok(SizeClass::Small)
        } else if object_size <= constants::BLOCK_SIZE {
            Ok(SizeClass::Medium)
        } else {
            Ok(SizeClass::Large)
        }
    }
}

/// The object mark bit, maintained by the external collector.
/// Every object is `Allocated` on creation.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Mark {
    Allocated,
    Unmarked,
    Marked,
}

/// A managed-type type-identifier type should implement this
pub trait AllocTypeId: Copy + Clone {}

/// All managed object types must implement this trait in order to be
/// allocatable
pub trait AllocObject<T: AllocTypeId> {
    const TYPE_ID: T;
}

/// An object header type must provide an implementation of this trait,
/// exposing the type id and mark state to the collector.
pub trait AllocHeader: Sized {
    /// Associated type that identifies the allocated object type
    type TypeId: AllocTypeId;

    /// Create a new header for object type O
    fn new<O: AllocObject<Self::TypeId>>(size: u32, size_class: SizeClass, mark: Mark) -> Self;

    /// Create a new header for an untyped backing array of bytes
    fn new_array(size: ArraySize, size_class: SizeClass, mark: Mark) -> Self;

    /// Set the Mark value to "marked"
    fn mark(&mut self);

    /// Get the current Mark value
    fn is_marked(&self) -> bool;

    /// Get the size class of the object
    fn size_class(&self) -> SizeClass;

    /// Get the size of the object in bytes
    fn size(&self) -> u32;

    /// Get the type of the object
    fn type_id(&self) -> Self::TypeId;
}

/// A type that describes allocation of an object into a heap space, returning
/// a bare pointer type on success.
///
/// Headers are laid out immediately before their object, so a pointer to one
/// converts to a pointer to the other with constant offset arithmetic.
pub trait AllocRaw {
    /// An implementation of an object header type
    type Header: AllocHeader;

    /// Allocate a single object of type T
    fn alloc<T>(&self, object: T) -> Result<RawPtr<T>, AllocError>
    where
        T: AllocObject<<Self::Header as AllocHeader>::TypeId>;

    /// Allocate an untyped, zero-initialized array of bytes for use as
    /// container backing storage
    fn alloc_array(&self, size_bytes: ArraySize) -> Result<RawPtr<u8>, AllocError>;

    /// Given a bare pointer to an object, return the pointer to its header
    fn get_header(object: NonNull<()>) -> NonNull<Self::Header>;

    /// Given a pointer to an object's header, return the object address
    fn get_object(header: NonNull<Self::Header>) -> NonNull<()>;
}

/// Return the allocated size of an object: it's size rounded up to a
/// double-word boundary
pub fn alloc_size_of(object_size: usize) -> usize {
    let align = constants::ALLOC_ALIGN_BYTES;
    (object_size + (align - 1)) & !(align - 1)
}

/// The fixed offset from an object's base address back to its header:
/// the header size, rounded up so the object stays alignment-safe.
pub fn header_offset<H>() -> usize {
    alloc_size_of(size_of::<H>())
}
