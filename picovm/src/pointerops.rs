/// Pointer tagging, untagging and sentinel operations.
///
/// The low bits of a word discriminate its payload:
///  - bit 0 set: the upper bits are an inline signed integer
///  - low bits `10`: pointer to an interned Symbol
///  - low bits `00`: pointer to a heap object, or one of a small set of
///    word-encoded singletons below any valid heap address
use std::ptr::NonNull;

use bumpalloc::RawPtr;

use crate::safeptr::MutatorScope;

/// Inline integers claim bit 0, leaving one discriminant bit for pointers
pub const TAG_MASK: usize = 0x3;
pub const TAG_SMALLINT: usize = 0x1;
pub const TAG_SYMBOL: usize = 0x2;
pub const TAG_OBJECT: usize = 0x0;
pub const PTR_MASK: usize = !0x3;

/// Singleton words. Allocators never return addresses this low, so these
/// words are unambiguous under the `00` pointer tag.
pub const SENTINEL_NONE: usize = 0x0;
pub const SENTINEL_FALSE: usize = 0x4;
pub const SENTINEL_TRUE: usize = 0x8;

/// The tag bits of a word. For small ints only bit 0 is significant.
pub fn get_tag(word: usize) -> usize {
    if word & TAG_SMALLINT != 0 {
        TAG_SMALLINT
    } else {
        word & TAG_MASK
    }
}

/// An allocator-agnostic tagging operation
pub trait Tagged<T> {
    fn tag(self, tag: usize) -> NonNull<T>;
    fn untag(from: NonNull<T>) -> RawPtr<T>;
}

impl<T> Tagged<T> for RawPtr<T> {
    fn tag(self, tag: usize) -> NonNull<T> {
        unsafe { NonNull::new_unchecked((self.as_word() | tag) as *mut T) }
    }

    fn untag(from: NonNull<T>) -> RawPtr<T> {
        RawPtr::new((from.as_ptr() as usize & PTR_MASK) as *const T)
    }
}

/// Given a pointer and a lifetime-limiting guard object, dereference the
/// pointer for the lifetime of the guard
pub trait ScopedRef<T> {
    fn scoped_ref<'scope>(&self, guard: &'scope dyn MutatorScope) -> &'scope T;
}

impl<T> ScopedRef<T> for RawPtr<T> {
    fn scoped_ref<'scope>(&self, _guard: &'scope dyn MutatorScope) -> &'scope T {
        unsafe { &*self.as_ptr() }
    }
}

/// Get a NonNull<Self> pointer from a reference
pub trait AsNonNull {
    fn non_null_ptr(&self) -> NonNull<Self>
    where
        Self: Sized,
    {
        unsafe { NonNull::new_unchecked(self as *const Self as *mut Self) }
    }
}
