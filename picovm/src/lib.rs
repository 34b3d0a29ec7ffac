//! The object model of a small embeddable dynamic language runtime: tagged
//! value words, heap object types and their headers, container types, weak
//! references with finalization, and suspendable generator state. Compiling
//! and executing code is out of scope; callers plug an interpreter in
//! through the `exec::Executor` trait.

mod arena;
mod array;
mod class;
mod containers;
mod dict;
mod error;
mod exec;
mod function;
mod generator;
mod hashable;
mod headers;
mod iterator;
mod list;
mod memory;
mod number;
mod pointerops;
mod printer;
mod range;
mod rawarray;
mod safeptr;
mod set;
mod sharedcell;
mod symbol;
mod symbolmap;
mod taggedptr;
mod text;
mod trace;
mod tuple;
mod weakref;

pub use crate::array::{Array, ArrayU8};
pub use crate::class::{Class, Instance};
pub use crate::containers::{
    Container, ContainerFromSlice, HashIndexedAnyContainer, IndexedAnyContainer, IndexedContainer,
    SliceableContainer, StackAnyContainer, StackContainer,
};
pub use crate::dict::Dict;
pub use crate::error::{ErrorKind, RuntimeError};
pub use crate::exec::{Entry, Executor, Outcome};
pub use crate::function::{Closure, Function};
pub use crate::generator::{Generator, GeneratorState, Resume};
pub use crate::headers::{ObjectHeader, TypeList};
pub use crate::iterator::{ListIter, RangeIter, TupleIter};
pub use crate::list::List;
pub use crate::memory::{Memory, Mutator, MutatorView};
pub use crate::number::{
    fits_small_int, from_bigint, from_i128, int_add, int_mul, new_int, BigNum, SMALL_INT_MAX,
    SMALL_INT_MIN,
};
pub use crate::printer::{debug, print, Print};
pub use crate::range::Range;
pub use crate::rawarray::ArraySize;
pub use crate::safeptr::{
    CellPtr, MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr,
};
pub use crate::set::Set;
pub use crate::sharedcell::SharedCell;
pub use crate::symbol::Symbol;
pub use crate::taggedptr::Value;
pub use crate::text::Text;
pub use crate::trace::trace;
pub use crate::tuple::Tuple;
pub use crate::weakref::{finalize_unreachable, run_finalizer, ClearStatus, WeakRef};
