/// Defines an `ObjectHeader` type to immediately preceed each heap allocated
/// object, which also contains a type tag but with space for many more types.
use bumpalloc::{
    AllocHeader, AllocObject, AllocRaw, AllocTypeId, ArraySize, Mark, RawPtr, SizeClass,
};

use crate::array::ArrayU8;
use crate::class::{Class, Instance};
use crate::dict::Dict;
use crate::function::{Closure, Function};
use crate::generator::Generator;
use crate::iterator::{ListIter, RangeIter, TupleIter};
use crate::list::List;
use crate::memory::HeapStorage;
use crate::number::BigNum;
use crate::pointerops::{AsNonNull, Tagged};
use crate::range::Range;
use crate::set::Set;
use crate::sharedcell::SharedCell;
use crate::symbol::Symbol;
use crate::taggedptr::FatPtr;
use crate::text::Text;
use crate::tuple::Tuple;
use crate::weakref::WeakRef;

/// Recognized heap-allocated types.
/// This should represent every type native to the runtime with the exception
/// of tagged pointer inline value types.
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TypeList {
    ArrayBackingBytes,
    ArrayU8,
    BigNum,
    Class,
    Closure,
    Dict,
    Function,
    Generator,
    Instance,
    List,
    ListIter,
    Range,
    RangeIter,
    Set,
    SharedCell,
    Symbol,
    Text,
    Tuple,
    TupleIter,
    WeakRef,
}

// Mark this as an allocator type-identifier type
impl AllocTypeId for TypeList {}

/// A heap-allocated object header
pub struct ObjectHeader {
    mark: Mark,
    size_class: SizeClass,
    type_id: TypeList,
    size_bytes: u32,
}

impl ObjectHeader {
    /// Convert the ObjectHeader address to a FatPtr pointing at the object itself.
    // NOTE Any type that is a runtime dynamic type must be added to the below list
    // NOTE Be careful to match the correct TypeList discriminant with it's corresponding FatPtr discriminant
    // NOTE Be careful to untag the pointer before putting it into a `FatPtr`
    pub unsafe fn get_object_fatptr(&self) -> FatPtr {
        let ptr_to_self = self.non_null_ptr();
        let object_addr = HeapStorage::get_object(ptr_to_self);

        match self.type_id {
            TypeList::ArrayU8 => FatPtr::ArrayU8(RawPtr::untag(object_addr.cast::<ArrayU8>())),
            TypeList::BigNum => FatPtr::BigNum(RawPtr::untag(object_addr.cast::<BigNum>())),
            TypeList::Class => FatPtr::Class(RawPtr::untag(object_addr.cast::<Class>())),
            TypeList::Closure => FatPtr::Closure(RawPtr::untag(object_addr.cast::<Closure>())),
            TypeList::Dict => FatPtr::Dict(RawPtr::untag(object_addr.cast::<Dict>())),
            TypeList::Function => FatPtr::Function(RawPtr::untag(object_addr.cast::<Function>())),
            TypeList::Generator => {
                FatPtr::Generator(RawPtr::untag(object_addr.cast::<Generator>()))
            }
            TypeList::Instance => FatPtr::Instance(RawPtr::untag(object_addr.cast::<Instance>())),
            TypeList::List => FatPtr::List(RawPtr::untag(object_addr.cast::<List>())),
            TypeList::ListIter => FatPtr::ListIter(RawPtr::untag(object_addr.cast::<ListIter>())),
            TypeList::Range => FatPtr::Range(RawPtr::untag(object_addr.cast::<Range>())),
            TypeList::RangeIter => {
                FatPtr::RangeIter(RawPtr::untag(object_addr.cast::<RangeIter>()))
            }
            TypeList::Set => FatPtr::Set(RawPtr::untag(object_addr.cast::<Set>())),
            TypeList::SharedCell => {
                FatPtr::SharedCell(RawPtr::untag(object_addr.cast::<SharedCell>()))
            }
            TypeList::Symbol => FatPtr::Symbol(RawPtr::untag(object_addr.cast::<Symbol>())),
            TypeList::Text => FatPtr::Text(RawPtr::untag(object_addr.cast::<Text>())),
            TypeList::Tuple => FatPtr::Tuple(RawPtr::untag(object_addr.cast::<Tuple>())),
            TypeList::TupleIter => {
                FatPtr::TupleIter(RawPtr::untag(object_addr.cast::<TupleIter>()))
            }
            TypeList::WeakRef => FatPtr::WeakRef(RawPtr::untag(object_addr.cast::<WeakRef>())),

            // Backing arrays are never directly exposed as runtime values
            _ => panic!("Invalid ObjectHeader type tag {:?}!", self.type_id),
        }
    }
}

impl AsNonNull for ObjectHeader {}

impl AllocHeader for ObjectHeader {
    type TypeId = TypeList;

    fn new<O: AllocObject<Self::TypeId>>(
        size: u32,
        size_class: SizeClass,
        mark: Mark,
    ) -> ObjectHeader {
        ObjectHeader {
            mark,
            size_class,
            type_id: O::TYPE_ID,
            size_bytes: size,
        }
    }

    fn new_array(size: ArraySize, size_class: SizeClass, mark: Mark) -> ObjectHeader {
        ObjectHeader {
            mark,
            size_class,
            type_id: TypeList::ArrayBackingBytes,
            size_bytes: size as u32,
        }
    }

    fn mark(&mut self) {
        self.mark = Mark::Marked;
    }

    fn is_marked(&self) -> bool {
        self.mark == Mark::Marked
    }

    fn size_class(&self) -> SizeClass {
        self.size_class
    }

    fn size(&self) -> u32 {
        self.size_bytes
    }

    fn type_id(&self) -> TypeList {
        self.type_id
    }
}

/// Apply the type ID to each native type
macro_rules! declare_allocobject {
    ($T:ty, $I:tt) => {
        impl AllocObject<TypeList> for $T {
            const TYPE_ID: TypeList = TypeList::$I;
        }
    };
}

declare_allocobject!(ArrayU8, ArrayU8);
declare_allocobject!(BigNum, BigNum);
declare_allocobject!(Class, Class);
declare_allocobject!(Closure, Closure);
declare_allocobject!(Dict, Dict);
declare_allocobject!(Function, Function);
declare_allocobject!(Generator, Generator);
declare_allocobject!(Instance, Instance);
declare_allocobject!(List, List);
declare_allocobject!(ListIter, ListIter);
declare_allocobject!(Range, Range);
declare_allocobject!(RangeIter, RangeIter);
declare_allocobject!(Set, Set);
declare_allocobject!(SharedCell, SharedCell);
declare_allocobject!(Symbol, Symbol);
declare_allocobject!(Text, Text);
declare_allocobject!(Tuple, Tuple);
declare_allocobject!(TupleIter, TupleIter);
declare_allocobject!(WeakRef, WeakRef);
