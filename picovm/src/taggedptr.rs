/// Internal pointer abstractions for runtime tag-typed pointers.
/// From high level to low, safest to unsafest:
///  * Value > FatPtr > TaggedPtr
///
/// Defines a `Value` type which is a safe-Rust enum of references to object
/// types.
///
/// Defines a `FatPtr` type which is a Rust tagged-union enum version of all
/// types which can be expanded from `TaggedPtr` and `ObjectHeader` combined.
///
/// Defines a `TaggedPtr` type where the low bits of a word discriminate
/// inline integers, interned symbols, singletons and heap objects; the object
/// header provides all remaining object kind ids.
use std::fmt;
use std::ptr::NonNull;

use bumpalloc::{AllocHeader, AllocRaw, RawPtr};

use crate::array::ArrayU8;
use crate::class::{Class, Instance};
use crate::dict::Dict;
use crate::function::{Closure, Function};
use crate::generator::Generator;
use crate::headers::TypeList;
use crate::iterator::{ListIter, RangeIter, TupleIter};
use crate::list::List;
use crate::memory::HeapStorage;
use crate::number::BigNum;
use crate::pointerops::{
    get_tag, ScopedRef, Tagged, SENTINEL_FALSE, SENTINEL_NONE, SENTINEL_TRUE, TAG_OBJECT,
    TAG_SMALLINT, TAG_SYMBOL,
};
use crate::printer::Print;
use crate::range::Range;
use crate::safeptr::{MutatorScope, ScopedPtr};
use crate::set::Set;
use crate::sharedcell::SharedCell;
use crate::symbol::Symbol;
use crate::text::Text;
use crate::tuple::Tuple;
use crate::weakref::WeakRef;

/// A safe interface to heap-managed objects. The `'guard` lifetime must be a
/// safe lifetime for the collector not to move or free the referenced object.
/// This should represent every type native to the runtime.
#[derive(Copy, Clone)]
pub enum Value<'guard> {
    None,
    Bool(bool),
    Int(isize),
    Symbol(ScopedPtr<'guard, Symbol>),
    BigNum(ScopedPtr<'guard, BigNum>),
    Text(ScopedPtr<'guard, Text>),
    ArrayU8(ScopedPtr<'guard, ArrayU8>),
    Tuple(ScopedPtr<'guard, Tuple>),
    List(ScopedPtr<'guard, List>),
    Set(ScopedPtr<'guard, Set>),
    Dict(ScopedPtr<'guard, Dict>),
    Range(ScopedPtr<'guard, Range>),
    SharedCell(ScopedPtr<'guard, SharedCell>),
    Function(ScopedPtr<'guard, Function>),
    Closure(ScopedPtr<'guard, Closure>),
    Generator(ScopedPtr<'guard, Generator>),
    Class(ScopedPtr<'guard, Class>),
    Instance(ScopedPtr<'guard, Instance>),
    TupleIter(ScopedPtr<'guard, TupleIter>),
    ListIter(ScopedPtr<'guard, ListIter>),
    RangeIter(ScopedPtr<'guard, RangeIter>),
    WeakRef(ScopedPtr<'guard, WeakRef>),
}

impl<'guard> Value<'guard> {
    /// A human-readable kind name, for type errors and printing
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Symbol(_) => "symbol",
            Value::BigNum(_) => "int",
            Value::Text(_) => "str",
            Value::ArrayU8(_) => "bytearray",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Range(_) => "range",
            Value::SharedCell(_) => "cell",
            Value::Function(_) => "function",
            Value::Closure(_) => "closure",
            Value::Generator(_) => "generator",
            Value::Class(_) => "type",
            Value::Instance(_) => "object",
            Value::TupleIter(_) => "tuple_iterator",
            Value::ListIter(_) => "list_iterator",
            Value::RangeIter(_) => "range_iterator",
            Value::WeakRef(_) => "weakref",
        }
    }
}

/// `Value` can have a safe `Display` implementation
impl<'guard> fmt::Display for Value<'guard> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", *n),
            Value::Symbol(s) => s.print(self, f),
            Value::BigNum(n) => n.print(self, f),
            Value::Text(t) => t.print(self, f),
            Value::ArrayU8(a) => a.print(self, f),
            Value::Tuple(t) => t.print(self, f),
            Value::List(a) => a.print(self, f),
            Value::Set(s) => s.print(self, f),
            Value::Dict(d) => d.print(self, f),
            Value::Range(r) => r.print(self, f),
            Value::SharedCell(c) => c.print(self, f),
            Value::Function(n) => n.print(self, f),
            Value::Closure(c) => c.print(self, f),
            Value::Generator(g) => g.print(self, f),
            Value::Class(c) => c.print(self, f),
            Value::Instance(i) => i.print(self, f),
            Value::TupleIter(i) => i.print(self, f),
            Value::ListIter(i) => i.print(self, f),
            Value::RangeIter(i) => i.print(self, f),
            Value::WeakRef(w) => w.print(self, f),
        }
    }
}

impl<'guard> fmt::Debug for Value<'guard> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{:?}", *b),
            Value::Int(n) => write!(f, "{}", *n),
            Value::Symbol(s) => s.debug(self, f),
            Value::BigNum(n) => n.debug(self, f),
            Value::Text(t) => t.debug(self, f),
            Value::ArrayU8(a) => a.debug(self, f),
            Value::Tuple(t) => t.debug(self, f),
            Value::List(a) => a.debug(self, f),
            Value::Set(s) => s.debug(self, f),
            Value::Dict(d) => d.debug(self, f),
            Value::Range(r) => r.debug(self, f),
            Value::SharedCell(c) => c.debug(self, f),
            Value::Function(n) => n.debug(self, f),
            Value::Closure(c) => c.debug(self, f),
            Value::Generator(g) => g.debug(self, f),
            Value::Class(c) => c.debug(self, f),
            Value::Instance(i) => i.debug(self, f),
            Value::TupleIter(i) => i.debug(self, f),
            Value::ListIter(i) => i.debug(self, f),
            Value::RangeIter(i) => i.debug(self, f),
            Value::WeakRef(w) => w.debug(self, f),
        }
    }
}

impl<'guard> MutatorScope for Value<'guard> {}

/// An unpacked tagged Fat Pointer that carries the type information in the enum structure.
/// This should represent every type native to the runtime.
#[derive(Copy, Clone)]
pub enum FatPtr {
    None,
    Bool(bool),
    Int(isize),
    Symbol(RawPtr<Symbol>),
    BigNum(RawPtr<BigNum>),
    Text(RawPtr<Text>),
    ArrayU8(RawPtr<ArrayU8>),
    Tuple(RawPtr<Tuple>),
    List(RawPtr<List>),
    Set(RawPtr<Set>),
    Dict(RawPtr<Dict>),
    Range(RawPtr<Range>),
    SharedCell(RawPtr<SharedCell>),
    Function(RawPtr<Function>),
    Closure(RawPtr<Closure>),
    Generator(RawPtr<Generator>),
    Class(RawPtr<Class>),
    Instance(RawPtr<Instance>),
    TupleIter(RawPtr<TupleIter>),
    ListIter(RawPtr<ListIter>),
    RangeIter(RawPtr<RangeIter>),
    WeakRef(RawPtr<WeakRef>),
}

impl FatPtr {
    /// Given a lifetime, convert to a `Value` type. Unsafe because anything can provide a lifetime
    /// without any safety guarantee that it's valid.
    pub fn as_value<'guard>(&self, guard: &'guard dyn MutatorScope) -> Value<'guard> {
        match self {
            FatPtr::None => Value::None,
            FatPtr::Bool(b) => Value::Bool(*b),
            FatPtr::Int(num) => Value::Int(*num),
            FatPtr::Symbol(p) => Value::Symbol(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::BigNum(p) => Value::BigNum(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Text(p) => Value::Text(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::ArrayU8(p) => Value::ArrayU8(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Tuple(p) => Value::Tuple(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::List(p) => Value::List(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Set(p) => Value::Set(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Dict(p) => Value::Dict(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Range(p) => Value::Range(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::SharedCell(p) => Value::SharedCell(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Function(p) => Value::Function(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Closure(p) => Value::Closure(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Generator(p) => Value::Generator(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Class(p) => Value::Class(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::Instance(p) => Value::Instance(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::TupleIter(p) => Value::TupleIter(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::ListIter(p) => Value::ListIter(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::RangeIter(p) => Value::RangeIter(ScopedPtr::new(guard, p.scoped_ref(guard))),
            FatPtr::WeakRef(p) => Value::WeakRef(ScopedPtr::new(guard, p.scoped_ref(guard))),
        }
    }
}

/// Implement `From<RawPtr<T>> for FatPtr` for the given FatPtr discriminant and the given `T`
macro_rules! fatptr_from_rawptr {
    ($F:tt, $T:ty) => {
        impl From<RawPtr<$T>> for FatPtr {
            fn from(ptr: RawPtr<$T>) -> FatPtr {
                FatPtr::$F(ptr)
            }
        }
    };
}

fatptr_from_rawptr!(Symbol, Symbol);
fatptr_from_rawptr!(BigNum, BigNum);
fatptr_from_rawptr!(Text, Text);
fatptr_from_rawptr!(ArrayU8, ArrayU8);
fatptr_from_rawptr!(Tuple, Tuple);
fatptr_from_rawptr!(List, List);
fatptr_from_rawptr!(Set, Set);
fatptr_from_rawptr!(Dict, Dict);
fatptr_from_rawptr!(Range, Range);
fatptr_from_rawptr!(SharedCell, SharedCell);
fatptr_from_rawptr!(Function, Function);
fatptr_from_rawptr!(Closure, Closure);
fatptr_from_rawptr!(Generator, Generator);
fatptr_from_rawptr!(Class, Class);
fatptr_from_rawptr!(Instance, Instance);
fatptr_from_rawptr!(TupleIter, TupleIter);
fatptr_from_rawptr!(ListIter, ListIter);
fatptr_from_rawptr!(RangeIter, RangeIter);
fatptr_from_rawptr!(WeakRef, WeakRef);

/// Conversion from an integer type. Callers must check the inline range
/// first; out-of-range integers get a heap `BigNum` instead.
impl From<isize> for FatPtr {
    fn from(num: isize) -> FatPtr {
        FatPtr::Int(num)
    }
}

/// Conversion from a TaggedPtr type
impl From<TaggedPtr> for FatPtr {
    fn from(ptr: TaggedPtr) -> FatPtr {
        ptr.into_fat_ptr()
    }
}

/// Identity comparison. Two fat pointers are equal when they pack to the
/// same word: same object, same singleton or same inline integer.
impl PartialEq for FatPtr {
    fn eq(&self, other: &FatPtr) -> bool {
        TaggedPtr::from(*self) == TaggedPtr::from(*other)
    }
}

/// A packed Tagged Pointer which carries type information in the word's low bits.
///
/// Bit 0 set means the word is an inline integer shifted up one bit. The
/// remaining even words are symbol pointers (low bits `10`), heap object
/// pointers (low bits `00`) or one of the singleton words for `None`,
/// `False` and `True`.
#[derive(Copy, Clone)]
pub union TaggedPtr {
    tag: usize,
    smallint: isize,
    symbol: NonNull<Symbol>,
    object: NonNull<()>,
}

impl TaggedPtr {
    /// Construct a None TaggedPtr
    pub fn none() -> TaggedPtr {
        TaggedPtr { tag: SENTINEL_NONE }
    }

    /// Return true if the pointer is the None singleton
    pub fn is_none(&self) -> bool {
        unsafe { self.tag == SENTINEL_NONE }
    }

    /// Construct a singleton boolean TaggedPtr
    pub fn boolean(value: bool) -> TaggedPtr {
        TaggedPtr {
            tag: if value { SENTINEL_TRUE } else { SENTINEL_FALSE },
        }
    }

    /// Construct a generic object TaggedPtr
    fn object<T>(ptr: RawPtr<T>) -> TaggedPtr {
        TaggedPtr {
            object: ptr.tag(TAG_OBJECT).cast::<()>(),
        }
    }

    /// Construct a Symbol TaggedPtr
    pub fn symbol(ptr: RawPtr<Symbol>) -> TaggedPtr {
        TaggedPtr {
            symbol: ptr.tag(TAG_SYMBOL),
        }
    }

    /// Construct an inline integer TaggedPtr. The value must be in the
    /// inline range; wider integers are heap-allocated as `BigNum`.
    pub fn number(value: isize) -> TaggedPtr {
        debug_assert!(crate::number::fits_small_int(value));
        TaggedPtr {
            smallint: (value << 1) | (TAG_SMALLINT as isize),
        }
    }

    /// Get the packed word without interpreting it
    pub fn as_word(&self) -> usize {
        unsafe { self.tag }
    }

    /// Reconstitute a TaggedPtr from a packed word
    pub fn from_word(word: usize) -> TaggedPtr {
        TaggedPtr { tag: word }
    }

    /// Report whether the word points at a heap object of the given kind.
    /// A single header read; the pointer is not unpacked. Inline integers,
    /// singletons and symbol words answer false.
    pub fn is_heap_kind(&self, kind: TypeList) -> bool {
        unsafe {
            match get_tag(self.tag) {
                TAG_OBJECT => match self.tag {
                    SENTINEL_NONE | SENTINEL_FALSE | SENTINEL_TRUE => false,

                    _ => {
                        let untyped_object_ptr = RawPtr::untag(self.object).as_untyped();
                        let header_ptr = HeapStorage::get_header(untyped_object_ptr);

                        header_ptr.as_ref().type_id() == kind
                    }
                },

                _ => false,
            }
        }
    }

    fn into_fat_ptr(&self) -> FatPtr {
        unsafe {
            match get_tag(self.tag) {
                // arithmetic shift recovers the sign
                TAG_SMALLINT => FatPtr::Int(self.smallint >> 1),
                TAG_SYMBOL => FatPtr::Symbol(RawPtr::untag(self.symbol)),

                TAG_OBJECT => match self.tag {
                    SENTINEL_NONE => FatPtr::None,
                    SENTINEL_FALSE => FatPtr::Bool(false),
                    SENTINEL_TRUE => FatPtr::Bool(true),

                    _ => {
                        let untyped_object_ptr = RawPtr::untag(self.object).as_untyped();
                        let header_ptr = HeapStorage::get_header(untyped_object_ptr);

                        header_ptr.as_ref().get_object_fatptr()
                    }
                },

                _ => panic!("Invalid TaggedPtr type tag!"),
            }
        }
    }
}

impl From<FatPtr> for TaggedPtr {
    fn from(ptr: FatPtr) -> TaggedPtr {
        match ptr {
            FatPtr::None => TaggedPtr::none(),
            FatPtr::Bool(value) => TaggedPtr::boolean(value),
            FatPtr::Int(value) => TaggedPtr::number(value),
            FatPtr::Symbol(raw) => TaggedPtr::symbol(raw),
            FatPtr::BigNum(raw) => TaggedPtr::object(raw),
            FatPtr::Text(raw) => TaggedPtr::object(raw),
            FatPtr::ArrayU8(raw) => TaggedPtr::object(raw),
            FatPtr::Tuple(raw) => TaggedPtr::object(raw),
            FatPtr::List(raw) => TaggedPtr::object(raw),
            FatPtr::Set(raw) => TaggedPtr::object(raw),
            FatPtr::Dict(raw) => TaggedPtr::object(raw),
            FatPtr::Range(raw) => TaggedPtr::object(raw),
            FatPtr::SharedCell(raw) => TaggedPtr::object(raw),
            FatPtr::Function(raw) => TaggedPtr::object(raw),
            FatPtr::Closure(raw) => TaggedPtr::object(raw),
            FatPtr::Generator(raw) => TaggedPtr::object(raw),
            FatPtr::Class(raw) => TaggedPtr::object(raw),
            FatPtr::Instance(raw) => TaggedPtr::object(raw),
            FatPtr::TupleIter(raw) => TaggedPtr::object(raw),
            FatPtr::ListIter(raw) => TaggedPtr::object(raw),
            FatPtr::RangeIter(raw) => TaggedPtr::object(raw),
            FatPtr::WeakRef(raw) => TaggedPtr::object(raw),
        }
    }
}

/// Simple identity equality
impl PartialEq for TaggedPtr {
    fn eq(&self, other: &TaggedPtr) -> bool {
        unsafe { self.tag == other.tag }
    }
}
