/// Iterator object types over the indexable containers. Each iterator holds
/// a cursor into its source rather than a snapshot, so mutation of the
/// source between calls to next() is visible. Exhaustion is sticky: once an
/// iterator reports done it stays done even if the source grows afterwards.
use std::cell::Cell;
use std::fmt;

use crate::containers::{Container, IndexedAnyContainer};
use crate::error::RuntimeError;
use crate::list::List;
use crate::memory::MutatorView;
use crate::number::from_i128;
use crate::printer::Print;
use crate::range::Range;
use crate::rawarray::ArraySize;
use crate::safeptr::{CellPtr, MutatorScope, ScopedPtr, TaggedScopedPtr};
use crate::tuple::Tuple;

pub struct TupleIter {
    source: CellPtr<Tuple>,
    cursor: Cell<ArraySize>,
    done: Cell<bool>,
}

impl TupleIter {
    /// Allocate an iterator positioned at the start of the tuple
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        source: ScopedPtr<'guard, Tuple>,
    ) -> Result<ScopedPtr<'guard, TupleIter>, RuntimeError> {
        mem.alloc(TupleIter {
            source: CellPtr::new_with(source),
            cursor: Cell::new(0),
            done: Cell::new(false),
        })
    }

    /// Return the next value, or None when the tuple is exhausted
    pub fn next<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
    ) -> Result<Option<TaggedScopedPtr<'guard>>, RuntimeError> {
        if self.done.get() {
            return Ok(None);
        }

        let source = self.source.get(guard);
        let cursor = self.cursor.get();

        if cursor >= source.length() {
            self.done.set(true);
            return Ok(None);
        }

        let value = source.get(guard, cursor)?;
        self.cursor.set(cursor + 1);
        Ok(Some(value))
    }

    pub fn source<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Tuple> {
        self.source.get(guard)
    }
}

impl Print for TupleIter {
    fn print<'guard>(
        &self,
        _guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<tuple_iterator>")
    }
}

pub struct ListIter {
    source: CellPtr<List>,
    cursor: Cell<ArraySize>,
    done: Cell<bool>,
}

impl ListIter {
    /// Allocate an iterator positioned at the start of the list
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        source: ScopedPtr<'guard, List>,
    ) -> Result<ScopedPtr<'guard, ListIter>, RuntimeError> {
        ListIter::alloc_at(mem, source, 0)
    }

    /// Allocate an iterator with the cursor at the given index
    pub fn alloc_at<'guard>(
        mem: &'guard MutatorView,
        source: ScopedPtr<'guard, List>,
        cursor: ArraySize,
    ) -> Result<ScopedPtr<'guard, ListIter>, RuntimeError> {
        mem.alloc(ListIter {
            source: CellPtr::new_with(source),
            cursor: Cell::new(cursor),
            done: Cell::new(false),
        })
    }

    /// Return the next value, or None when the list is exhausted. The length
    /// check happens here against the live list, so elements appended since
    /// the last call are yielded and a shrunken list exhausts early.
    pub fn next<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
    ) -> Result<Option<TaggedScopedPtr<'guard>>, RuntimeError> {
        if self.done.get() {
            return Ok(None);
        }

        let source = self.source.get(guard);
        let cursor = self.cursor.get();

        if cursor >= source.length() {
            self.done.set(true);
            return Ok(None);
        }

        let value = IndexedAnyContainer::get(&*source, guard, cursor)?;
        self.cursor.set(cursor + 1);
        Ok(Some(value))
    }

    pub fn source<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, List> {
        self.source.get(guard)
    }
}

impl Print for ListIter {
    fn print<'guard>(
        &self,
        _guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<list_iterator>")
    }
}

pub struct RangeIter {
    source: CellPtr<Range>,
    cursor: Cell<ArraySize>,
    done: Cell<bool>,
}

impl RangeIter {
    /// Allocate an iterator positioned at the start of the range
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        source: ScopedPtr<'guard, Range>,
    ) -> Result<ScopedPtr<'guard, RangeIter>, RuntimeError> {
        mem.alloc(RangeIter {
            source: CellPtr::new_with(source),
            cursor: Cell::new(0),
            done: Cell::new(false),
        })
    }

    /// Return the next value, or None when the progression is exhausted.
    /// Values are built fresh, so wide steps promote to BigNum as needed.
    pub fn next<'guard>(
        &self,
        mem: &'guard MutatorView,
    ) -> Result<Option<TaggedScopedPtr<'guard>>, RuntimeError> {
        if self.done.get() {
            return Ok(None);
        }

        let source = self.source.get(mem);
        let cursor = self.cursor.get();

        if cursor >= source.length() {
            self.done.set(true);
            return Ok(None);
        }

        let value = source.get(cursor)?;
        self.cursor.set(cursor + 1);
        Ok(Some(from_i128(mem, value)?))
    }

    pub fn source<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Range> {
        self.source.get(guard)
    }
}

impl Print for RangeIter {
    fn print<'guard>(
        &self,
        _guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<range_iterator>")
    }
}

#[cfg(test)]
mod test {
    use super::{ListIter, RangeIter, TupleIter};
    use crate::containers::{StackAnyContainer, StackContainer};
    use crate::error::RuntimeError;
    use crate::list::List;
    use crate::memory::{Memory, Mutator, MutatorView};
    use crate::range::Range;
    use crate::tuple::Tuple;

    #[test]
    fn tuple_iter_walks_all_items() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let items = [mem.number(1), mem.number(2), mem.number(3)];
                let tuple = Tuple::alloc_from_slice(mem, &items)?;
                let iter = TupleIter::alloc(mem, tuple)?;

                assert!(iter.next(mem)? == Some(mem.number(1)));
                assert!(iter.next(mem)? == Some(mem.number(2)));
                assert!(iter.next(mem)? == Some(mem.number(3)));
                assert!(iter.next(mem)?.is_none());
                assert!(iter.next(mem)?.is_none());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn list_iter_sees_growth_before_exhaustion() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let list = List::alloc(mem)?;
                StackAnyContainer::push(&*list, mem, mem.number(10))?;

                let iter = ListIter::alloc(mem, list)?;
                assert!(iter.next(mem)? == Some(mem.number(10)));

                // grow the list before the iterator reports done
                StackAnyContainer::push(&*list, mem, mem.number(11))?;
                assert!(iter.next(mem)? == Some(mem.number(11)));
                assert!(iter.next(mem)?.is_none());

                // exhaustion is sticky, growing again does not revive it
                StackAnyContainer::push(&*list, mem, mem.number(12))?;
                assert!(iter.next(mem)?.is_none());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn list_iter_from_cursor_drains_remainder() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let list = List::alloc(mem)?;
                for n in 0..4 {
                    StackAnyContainer::push(&*list, mem, mem.number(n))?;
                }

                // start partway through, then grow the list underneath
                let iter = ListIter::alloc_at(mem, list, 2)?;
                StackAnyContainer::push(&*list, mem, mem.number(4))?;
                StackAnyContainer::push(&*list, mem, mem.number(5))?;

                let mut drained = Vec::new();
                while let Some(value) = iter.next(mem)? {
                    drained.push(value);
                }

                // six elements after appending, minus the two skipped by
                // the starting cursor
                assert!(drained.len() == 4);
                for (index, value) in drained.iter().enumerate() {
                    assert!(*value == mem.number(index as isize + 2));
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn list_iter_shrink_exhausts_early() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let list = List::alloc(mem)?;
                for n in 0..4 {
                    StackAnyContainer::push(&*list, mem, mem.number(n))?;
                }

                let iter = ListIter::alloc(mem, list)?;
                assert!(iter.next(mem)? == Some(mem.number(0)));

                // drop the tail below the cursor
                StackContainer::pop(&*list, mem)?;
                StackContainer::pop(&*list, mem)?;
                StackContainer::pop(&*list, mem)?;

                assert!(iter.next(mem)?.is_none());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn range_iter_promotes_wide_values() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                use num::bigint::BigInt;

                use crate::number::SMALL_INT_MAX;
                use crate::taggedptr::Value;

                let range = Range::alloc(mem, SMALL_INT_MAX + 1, SMALL_INT_MAX + 3, 1)?;
                let iter = RangeIter::alloc(mem, range)?;

                for offset in 1..3 {
                    match iter.next(mem)? {
                        Some(value) => match *value {
                            Value::BigNum(n) => {
                                assert!(*n.value() == BigInt::from(SMALL_INT_MAX as i128 + offset))
                            }
                            _ => panic!("expected promotion to BigNum"),
                        },
                        None => panic!("progression exhausted early"),
                    }
                }

                assert!(iter.next(mem)?.is_none());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn range_iter_descending() {
        let mem = Memory::new();

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let range = Range::alloc(mem, 6, 0, -2)?;
                let iter = RangeIter::alloc(mem, range)?;

                assert!(iter.next(mem)? == Some(mem.number(6)));
                assert!(iter.next(mem)? == Some(mem.number(4)));
                assert!(iter.next(mem)? == Some(mem.number(2)));
                assert!(iter.next(mem)?.is_none());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
