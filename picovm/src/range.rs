/// An immutable arithmetic progression of integers.
use std::fmt;

use crate::error::{err_eval, ErrorKind, RuntimeError};
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::rawarray::ArraySize;
use crate::safeptr::{MutatorScope, ScopedPtr};

pub struct Range {
    start: isize,
    stop: isize,
    step: isize,
}

impl Range {
    /// Allocate a Range on the heap. A zero step is invalid.
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        start: isize,
        stop: isize,
        step: isize,
    ) -> Result<ScopedPtr<'guard, Range>, RuntimeError> {
        if step == 0 {
            return err_eval("range() step argument must not be zero");
        }

        mem.alloc(Range { start, stop, step })
    }

    pub fn start(&self) -> isize {
        self.start
    }

    pub fn stop(&self) -> isize {
        self.stop
    }

    pub fn step(&self) -> isize {
        self.step
    }

    /// The number of values the progression yields
    pub fn length(&self) -> ArraySize {
        let span = if self.step > 0 {
            self.stop.saturating_sub(self.start)
        } else {
            self.start.saturating_sub(self.stop)
        };

        if span <= 0 {
            0
        } else {
            let step = self.step.unsigned_abs();
            ((span as usize + step - 1) / step) as ArraySize
        }
    }

    /// Return the value at the given index. Bounds-checked. Computed in
    /// wide arithmetic; a progression whose values leave the machine-word
    /// range still indexes without wrapping.
    pub fn get(&self, index: ArraySize) -> Result<i128, RuntimeError> {
        if index >= self.length() {
            return Err(RuntimeError::new(ErrorKind::BoundsError));
        }

        Ok(self.start as i128 + self.step as i128 * index as i128)
    }
}

impl Print for Range {
    fn print<'guard>(
        &self,
        _guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        if self.step == 1 {
            write!(f, "range({}, {})", self.start, self.stop)
        } else {
            write!(f, "range({}, {}, {})", self.start, self.stop, self.step)
        }
    }
}

#[cfg(test)]
mod test {
    use super::Range;
    use crate::error::{ErrorKind, RuntimeError};
    use crate::memory::{Memory, Mutator, MutatorView};

    #[test]
    fn range_lengths() {
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
                assert!(Range::alloc(mem, 0, 10, 1)?.length() == 10);
                assert!(Range::alloc(mem, 0, 10, 3)?.length() == 4);
                assert!(Range::alloc(mem, 10, 0, -1)?.length() == 10);
                assert!(Range::alloc(mem, 10, 0, -3)?.length() == 4);
                assert!(Range::alloc(mem, 0, 0, 1)?.length() == 0);
                assert!(Range::alloc(mem, 5, 0, 1)?.length() == 0);
                assert!(Range::alloc(mem, 0, 5, -1)?.length() == 0);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn range_indexing() {
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
                let range = Range::alloc(mem, 4, -6, -2)?;

                assert!(range.get(0)? == 4);
                assert!(range.get(1)? == 2);
                assert!(range.get(4)? == -4);

                match range.get(5) {
                    Ok(_) => panic!("index should have been out of bounds"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::BoundsError),
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn range_wide_values_do_not_wrap() {
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
                // values here are representable but far outside the
                // inline integer range
                let range = Range::alloc(mem, isize::MAX - 3, isize::MAX, 2)?;

                assert!(range.length() == 2);
                assert!(range.get(0)? == isize::MAX as i128 - 3);
                assert!(range.get(1)? == isize::MAX as i128 - 1);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn range_zero_step_rejected() {
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
                match Range::alloc(mem, 0, 10, 0) {
                    Ok(_) => panic!("zero step should have been rejected"),
                    Err(e) => match e.error_kind() {
                        ErrorKind::EvalError(_) => (),
                        _ => panic!("expected an eval error"),
                    },
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
