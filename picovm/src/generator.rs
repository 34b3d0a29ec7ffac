/// Generator objects: a suspendable activation of a generator function.
/// The Generator owns the activation state; actually running the body is
/// delegated through the Executor seam.
use std::cell::Cell;
use std::fmt;

use crate::error::{err_eval, err_type, ErrorKind, RuntimeError};
use crate::exec::{Entry, Executor, Outcome};
use crate::function::Function;
use crate::list::List;
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::rawarray::ArraySize;
use crate::safeptr::{CellPtr, MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};

/// Lifecycle of a generator. Returned and Raised are terminal.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum GeneratorState {
    /// Built but never resumed
    Created,
    /// Parked at a yield
    Suspended,
    /// An activation is on the stack right now
    Running,
    /// The body returned
    Returned,
    /// The body raised
    Raised,
}

/// What a successful resume produced
pub enum Resume<'guard> {
    /// The body yielded this value and is suspended again
    Yielded(TaggedScopedPtr<'guard>),
    /// The body finished with this return value
    Returned(TaggedScopedPtr<'guard>),
    /// The body terminated by raising this value
    Raised(TaggedScopedPtr<'guard>),
}

pub struct Generator {
    state: Cell<GeneratorState>,
    func: CellPtr<Function>,
    /// Saved resume point within the function's code object
    ip: Cell<ArraySize>,
    /// Saved value stack of the suspended activation
    stack: CellPtr<List>,
    /// Saved local variable bindings of the suspended activation
    locals: CellPtr<List>,
    /// Return value or raised value once terminal
    result: TaggedCellPtr,
}

impl Generator {
    /// Allocate a Generator in the Created state for a generator function
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        func: ScopedPtr<'guard, Function>,
    ) -> Result<ScopedPtr<'guard, Generator>, RuntimeError> {
        if !func.is_generator() {
            return err_type("cannot build a generator from a non-generator function");
        }

        let stack = List::alloc(mem)?;
        let locals = List::alloc(mem)?;

        mem.alloc(Generator {
            state: Cell::new(GeneratorState::Created),
            func: CellPtr::new_with(func),
            ip: Cell::new(0),
            stack: CellPtr::new_with(stack),
            locals: CellPtr::new_with(locals),
            result: TaggedCellPtr::new_none(),
        })
    }

    pub fn state(&self) -> GeneratorState {
        self.state.get()
    }

    pub fn function<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Function> {
        self.func.get(guard)
    }

    pub fn ip(&self) -> ArraySize {
        self.ip.get()
    }

    pub fn set_ip(&self, ip: ArraySize) {
        self.ip.set(ip)
    }

    pub fn stack<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, List> {
        self.stack.get(guard)
    }

    pub fn locals<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, List> {
        self.locals.get(guard)
    }

    /// The return value once Returned, or the raised value once Raised
    pub fn result<'guard>(&self, guard: &'guard dyn MutatorScope) -> TaggedScopedPtr<'guard> {
        self.result.get(guard)
    }

    /// The result slot, for the tracer
    pub fn result_cell(&self) -> &TaggedCellPtr {
        &self.result
    }

    /// Drive the generator to its next suspension point. `sent` becomes the
    /// value of the suspended yield expression; it is ignored on the first
    /// resume.
    pub fn resume<'guard>(
        &self,
        mem: &'guard MutatorView,
        exec: &dyn Executor,
        gen: ScopedPtr<'guard, Generator>,
        sent: TaggedScopedPtr<'guard>,
    ) -> Result<Resume<'guard>, RuntimeError> {
        let entry = match self.state.get() {
            GeneratorState::Created => Entry::Start,
            GeneratorState::Suspended => Entry::Resume(sent),
            GeneratorState::Running => {
                return Err(RuntimeError::new(ErrorKind::GeneratorRunning))
            }
            GeneratorState::Returned | GeneratorState::Raised => {
                return Err(RuntimeError::new(ErrorKind::GeneratorExhausted))
            }
        };

        self.state.set(GeneratorState::Running);

        match exec.step(mem, gen, entry) {
            Ok(Outcome::Yield(value)) => {
                self.state.set(GeneratorState::Suspended);
                Ok(Resume::Yielded(value))
            }
            Ok(Outcome::Return(value)) => {
                self.state.set(GeneratorState::Returned);
                self.result.set(value);
                Ok(Resume::Returned(value))
            }
            Ok(Outcome::Raise(value)) => {
                self.state.set(GeneratorState::Raised);
                self.result.set(value);
                Ok(Resume::Raised(value))
            }
            Err(e) => {
                self.state.set(GeneratorState::Raised);
                Err(e)
            }
        }
    }

    /// Cancel the generator, unwinding a suspended body so its cleanup
    /// handlers run. Closing a terminal generator is a no-op.
    pub fn close<'guard>(
        &self,
        mem: &'guard MutatorView,
        exec: &dyn Executor,
        gen: ScopedPtr<'guard, Generator>,
    ) -> Result<(), RuntimeError> {
        match self.state.get() {
            GeneratorState::Returned | GeneratorState::Raised => return Ok(()),
            GeneratorState::Running => {
                return Err(RuntimeError::new(ErrorKind::GeneratorRunning))
            }
            GeneratorState::Created => {
                // never started, nothing to unwind
                self.state.set(GeneratorState::Returned);
                return Ok(());
            }
            GeneratorState::Suspended => (),
        }

        self.state.set(GeneratorState::Running);

        match exec.step(mem, gen, Entry::Cancel) {
            Ok(Outcome::Return(value)) => {
                self.state.set(GeneratorState::Returned);
                self.result.set(value);
                Ok(())
            }
            Ok(Outcome::Raise(value)) => {
                // an exception escaped a cleanup handler
                self.state.set(GeneratorState::Raised);
                self.result.set(value);
                err_eval("exception raised while closing generator")
            }
            Ok(Outcome::Yield(_)) => {
                self.state.set(GeneratorState::Raised);
                err_eval("generator ignored cancellation")
            }
            Err(e) => {
                self.state.set(GeneratorState::Raised);
                Err(e)
            }
        }
    }
}

impl Print for Generator {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<generator {}>", self.func.get(guard).name(guard))
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use super::{Generator, GeneratorState, Resume};
    use crate::error::{ErrorKind, RuntimeError};
    use crate::exec::{Entry, Executor, Outcome};
    use crate::function::Function;
    use crate::list::List;
    use crate::memory::{Memory, Mutator, MutatorView};
    use crate::safeptr::{ScopedPtr, TaggedScopedPtr};

    // A scripted stand-in for the real interpreter. Each step pops the
    // next scripted result; cancellation runs the recorded cleanup step.
    enum Step {
        Yield(isize),
        Return(isize),
        Raise(isize),
    }

    struct Script {
        steps: RefCell<Vec<Step>>,
        cleanup_runs: Cell<u32>,
    }

    impl Script {
        fn new(mut steps: Vec<Step>) -> Script {
            steps.reverse();
            Script {
                steps: RefCell::new(steps),
                cleanup_runs: Cell::new(0),
            }
        }
    }

    impl Executor for Script {
        fn call<'guard>(
            &self,
            _mem: &'guard MutatorView,
            _callable: TaggedScopedPtr<'guard>,
            _args: &[TaggedScopedPtr<'guard>],
        ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
            unreachable!("generator stepping never calls")
        }

        fn step<'guard>(
            &self,
            mem: &'guard MutatorView,
            _gen: ScopedPtr<'guard, Generator>,
            entry: Entry<'guard>,
        ) -> Result<Outcome<'guard>, RuntimeError> {
            if let Entry::Cancel = entry {
                self.cleanup_runs.set(self.cleanup_runs.get() + 1);
                return Ok(Outcome::Return(mem.none()));
            }

            match self.steps.borrow_mut().pop() {
                Some(Step::Yield(n)) => Ok(Outcome::Yield(mem.number(n))),
                Some(Step::Return(n)) => Ok(Outcome::Return(mem.number(n))),
                Some(Step::Raise(n)) => Ok(Outcome::Raise(mem.number(n))),
                None => panic!("script ran dry"),
            }
        }
    }

    fn generator_fn<'guard>(
        mem: &'guard MutatorView,
    ) -> Result<ScopedPtr<'guard, Generator>, RuntimeError> {
        let params = List::alloc(mem)?;
        let func = Function::alloc(mem, mem.lookup_sym("gen"), params, mem.none(), true)?;
        Generator::alloc(mem, func)
    }

    #[test]
    fn generator_yields_then_exhausts() {
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
                let gen = generator_fn(mem)?;
                assert!(gen.state() == GeneratorState::Created);

                let script = Script::new(vec![
                    Step::Yield(1),
                    Step::Yield(2),
                    Step::Return(3),
                ]);

                match gen.resume(mem, &script, gen, mem.none())? {
                    Resume::Yielded(v) => assert!(v == mem.number(1)),
                    _ => panic!("expected a yield"),
                }
                assert!(gen.state() == GeneratorState::Suspended);

                match gen.resume(mem, &script, gen, mem.none())? {
                    Resume::Yielded(v) => assert!(v == mem.number(2)),
                    _ => panic!("expected a yield"),
                }

                match gen.resume(mem, &script, gen, mem.none())? {
                    Resume::Returned(v) => assert!(v == mem.number(3)),
                    _ => panic!("expected a return"),
                }
                assert!(gen.state() == GeneratorState::Returned);
                assert!(gen.result(mem) == mem.number(3));

                // a fourth resume does not re-enter the body
                match gen.resume(mem, &script, gen, mem.none()) {
                    Ok(_) => panic!("terminal generator should not resume"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::GeneratorExhausted),
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn generator_raise_is_terminal() {
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
                let gen = generator_fn(mem)?;
                let script = Script::new(vec![Step::Raise(99)]);

                match gen.resume(mem, &script, gen, mem.none())? {
                    Resume::Raised(v) => assert!(v == mem.number(99)),
                    _ => panic!("expected a raise"),
                }
                assert!(gen.state() == GeneratorState::Raised);

                match gen.resume(mem, &script, gen, mem.none()) {
                    Ok(_) => panic!("terminal generator should not resume"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::GeneratorExhausted),
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn close_runs_cleanup_exactly_once() {
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
                let gen = generator_fn(mem)?;
                let script = Script::new(vec![Step::Yield(1)]);

                gen.resume(mem, &script, gen, mem.none())?;
                assert!(gen.state() == GeneratorState::Suspended);

                gen.close(mem, &script, gen)?;
                assert!(gen.state() == GeneratorState::Returned);
                assert!(script.cleanup_runs.get() == 1);

                // close is idempotent once terminal
                gen.close(mem, &script, gen)?;
                assert!(script.cleanup_runs.get() == 1);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn close_before_first_resume_skips_body() {
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
                let gen = generator_fn(mem)?;
                let script = Script::new(vec![]);

                gen.close(mem, &script, gen)?;
                assert!(gen.state() == GeneratorState::Returned);
                assert!(script.cleanup_runs.get() == 0);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn non_generator_function_rejected() {
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
                let params = List::alloc(mem)?;
                let func =
                    Function::alloc(mem, mem.lookup_sym("plain"), params, mem.none(), false)?;

                match Generator::alloc(mem, func) {
                    Ok(_) => panic!("plain function should not build a generator"),
                    Err(e) => match e.error_kind() {
                        ErrorKind::TypeError(_) => (),
                        _ => panic!("expected a type error"),
                    },
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
