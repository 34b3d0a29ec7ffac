/// Weak reference objects. A WeakRef holds a link to a target without
/// keeping it alive, plus an optional finalizer callback to run when the
/// target becomes unreachable.
///
/// The link is published under a sequence stamp so that a reader running
/// concurrently with a writer (an interrupt handler clearing the link, for
/// instance) never observes a torn word. Writers bump the stamp to an odd
/// value, store the link, then bump the stamp to the next even value.
/// Readers double-read the stamp around the link load and retry on any
/// mismatch. The retry loop is bounded so a reader preempted by a
/// pathological stream of writes fails with WeakUnavailable rather than
/// spinning forever.
use std::fmt;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

use log::error;

use crate::error::{ErrorKind, RuntimeError};
use crate::exec::Executor;
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::safeptr::{MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};
use crate::taggedptr::{TaggedPtr, Value};

/// Upper bound on reader retries before giving up
const MAX_READ_RETRIES: usize = 64;

/// What clearing the link found
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ClearStatus {
    /// The link held a target and is now empty
    Cleared,
    /// The link was already empty
    AlreadyEmpty,
}

pub struct WeakRef {
    /// Tagged word for the target, or the None word when cleared
    link: AtomicUsize,
    /// Sequence stamp guarding `link`. Odd while a write is in flight.
    stamp: AtomicUsize,
    /// Optional finalizer callable, run once when the target dies
    callback: TaggedCellPtr,
}

impl WeakRef {
    /// Allocate a WeakRef to the given target. Pass None as the callback
    /// for no explicit finalizer.
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        target: TaggedScopedPtr<'guard>,
        callback: TaggedScopedPtr<'guard>,
    ) -> Result<ScopedPtr<'guard, WeakRef>, RuntimeError> {
        mem.alloc(WeakRef {
            link: AtomicUsize::new(target.get_ptr().as_word()),
            stamp: AtomicUsize::new(0),
            callback: TaggedCellPtr::new_with(callback),
        })
    }

    /// Store a new link word under the stamp protocol. Only the mutator
    /// thread writes; concurrent readers are what the stamp defends.
    fn write_link(&self, word: usize) {
        let stamp = self.stamp.load(Ordering::Relaxed);
        self.stamp.store(stamp.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);
        self.link.store(word, Ordering::Relaxed);
        self.stamp.store(stamp.wrapping_add(2), Ordering::Release);
    }

    fn read_link<F>(&self, mut probe: F) -> Result<usize, RuntimeError>
    where
        F: FnMut(),
    {
        for _ in 0..MAX_READ_RETRIES {
            let begin = self.stamp.load(Ordering::Acquire);
            if begin & 1 == 1 {
                // write in flight
                probe();
                continue;
            }

            let word = self.link.load(Ordering::Acquire);

            probe();

            let end = self.stamp.load(Ordering::Acquire);
            if begin == end {
                return Ok(word);
            }
        }

        Err(RuntimeError::new(ErrorKind::WeakUnavailable))
    }

    /// Return the target, or the None value if the link has been cleared
    pub fn get<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        self.get_with_probe(guard, || ())
    }

    /// As get(), but invoking `probe` inside the read window. Lets a test
    /// interleave writes at the exact point a preemption would land.
    pub fn get_with_probe<'guard, F>(
        &self,
        guard: &'guard dyn MutatorScope,
        probe: F,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError>
    where
        F: FnMut(),
    {
        let word = self.read_link(probe)?;
        Ok(TaggedScopedPtr::new(guard, TaggedPtr::from_word(word)))
    }

    /// Point the link at a different target
    pub fn redirect(&self, target: TaggedScopedPtr) {
        self.write_link(target.get_ptr().as_word())
    }

    /// Empty the link. Idempotent.
    pub fn clear(&self) -> ClearStatus {
        if self.is_cleared() {
            return ClearStatus::AlreadyEmpty;
        }

        self.write_link(TaggedPtr::none().as_word());
        ClearStatus::Cleared
    }

    /// True if the link no longer holds a target
    pub fn is_cleared(&self) -> bool {
        self.link.load(Ordering::Acquire) == TaggedPtr::none().as_word()
    }

    /// The explicit finalizer callback, or None
    pub fn callback<'guard>(&self, guard: &'guard dyn MutatorScope) -> TaggedScopedPtr<'guard> {
        self.callback.get(guard)
    }

    /// The callback slot, for the tracer. The link is deliberately not
    /// exposed this way; a weak link must not be traced as a strong edge.
    pub fn callback_cell(&self) -> &TaggedCellPtr {
        &self.callback
    }

    /// Pick the finalizer for the current target: the explicit callback if
    /// one was given, otherwise the target's own `finalize` attribute when
    /// the target is an instance.
    fn finalizer<'guard>(
        &self,
        mem: &'guard MutatorView,
        target: TaggedScopedPtr<'guard>,
    ) -> Option<TaggedScopedPtr<'guard>> {
        let callback = self.callback.get(mem);
        if !self.callback.is_none() {
            return Some(callback);
        }

        if let Value::Instance(instance) = *target {
            if let Ok(method) = instance.lookup_attr(mem, mem.lookup_sym("finalize")) {
                return Some(method);
            }
        }

        None
    }
}

/// Run the finalizer for a dying target and empty the link. The link is
/// cleared whether or not a finalizer ran, and whether or not it
/// succeeded, so the finalizer fires at most once. A finalizer error is
/// logged and swallowed; teardown never propagates it.
pub fn run_finalizer<'guard>(
    mem: &'guard MutatorView,
    exec: &dyn Executor,
    weak: ScopedPtr<'guard, WeakRef>,
) -> Result<ClearStatus, RuntimeError> {
    if weak.is_cleared() {
        return Ok(ClearStatus::AlreadyEmpty);
    }

    let target = weak.get(mem)?;

    if let Some(callback) = weak.finalizer(mem, target) {
        let weak_ptr = weak.as_tagged(mem);
        if let Err(e) = exec.call(mem, callback, &[weak_ptr]) {
            error!("error in weakref finalizer: {}", e);
        }
    }

    Ok(weak.clear())
}

/// Tear down one link given the collector's reachability verdict for its
/// target. A reachable target leaves the link untouched; a dead one gets
/// its finalizer run and the link cleared.
pub fn finalize_unreachable<'guard, F>(
    mem: &'guard MutatorView,
    exec: &dyn Executor,
    weak: ScopedPtr<'guard, WeakRef>,
    is_reachable: F,
) -> Result<(), RuntimeError>
where
    F: Fn(TaggedScopedPtr<'guard>) -> bool,
{
    if weak.is_cleared() {
        return Ok(());
    }

    let target = weak.get(mem)?;
    if is_reachable(target) {
        return Ok(());
    }

    run_finalizer(mem, exec, weak)?;
    Ok(())
}

impl Print for WeakRef {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        if self.is_cleared() {
            write!(f, "<weakref (dead)>")
        } else {
            match self.get(guard) {
                Ok(target) => write!(f, "<weakref to {}>", target.value()),
                Err(_) => write!(f, "<weakref (busy)>"),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::{run_finalizer, ClearStatus, WeakRef};
    use crate::error::{ErrorKind, RuntimeError};
    use crate::exec::{Entry, Executor, Outcome};
    use crate::generator::Generator;
    use crate::memory::{Memory, Mutator, MutatorView};
    use crate::safeptr::{ScopedPtr, TaggedScopedPtr};
    use crate::taggedptr::Value;

    // Executor double that records finalizer calls and can be told to fail
    struct Recorder {
        calls: Cell<u32>,
        fail: bool,
    }

    impl Recorder {
        fn new(fail: bool) -> Recorder {
            Recorder {
                calls: Cell::new(0),
                fail,
            }
        }
    }

    impl Executor for Recorder {
        fn call<'guard>(
            &self,
            mem: &'guard MutatorView,
            _callable: TaggedScopedPtr<'guard>,
            args: &[TaggedScopedPtr<'guard>],
        ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
            assert!(args.len() == 1);
            assert!(matches!(*args[0], Value::WeakRef(_)));

            self.calls.set(self.calls.get() + 1);

            if self.fail {
                crate::error::err_eval("finalizer raised")
            } else {
                Ok(mem.none())
            }
        }

        fn step<'guard>(
            &self,
            _mem: &'guard MutatorView,
            _gen: ScopedPtr<'guard, Generator>,
            _entry: Entry<'guard>,
        ) -> Result<Outcome<'guard>, RuntimeError> {
            unreachable!("finalizers never step generators")
        }
    }

    #[test]
    fn weakref_roundtrip_and_clear() {
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
                let target = mem.lookup_sym("target");
                let weak = WeakRef::alloc(mem, target, mem.none())?;

                assert!(!weak.is_cleared());
                assert!(weak.get(mem)? == target);

                assert!(weak.clear() == ClearStatus::Cleared);
                assert!(weak.is_cleared());
                assert!(matches!(*weak.get(mem)?, Value::None));

                // clearing again reports the link was already empty
                assert!(weak.clear() == ClearStatus::AlreadyEmpty);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn weakref_redirect() {
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
                let first = mem.lookup_sym("first");
                let second = mem.lookup_sym("second");

                let weak = WeakRef::alloc(mem, first, mem.none())?;
                weak.redirect(second);
                assert!(weak.get(mem)? == second);

                // a cleared link stays cleared until redirected again
                weak.clear();
                weak.redirect(first);
                assert!(weak.get(mem)? == first);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn reader_retries_through_interleaved_write() {
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
                let first = mem.lookup_sym("first");
                let second = mem.lookup_sym("second");

                let weak = WeakRef::alloc(mem, first, mem.none())?;

                // a write lands inside the first read window; the reader
                // must retry and return the post-write value, never a mix
                let fired = Cell::new(false);
                let value = weak.get_with_probe(mem, || {
                    if !fired.get() {
                        fired.set(true);
                        weak.redirect(second);
                    }
                })?;

                assert!(value == second);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn reader_gives_up_after_bounded_retries() {
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
                let target = mem.lookup_sym("target");
                let weak = WeakRef::alloc(mem, target, mem.none())?;

                // every read window is invalidated by a fresh write
                match weak.get_with_probe(mem, || weak.redirect(target)) {
                    Ok(_) => panic!("reader should have given up"),
                    Err(e) => assert!(*e.error_kind() == ErrorKind::WeakUnavailable),
                }

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn finalizer_runs_at_most_once() {
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
                let target = mem.lookup_sym("target");
                let callback = mem.lookup_sym("callback");

                let weak = WeakRef::alloc(mem, target, callback)?;
                let recorder = Recorder::new(false);

                assert!(run_finalizer(mem, &recorder, weak)? == ClearStatus::Cleared);
                assert!(recorder.calls.get() == 1);
                assert!(weak.is_cleared());

                // already cleared, so the callback does not fire again
                assert!(run_finalizer(mem, &recorder, weak)? == ClearStatus::AlreadyEmpty);
                assert!(recorder.calls.get() == 1);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn failed_finalizer_still_clears_link() {
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
                let target = mem.lookup_sym("target");
                let callback = mem.lookup_sym("callback");

                let weak = WeakRef::alloc(mem, target, callback)?;
                let recorder = Recorder::new(true);

                // the error is logged, not propagated
                assert!(run_finalizer(mem, &recorder, weak)? == ClearStatus::Cleared);
                assert!(recorder.calls.get() == 1);
                assert!(weak.is_cleared());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn redirecting_finalizer_is_still_cleared() {
        let mem = Memory::new();

        // Executor double whose finalizer points the link at a new target
        struct Redirector {}

        impl Executor for Redirector {
            fn call<'guard>(
                &self,
                mem: &'guard MutatorView,
                _callable: TaggedScopedPtr<'guard>,
                args: &[TaggedScopedPtr<'guard>],
            ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
                match *args[0] {
                    Value::WeakRef(weak) => weak.redirect(mem.lookup_sym("replacement")),
                    _ => panic!("expected the weak reference as the sole argument"),
                }
                Ok(mem.none())
            }

            fn step<'guard>(
                &self,
                _mem: &'guard MutatorView,
                _gen: ScopedPtr<'guard, Generator>,
                _entry: Entry<'guard>,
            ) -> Result<Outcome<'guard>, RuntimeError> {
                unreachable!("finalizers never step generators")
            }
        }

        struct Test {}
        impl Mutator for Test {
            type Input = ();
            type Output = ();

            fn run(
                &self,
                mem: &MutatorView,
                _input: Self::Input,
            ) -> Result<Self::Output, RuntimeError> {
                let target = mem.lookup_sym("target");
                let callback = mem.lookup_sym("callback");
                let weak = WeakRef::alloc(mem, target, callback)?;

                // the redirect does not re-register the link; teardown
                // empties it whatever the finalizer wrote
                assert!(run_finalizer(mem, &Redirector {}, weak)? == ClearStatus::Cleared);
                assert!(weak.is_cleared());
                assert!(matches!(*weak.get(mem)?, Value::None));

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn no_callback_clears_without_calling() {
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
                let target = mem.lookup_sym("target");
                let weak = WeakRef::alloc(mem, target, mem.none())?;
                let recorder = Recorder::new(false);

                assert!(run_finalizer(mem, &recorder, weak)? == ClearStatus::Cleared);
                assert!(recorder.calls.get() == 0);
                assert!(weak.is_cleared());

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn reachable_target_survives_teardown() {
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
                use super::finalize_unreachable;

                let target = mem.lookup_sym("target");
                let callback = mem.lookup_sym("callback");
                let weak = WeakRef::alloc(mem, target, callback)?;
                let recorder = Recorder::new(false);

                finalize_unreachable(mem, &recorder, weak, |_| true)?;
                assert!(!weak.is_cleared());
                assert!(recorder.calls.get() == 0);

                finalize_unreachable(mem, &recorder, weak, |_| false)?;
                assert!(weak.is_cleared());
                assert!(recorder.calls.get() == 1);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }

    #[test]
    fn instance_finalize_attr_is_used() {
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
                use crate::class::{Class, Instance};

                let class = Class::alloc(mem, "Resource")?;
                class.set_attr(mem, mem.lookup_sym("finalize"), mem.lookup_sym("close"))?;

                let instance = Instance::alloc(mem, class)?;
                let weak = WeakRef::alloc(mem, instance.as_tagged(mem), mem.none())?;

                let recorder = Recorder::new(false);
                assert!(run_finalizer(mem, &recorder, weak)? == ClearStatus::Cleared);
                assert!(recorder.calls.get() == 1);

                Ok(())
            }
        }

        let test = Test {};
        mem.mutate(&test, ()).unwrap();
    }
}
