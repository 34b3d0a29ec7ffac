/// The seam between the object model and whatever executes compiled code.
/// The object model never interprets bytecode itself; callers hand in an
/// Executor and the model drives it for generator stepping and for calling
/// finalizer callbacks.
use crate::error::RuntimeError;
use crate::generator::Generator;
use crate::memory::MutatorView;
use crate::safeptr::{ScopedPtr, TaggedScopedPtr};

/// How a suspended activation is being entered
pub enum Entry<'guard> {
    /// First activation of the body
    Start,
    /// Re-entry at the suspension point, with the value the yield
    /// expression evaluates to
    Resume(TaggedScopedPtr<'guard>),
    /// Re-entry that unwinds the body, running any cleanup handlers on the
    /// way out
    Cancel,
}

/// How the activation left the body
pub enum Outcome<'guard> {
    /// Suspended at a yield with this value
    Yield(TaggedScopedPtr<'guard>),
    /// Ran to completion with this value
    Return(TaggedScopedPtr<'guard>),
    /// Terminated by raising this value
    Raise(TaggedScopedPtr<'guard>),
}

pub trait Executor {
    /// Call a callable object with the given arguments and run it to
    /// completion
    fn call<'guard>(
        &self,
        mem: &'guard MutatorView,
        callable: TaggedScopedPtr<'guard>,
        args: &[TaggedScopedPtr<'guard>],
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError>;

    /// Run one activation of a generator body, from its current suspension
    /// point to the next yield, return or raise
    fn step<'guard>(
        &self,
        mem: &'guard MutatorView,
        gen: ScopedPtr<'guard, Generator>,
        entry: Entry<'guard>,
    ) -> Result<Outcome<'guard>, RuntimeError>;
}
