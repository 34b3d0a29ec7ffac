/// Function and Closure object types. The code a Function carries is an
/// opaque object produced elsewhere; the object model only stores and
/// identifies it.
use std::fmt;

use itertools::join;

use crate::containers::{Container, SliceableContainer};
use crate::error::RuntimeError;
use crate::list::List;
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::safeptr::{CellPtr, MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};
use crate::taggedptr::Value;

/// A function object type
#[derive(Clone)]
pub struct Function {
    /// name could be a Symbol, or None if it is an anonymous fn
    name: TaggedCellPtr,
    /// Number of arguments required to activate the function
    arity: u8,
    /// The compiled body. Opaque to the object model.
    code: TaggedCellPtr,
    /// Param names are stored for introspection of a function signature
    param_names: CellPtr<List>,
    /// Calling a generator function builds a Generator instead of running
    /// the body
    generator: bool,
}

impl Function {
    /// Allocate a Function object on the heap
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        name: TaggedScopedPtr<'guard>,
        param_names: ScopedPtr<'guard, List>,
        code: TaggedScopedPtr<'guard>,
        generator: bool,
    ) -> Result<ScopedPtr<'guard, Function>, RuntimeError> {
        mem.alloc(Function {
            name: TaggedCellPtr::new_with(name),
            arity: param_names.length() as u8,
            code: TaggedCellPtr::new_with(code),
            param_names: CellPtr::new_with(param_names),
            generator,
        })
    }

    /// Return the Function's name as a string slice
    pub fn name<'guard>(&self, guard: &'guard dyn MutatorScope) -> &'guard str {
        let name = self.name.get(guard);
        match *name {
            Value::Symbol(s) => s.as_str(guard),
            _ => "<lambda>",
        }
    }

    /// Return the number of arguments the Function can take
    pub fn arity(&self) -> u8 {
        self.arity
    }

    /// Return the names of the parameters that the Function takes
    pub fn param_names<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, List> {
        self.param_names.get(guard)
    }

    /// Return the code object associated with the Function
    pub fn code<'guard>(&self, guard: &'guard dyn MutatorScope) -> TaggedScopedPtr<'guard> {
        self.code.get(guard)
    }

    /// Return true if calling this function builds a Generator
    pub fn is_generator(&self) -> bool {
        self.generator
    }

    /// The name slot, for the tracer
    pub fn name_cell(&self) -> &TaggedCellPtr {
        &self.name
    }

    /// The code slot, for the tracer
    pub fn code_cell(&self) -> &TaggedCellPtr {
        &self.code
    }
}

impl Print for Function {
    /// Prints a string representation of the function
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        let params = self.param_names.get(guard);

        let mut param_string = String::new();
        params.access_slice(guard, |items| {
            param_string = join(items.iter().map(|item| item.get(guard)), ", ")
        });

        write!(f, "<function {}({})>", self.name(guard), param_string)
    }
}

/// A closure: a function plus the shared cells for the nonlocal variables
/// its body refers to
#[derive(Clone)]
pub struct Closure {
    /// Function that will be activated when the closure is called
    func: CellPtr<Function>,
    /// Captured environment - a List of SharedCell values, in the order the
    /// compiled body refers to them
    cells: CellPtr<List>,
}

impl Closure {
    /// Allocate a Closure over the given function and captured cells
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
        function: ScopedPtr<'guard, Function>,
        cells: ScopedPtr<'guard, List>,
    ) -> Result<ScopedPtr<'guard, Closure>, RuntimeError> {
        mem.alloc(Closure {
            func: CellPtr::new_with(function),
            cells: CellPtr::new_with(cells),
        })
    }

    /// Return the Function object that the Closure will call
    pub fn function<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, Function> {
        self.func.get(guard)
    }

    /// Return the captured environment cells
    pub fn cells<'guard>(&self, guard: &'guard dyn MutatorScope) -> ScopedPtr<'guard, List> {
        self.cells.get(guard)
    }
}

impl Print for Closure {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "<closure {}>", self.func.get(guard).name(guard))
    }
}
