/// Runtime error type for all object-model operations.
use std::fmt;
use std::io;

use bumpalloc::AllocError;

/// Exhaustive set of failure categories surfaced by the object model
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    IOError(String),
    TypeError(String),
    EvalError(String),
    BadAllocationRequest,
    OutOfMemory,
    BoundsError,
    KeyError,
    UnhashableError,
    MutableBorrowError,
    WeakUnavailable,
    GeneratorExhausted,
    GeneratorRunning,
}

/// An error type to be used by the whole runtime
#[derive(Debug, PartialEq)]
pub struct RuntimeError {
    kind: ErrorKind,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind) -> RuntimeError {
        RuntimeError { kind }
    }

    pub fn error_kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::IOError(ref reason) => write!(f, "IO Error: {}", reason),
            ErrorKind::TypeError(ref reason) => write!(f, "Type Error: {}", reason),
            ErrorKind::EvalError(ref reason) => write!(f, "Evaluation Error: {}", reason),
            ErrorKind::BadAllocationRequest => {
                write!(f, "An invalid block size was requested of the allocator")
            }
            ErrorKind::OutOfMemory => write!(f, "Out of memory!"),
            ErrorKind::BoundsError => write!(f, "Indexing bounds error"),
            ErrorKind::KeyError => write!(f, "Key does not exist in Dict"),
            ErrorKind::UnhashableError => write!(f, "Attempt to access Dict with unhashable key"),
            ErrorKind::MutableBorrowError => write!(
                f,
                "Attempt to modify a container that is already mutably borrowed"
            ),
            ErrorKind::WeakUnavailable => write!(
                f,
                "Weak reference target could not be read consistently"
            ),
            ErrorKind::GeneratorExhausted => write!(f, "Generator has already finished"),
            ErrorKind::GeneratorRunning => write!(f, "Generator is already executing"),
        }
    }
}

/// Convert from io::Error
impl From<io::Error> for RuntimeError {
    fn from(other: io::Error) -> RuntimeError {
        RuntimeError::new(ErrorKind::IOError(format!("{}", other)))
    }
}

/// Convert from AllocError
impl From<AllocError> for RuntimeError {
    fn from(other: AllocError) -> RuntimeError {
        match other {
            AllocError::OOM => RuntimeError::new(ErrorKind::OutOfMemory),
            _ => RuntimeError::new(ErrorKind::BadAllocationRequest),
        }
    }
}

/// Convenience shorthand for building a TypeError
pub fn err_type<T>(reason: &str) -> Result<T, RuntimeError> {
    Err(RuntimeError::new(ErrorKind::TypeError(String::from(
        reason,
    ))))
}

/// Convenience shorthand for building an EvalError
pub fn err_eval<T>(reason: &str) -> Result<T, RuntimeError> {
    Err(RuntimeError::new(ErrorKind::EvalError(String::from(
        reason,
    ))))
}
