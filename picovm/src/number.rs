/// Integer representation: inline small ints with transparent promotion to
/// heap-allocated arbitrary-precision integers when a value leaves the
/// inline range.
use std::convert::TryFrom;
use std::fmt;

use num::bigint::BigInt;
use num::ToPrimitive;

use crate::error::{err_type, RuntimeError};
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::safeptr::{MutatorScope, TaggedScopedPtr};
use crate::taggedptr::Value;

/// One bit of an isize is given up to the inline integer tag
pub const SMALL_INT_MAX: isize = isize::MAX >> 1;
pub const SMALL_INT_MIN: isize = isize::MIN >> 1;

/// True if the value can be packed into a tagged word
pub fn fits_small_int(value: isize) -> bool {
    value >= SMALL_INT_MIN && value <= SMALL_INT_MAX
}

/// A heap-allocated arbitrary-precision integer
pub struct BigNum {
    value: BigInt,
}

impl BigNum {
    pub fn new(value: BigInt) -> BigNum {
        BigNum { value }
    }

    pub fn value(&self) -> &BigInt {
        &self.value
    }
}

impl Print for BigNum {
    fn print<'guard>(
        &self,
        _guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Make an integer value, inline if it fits, heap-allocated otherwise
pub fn new_int<'guard>(
    mem: &'guard MutatorView,
    value: isize,
) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
    if fits_small_int(value) {
        Ok(mem.number(value))
    } else {
        mem.alloc_tagged(BigNum::new(BigInt::from(value)))
    }
}

/// Make an integer value from a wide intermediate result, promoting to a
/// heap BigNum when it does not fit the inline range
pub fn from_i128<'guard>(
    mem: &'guard MutatorView,
    value: i128,
) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
    match isize::try_from(value) {
        Ok(small) if fits_small_int(small) => Ok(mem.number(small)),
        _ => mem.alloc_tagged(BigNum::new(BigInt::from(value))),
    }
}

/// Make an integer value from a BigInt, demoting to an inline integer when
/// the value fits. Keeping the inline form canonical preserves identity
/// equality for equal small integers.
pub fn from_bigint<'guard>(
    mem: &'guard MutatorView,
    value: BigInt,
) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
    match value.to_isize() {
        Some(small) if fits_small_int(small) => Ok(mem.number(small)),
        _ => mem.alloc_tagged(BigNum::new(value)),
    }
}

/// View any integer value as a BigInt for a wide operation
fn as_bigint<'guard>(
    _guard: &'guard MutatorView,
    value: &Value<'guard>,
) -> Result<BigInt, RuntimeError> {
    match value {
        Value::Int(n) => Ok(BigInt::from(*n)),
        Value::BigNum(n) => Ok(n.value().clone()),
        other => err_type(&format!("cannot use {} as an integer", other.kind_name())),
    }
}

/// Add two integer values, promoting the result as needed
pub fn int_add<'guard>(
    mem: &'guard MutatorView,
    lhs: TaggedScopedPtr<'guard>,
    rhs: TaggedScopedPtr<'guard>,
) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
    // fast path, both inline and the sum still fits
    if let (Value::Int(a), Value::Int(b)) = (*lhs, *rhs) {
        if let Some(sum) = a.checked_add(b) {
            if fits_small_int(sum) {
                return Ok(mem.number(sum));
            }
        }
    }

    let sum = as_bigint(mem, &lhs)? + as_bigint(mem, &rhs)?;
    from_bigint(mem, sum)
}

/// Multiply two integer values, promoting the result as needed
pub fn int_mul<'guard>(
    mem: &'guard MutatorView,
    lhs: TaggedScopedPtr<'guard>,
    rhs: TaggedScopedPtr<'guard>,
) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (*lhs, *rhs) {
        if let Some(product) = a.checked_mul(b) {
            if fits_small_int(product) {
                return Ok(mem.number(product));
            }
        }
    }

    let product = as_bigint(mem, &lhs)? * as_bigint(mem, &rhs)?;
    from_bigint(mem, product)
}
