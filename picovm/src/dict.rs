/// Basic mutable dict type, an open-addressing hash table
use std::cell::Cell;
use std::fmt;
use std::hash::Hasher;

use fnv::FnvHasher;

use crate::containers::{Container, HashIndexedAnyContainer};
use crate::error::{ErrorKind, RuntimeError};
use crate::hashable::Hashable;
use crate::memory::MutatorView;
use crate::printer::Print;
use crate::rawarray::{default_array_growth, ArraySize, RawArray};
use crate::safeptr::{MutatorScope, ScopedPtr, TaggedCellPtr, TaggedScopedPtr};
use crate::taggedptr::Value;

// max load factor before resizing the table
const LOAD_FACTOR: f32 = 0.80;
const TOMBSTONE: u64 = 1;

/// Internal entry representation, keeping copy of hash for the key
#[derive(Clone)]
pub struct DictItem {
    key: TaggedCellPtr,
    value: TaggedCellPtr,
    hash: u64,
}

impl DictItem {
    fn blank() -> DictItem {
        DictItem {
            key: TaggedCellPtr::new_none(),
            value: TaggedCellPtr::new_none(),
            hash: 0,
        }
    }
}

/// Generate a hash value for a key. Identity-valued keys hash from their
/// word; interned symbols and text hash their contents.
pub fn hash_key<'guard>(
    guard: &'guard dyn MutatorScope,
    key: TaggedScopedPtr<'guard>,
) -> Result<u64, RuntimeError> {
    match *key {
        Value::Symbol(s) => {
            let mut hasher = FnvHasher::default();
            s.hash(guard, &mut hasher);
            Ok(hasher.finish())
        }
        Value::Text(t) => {
            let mut hasher = FnvHasher::default();
            t.hash(guard, &mut hasher);
            Ok(hasher.finish())
        }
        Value::Int(n) => Ok(n as u64),
        Value::Bool(b) => Ok(b as u64 + 2),
        _ => Err(RuntimeError::new(ErrorKind::UnhashableError)),
    }
}

/// Given a key, generate the hash and search for an entry that either matches this hash
/// or the next available blank entry.
fn find_entry<'guard>(
    _guard: &'guard dyn MutatorScope,
    data: &RawArray<DictItem>,
    hash: u64,
) -> Result<&'guard mut DictItem, RuntimeError> {
    // get raw pointer to base of array
    let ptr = data
        .as_ptr()
        .ok_or(RuntimeError::new(ErrorKind::BoundsError))?;

    // calculate the starting index into `data` to begin scanning at
    let mut index = (hash % data.capacity() as u64) as ArraySize;

    // the first tombstone we find will be saved here
    let mut tombstone: Option<&mut DictItem> = None;

    loop {
        let entry = unsafe { &mut *(ptr.offset(index as isize) as *mut DictItem) as &mut DictItem };

        if entry.hash == TOMBSTONE && entry.key.is_none() {
            // this is a tombstone: save the first tombstone reference we find
            if tombstone.is_none() {
                tombstone = Some(entry);
            }
        } else if entry.hash == hash {
            // this is an exact match slot
            return Ok(entry);
        } else if entry.key.is_none() {
            // this is a non-tombstone empty slot
            if let Some(earlier_entry) = tombstone {
                // if we recorded a tombstone, return _that_ slot to be reused
                return Ok(earlier_entry);
            } else {
                return Ok(entry);
            }
        }

        // increment the index, wrapping back to 0 when we get to the end of the array
        index = (index + 1) % data.capacity();
    }
}

/// Reset all slots to a blank entry
fn fill_with_blank_entries<'guard>(
    _guard: &'guard dyn MutatorScope,
    data: &RawArray<DictItem>,
) -> Result<(), RuntimeError> {
    let ptr = data
        .as_ptr()
        .ok_or(RuntimeError::new(ErrorKind::BoundsError))?;

    let blank_entry = DictItem::blank();

    for index in 0..data.capacity() {
        let entry = unsafe { &mut *(ptr.offset(index as isize) as *mut DictItem) as &mut DictItem };
        *entry = blank_entry.clone();
    }

    Ok(())
}

/// Returns true if the dict has reached it's defined load factor and needs to be resized before
/// inserting a new entry.
fn needs_to_grow(used_entries: ArraySize, capacity: ArraySize) -> bool {
    let ratio = (used_entries as f32) / (capacity as f32);
    ratio > LOAD_FACTOR
}

/// A mutable Dict key/value associative data structure.
pub struct Dict {
    /// Number of items stored
    length: Cell<ArraySize>,
    /// Total count of items plus tombstones
    used_entries: Cell<ArraySize>,
    /// Backing array for key/value entries
    data: Cell<RawArray<DictItem>>,
}

impl Dict {
    /// Allocate a new instance on the heap
    pub fn alloc<'guard>(
        mem: &'guard MutatorView,
    ) -> Result<ScopedPtr<'guard, Dict>, RuntimeError> {
        mem.alloc(Dict::new())
    }

    /// Allocate a new instance on the heap with pre-allocated capacity
    pub fn alloc_with_capacity<'guard>(
        mem: &'guard MutatorView,
        capacity: ArraySize,
    ) -> Result<ScopedPtr<'guard, Dict>, RuntimeError> {
        mem.alloc(Dict::with_capacity(mem, capacity)?)
    }

    /// Call the given function once per live key/value association
    pub fn each_entry<'guard, F>(
        &self,
        _guard: &'guard dyn MutatorScope,
        mut f: F,
    ) -> Result<(), RuntimeError>
    where
        F: FnMut(&TaggedCellPtr, &TaggedCellPtr),
    {
        let data = self.data.get();

        let ptr = match data.as_ptr() {
            Some(ptr) => ptr,
            None => return Ok(()),
        };

        for index in 0..data.capacity() {
            let entry = unsafe { &*(ptr.offset(index as isize)) };
            if !entry.key.is_none() {
                f(&entry.key, &entry.value);
            }
        }

        Ok(())
    }

    /// Scale capacity up if needed
    fn grow_capacity<'guard>(&self, mem: &'guard MutatorView) -> Result<(), RuntimeError> {
        let data = self.data.get();

        let new_capacity = default_array_growth(data.capacity())?;
        let new_data = RawArray::<DictItem>::with_capacity(mem, new_capacity)?;
        fill_with_blank_entries(mem, &new_data)?;

        let maybe_ptr = data.as_ptr();
        if let Some(ptr) = maybe_ptr {
            for index in 0..data.capacity() {
                let entry =
                    unsafe { &mut *(ptr.offset(index as isize) as *mut DictItem) as &mut DictItem };
                if !entry.key.is_none() {
                    let new_entry = find_entry(mem, &new_data, entry.hash)?;
                    *new_entry = entry.clone();
                }
            }
        }

        self.data.set(new_data);
        Ok(())
    }
}

impl Container<DictItem> for Dict {
    fn new() -> Dict {
        Dict {
            length: Cell::new(0),
            used_entries: Cell::new(0),
            data: Cell::new(RawArray::new()),
        }
    }

    fn with_capacity<'guard>(
        mem: &'guard MutatorView,
        capacity: ArraySize,
    ) -> Result<Self, RuntimeError> {
        let dict = Dict {
            length: Cell::new(0),
            used_entries: Cell::new(0),
            data: Cell::new(RawArray::with_capacity(mem, capacity)?),
        };

        let data = dict.data.get();
        fill_with_blank_entries(mem, &data)?;

        Ok(dict)
    }

    fn clear<'guard>(&self, mem: &'guard MutatorView) -> Result<(), RuntimeError> {
        let data = self.data.get();
        fill_with_blank_entries(mem, &data)?;
        self.length.set(0);
        self.used_entries.set(0);
        Ok(())
    }

    fn length(&self) -> ArraySize {
        self.length.get()
    }
}

/// Hashable-indexed interface. Objects used as keys must implement Hashable.
impl HashIndexedAnyContainer for Dict {
    fn lookup<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        key: TaggedScopedPtr,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        let hash = hash_key(guard, key)?;
        let data = self.data.get();

        // no backing store has been allocated yet, so no key can be present
        if data.capacity() == 0 {
            return Err(RuntimeError::new(ErrorKind::KeyError));
        }

        let entry = find_entry(guard, &data, hash)?;

        if !entry.key.is_none() {
            Ok(entry.value.get(guard))
        } else {
            Err(RuntimeError::new(ErrorKind::KeyError))
        }
    }

    fn assoc<'guard>(
        &self,
        mem: &'guard MutatorView,
        key: TaggedScopedPtr<'guard>,
        value: TaggedScopedPtr<'guard>,
    ) -> Result<(), RuntimeError> {
        let hash = hash_key(mem, key)?;

        let mut data = self.data.get();
        // check the load factor (what percentage of the capacity is or has been used)
        if needs_to_grow(self.used_entries.get() + 1, data.capacity()) {
            // create a new, larger, backing array, and copy all existing entries over
            self.grow_capacity(mem)?;
            data = self.data.get();
        }

        // find the slot whose entry matches the hash or is the nearest available entry
        let entry = find_entry(mem, &data, hash)?;

        // update counters if necessary
        if entry.key.is_none() {
            // if `key` is empty, this entry is unused: increment the length
            self.length.set(self.length.get() + 1);
            if entry.hash == 0 {
                // if `hash` is 0, this entry has _never_ been used: increment the count
                // of used entries
                self.used_entries.set(self.used_entries.get() + 1);
            }
        }

        // finally, write the key, value and hash to the entry
        entry.key.set(key);
        entry.value.set(value);
        entry.hash = hash;

        Ok(())
    }

    fn dissoc<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        key: TaggedScopedPtr,
    ) -> Result<TaggedScopedPtr<'guard>, RuntimeError> {
        let hash = hash_key(guard, key)?;

        let data = self.data.get();
        if data.capacity() == 0 {
            return Err(RuntimeError::new(ErrorKind::KeyError));
        }

        let entry = find_entry(guard, &data, hash)?;

        if entry.key.is_none() {
            // an empty key means the key was not found in the Dict
            return Err(RuntimeError::new(ErrorKind::KeyError));
        }

        // decrement the length but not the `used_entries` count
        self.length.set(self.length.get() - 1);

        // write the "tombstone" markers to the entry
        entry.key.set_to_none();
        entry.hash = TOMBSTONE;

        // return the value that was associated with the key
        Ok(entry.value.get(guard))
    }

    fn exists<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        key: TaggedScopedPtr,
    ) -> Result<bool, RuntimeError> {
        let hash = hash_key(guard, key)?;
        let data = self.data.get();
        if data.capacity() == 0 {
            return Ok(false);
        }

        let entry = find_entry(guard, &data, hash)?;
        Ok(!entry.key.is_none())
    }
}

impl Print for Dict {
    fn print<'guard>(
        &self,
        guard: &'guard dyn MutatorScope,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        write!(f, "{{")?;

        let mut first = true;
        let result = self.each_entry(guard, |key, value| {
            if !first {
                let _ = write!(f, ", ");
            }
            first = false;
            let _ = write!(f, "{}: {}", key.get(guard).value(), value.get(guard).value());
        });

        result.map_err(|_| fmt::Error)?;
        write!(f, "}}")
    }
}
