use std::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use crossbeam::atomic::AtomicCell;

static NEXT_ID: AtomicCell<u64> = AtomicCell::new(1);

/// A process-unique identifier, typed by what it identifies so that ids of
/// different kinds cannot be mixed up.
///
/// Ids are handed out in increasing order and never reused while the
/// process runs. They are what room ids are derived from.
pub struct Id<T> {
    value: u64,
    kind: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new() -> Self {
        Self::from_value(NEXT_ID.fetch_add(1))
    }

    /// Wraps a raw value. Ids built this way are not guaranteed to be unique.
    pub fn from_value(value: u64) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }

    pub fn value(self) -> u64 {
        self.value
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.value)
    }
}
