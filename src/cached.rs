//! A small memoization cell used to lazily compute and remember a value
//! derived from an otherwise-immutable struct (e.g. a transaction's
//! entry hash).

/// An `Option` that holds a lazily-computed value.
///
/// Unlike a general-purpose memoization cell this does not offer interior
/// mutability: callers compute the value once and store it with
/// [`Cached::from`], then read it back with [`Cached::value`].
#[derive(Clone, Copy, Eq)]
pub struct Cached<T: Clone + Copy>(Option<T>);

impl<T: Clone + Copy> Cached<T> {
    pub fn new() -> Cached<T> {
        Cached(None)
    }

    pub fn from(val: T) -> Cached<T> {
        Cached(Some(val))
    }

    pub fn value(&self) -> Option<T> {
        self.0
    }

    pub fn has_value(&self) -> bool {
        self.0.is_some()
    }
}

impl<T: Clone + Copy> Default for Cached<T> {
    fn default() -> Self {
        Cached::new()
    }
}

/// Returns false only if both sides have a value and the values differ.
///
/// An empty cache compares equal to anything, so two otherwise-identical
/// values don't stop being equal just because one of them hasn't computed
/// its cache yet.
impl<T: PartialEq + Copy> PartialEq for Cached<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl<T: Clone + Copy + std::fmt::Debug> std::fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
