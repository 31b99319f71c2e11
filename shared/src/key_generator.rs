use std::marker::PhantomData;

use crate::Key;

/// Hands out unique, increasing keys. Each owner of a key space holds its
/// own generator; there is no process-wide counter.
pub struct KeyGenerator<K: Key> {
    next: u64,
    phantom_k: PhantomData<K>,
}

impl<K: Key> KeyGenerator<K> {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: first,
            phantom_k: PhantomData,
        }
    }

    /// Get a new, unused key
    pub fn generate(&mut self) -> K {
        let key = K::from_u64(self.next);
        self.next = self.next.wrapping_add(1);
        key
    }

    /// Returns the key that the next call to `generate` will produce
    pub fn peek(&self) -> K {
        K::from_u64(self.next)
    }
}

impl<K: Key> Default for KeyGenerator<K> {
    fn default() -> Self {
        Self::new()
    }
}
