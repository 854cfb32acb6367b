// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Buckets and the entries they hold.

/// Which of its two homes an entry currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// The bucket derived directly from the key.
    Primary,
    /// The bucket reached through the alternate-bucket mix.
    Alternate,
}

impl Selector {
    /// The selector naming the other home of the same fingerprint.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Selector::Primary => Selector::Alternate,
            Selector::Alternate => Selector::Primary,
        }
    }

    /// `true` for [`Selector::Alternate`], matching the one-bit stored form.
    pub fn as_bit(self) -> bool {
        matches!(self, Selector::Alternate)
    }
}

/// One stored record. The key itself is never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// Fingerprint of the key that inserted this entry
    pub fingerprint: u32,
    /// Home the entry sits in
    pub selector: Selector,
    /// Stored value
    pub payload: V,
}

impl<V> Entry<V> {
    /// Creates a new entry.
    pub fn new(fingerprint: u32, selector: Selector, payload: V) -> Self {
        Self {
            fingerprint,
            selector,
            payload,
        }
    }

    #[inline]
    fn matches(&self, fingerprint: u32, selector: Selector) -> bool {
        self.fingerprint == fingerprint && self.selector == selector
    }
}

/// A fixed-capacity group of entries. Entry order carries no meaning.
#[derive(Debug, Clone)]
pub struct Bucket<V> {
    entries: Vec<Entry<V>>,
}

impl<V> Bucket<V> {
    /// Creates an empty bucket with room reserved for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bucket holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether another entry fits under `capacity`.
    #[inline]
    pub fn has_room(&self, capacity: usize) -> bool {
        self.entries.len() < capacity
    }

    /// Position of the entry with this fingerprint and selector.
    pub fn position(&self, fingerprint: u32, selector: Selector) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.matches(fingerprint, selector))
    }

    /// Payload of the entry with this fingerprint and selector.
    pub fn find(&self, fingerprint: u32, selector: Selector) -> Option<&V> {
        self.entries
            .iter()
            .find(|entry| entry.matches(fingerprint, selector))
            .map(|entry| &entry.payload)
    }

    /// Appends an entry. The caller checks [`Bucket::has_room`] first.
    pub fn push(&mut self, entry: Entry<V>) {
        self.entries.push(entry);
    }

    /// Replaces the entry at `index`, returning the previous occupant.
    pub fn swap(&mut self, index: usize, entry: Entry<V>) -> Entry<V> {
        std::mem::replace(&mut self.entries[index], entry)
    }

    /// Removes the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Entry<V> {
        self.entries.swap_remove(index)
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry<V>> {
        self.entries.iter()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_requires_matching_selector() {
        let mut bucket = Bucket::with_capacity(4);
        bucket.push(Entry::new(9, Selector::Primary, "p"));
        bucket.push(Entry::new(9, Selector::Alternate, "a"));

        assert_eq!(bucket.find(9, Selector::Primary), Some(&"p"));
        assert_eq!(bucket.find(9, Selector::Alternate), Some(&"a"));
        assert_eq!(bucket.find(8, Selector::Primary), None);
    }

    #[test]
    fn test_room_and_removal() {
        let mut bucket = Bucket::with_capacity(2);
        assert!(bucket.has_room(2));
        bucket.push(Entry::new(1, Selector::Primary, 10));
        bucket.push(Entry::new(2, Selector::Primary, 20));
        assert!(!bucket.has_room(2));

        let index = bucket.position(1, Selector::Primary).unwrap();
        assert_eq!(bucket.remove(index).payload, 10);
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.find(2, Selector::Primary), Some(&20));
    }

    #[test]
    fn test_swap_returns_previous() {
        let mut bucket = Bucket::with_capacity(1);
        bucket.push(Entry::new(1, Selector::Primary, 'x'));
        let old = bucket.swap(0, Entry::new(2, Selector::Alternate, 'y'));
        assert_eq!(old, Entry::new(1, Selector::Primary, 'x'));
        assert_eq!(bucket.find(2, Selector::Alternate), Some(&'y'));
    }

    #[test]
    fn test_selector_flip() {
        assert_eq!(Selector::Primary.flip(), Selector::Alternate);
        assert_eq!(Selector::Alternate.flip().flip(), Selector::Alternate);
        assert!(!Selector::Primary.as_bit());
    }
}
