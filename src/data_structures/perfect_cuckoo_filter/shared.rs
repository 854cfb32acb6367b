// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Thread-safe wrapper around [`PerfectCuckooFilter`].
//!
//! A single exclusive lock guards the whole table. A cascade may touch many
//! buckets in sequence, so a coarse lock is the simplest way to keep every
//! bucket at or under its capacity while inserts race. The eviction generator
//! lives inside the table and is only used under the lock.

use parking_lot::Mutex;

use crate::data_structures::perfect_cuckoo_filter::config::CuckooFilterConfig;
use crate::data_structures::perfect_cuckoo_filter::error::Result;
use crate::data_structures::perfect_cuckoo_filter::table::{FilterStats, PerfectCuckooFilter, Placement};

/// A [`PerfectCuckooFilter`] that can be shared between threads.
#[derive(Debug)]
pub struct SharedCuckooFilter<V> {
    inner: Mutex<PerfectCuckooFilter<V>>,
}

impl<V: Clone> SharedCuckooFilter<V> {
    /// Creates a shared table with the given configuration.
    pub fn with_config(config: CuckooFilterConfig) -> Result<Self> {
        Ok(Self::from_filter(PerfectCuckooFilter::with_config(config)?))
    }

    /// Wraps an existing table.
    pub fn from_filter(filter: PerfectCuckooFilter<V>) -> Self {
        Self {
            inner: Mutex::new(filter),
        }
    }

    /// See [`PerfectCuckooFilter::insert`].
    pub fn insert<K: AsRef<[u8]> + ?Sized>(&self, key: &K, value: V) -> Result<Placement> {
        self.inner.lock().insert(key, value)
    }

    /// Returns a clone of the payload stored for `key`.
    pub fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    /// See [`PerfectCuckooFilter::contains`].
    pub fn contains<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// See [`PerfectCuckooFilter::delete`].
    pub fn delete<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.inner.lock().delete(key)
    }

    /// Number of entries stored.
    pub fn count(&self) -> usize {
        self.inner.lock().count()
    }

    /// Fraction of capacity in use.
    pub fn load_factor(&self) -> f64 {
        self.inner.lock().load_factor()
    }

    /// See [`PerfectCuckooFilter::stats`].
    pub fn stats(&self) -> FilterStats {
        self.inner.lock().stats()
    }

    /// Unwraps the table.
    pub fn into_inner(self) -> PerfectCuckooFilter<V> {
        self.inner.into_inner()
    }
}
