// Copyright (c) 2025 Perfect Cuckoo Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bucket table of the Perfect Cuckoo Filter.
//!
//! Every key has exactly two legal homes: its primary bucket and the
//! alternate bucket reached through the fingerprint mix. Lookups scan those two
//! buckets and nothing else, so any relocation must keep an entry inside its
//! own pair of homes and keep its selector naming the one it occupies.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::data_structures::perfect_cuckoo_filter::bucket::{Bucket, Entry, Selector};
use crate::data_structures::perfect_cuckoo_filter::config::{CuckooFilterConfig, FailurePolicy};
use crate::data_structures::perfect_cuckoo_filter::digest::{Digest, KeyDigester};
use crate::data_structures::perfect_cuckoo_filter::error::{FilterError, Result};

/// Where a successful insert put the new entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stored in the primary bucket.
    Primary,
    /// Stored in the alternate bucket without displacing anything.
    Alternate,
    /// Stored in the alternate bucket after an eviction cascade.
    Relocated {
        /// Number of entries displaced along the way
        relocations: usize,
    },
}

/// Occupancy snapshot produced by a full table scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Entries stored
    pub count: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// `count / capacity`
    pub load_factor: f64,
    /// Entries sitting in their primary bucket
    pub primary_count: usize,
    /// Entries sitting in their alternate bucket
    pub alternate_count: usize,
    /// Buckets holding no entry
    pub empty_buckets: usize,
    /// Number of buckets
    pub num_buckets: usize,
}

impl FilterStats {
    /// Share of buckets that are empty.
    pub fn empty_bucket_ratio(&self) -> f64 {
        if self.num_buckets == 0 {
            0.0
        } else {
            self.empty_buckets as f64 / self.num_buckets as f64
        }
    }
}

/// A fixed-capacity cuckoo filter that stores a payload per fingerprint.
///
/// The key is never stored. Two keys whose digests agree on bucket and
/// fingerprint are indistinguishable: the second insert is rejected as a
/// duplicate and a lookup of either returns the first one's payload.
///
/// # Type Parameters
///
/// * `V` - The payload type.
///
/// # Examples
///
/// ```
/// use perfect_cuckoo_lib::data_structures::perfect_cuckoo_filter::{
///     CuckooFilterConfig, PerfectCuckooFilter,
/// };
///
/// let config = CuckooFilterConfig::new().with_num_buckets(1 << 10).with_seed(7);
/// let mut filter = PerfectCuckooFilter::with_config(config).unwrap();
///
/// filter.insert("txid:0", 50_000u64).unwrap();
/// assert_eq!(filter.get("txid:0"), Some(&50_000));
/// assert!(filter.delete("txid:0"));
/// assert_eq!(filter.get("txid:0"), None);
/// ```
#[derive(Debug)]
pub struct PerfectCuckooFilter<V> {
    buckets: Vec<Bucket<V>>,
    digester: KeyDigester,
    config: CuckooFilterConfig,
    /// Picks eviction victims. Owned per table so runs are reproducible under
    /// a fixed seed.
    rng: StdRng,
    item_count: usize,
}

impl<V> PerfectCuckooFilter<V> {
    /// Creates a table with the default geometry (2^19 buckets of 4 entries,
    /// 13-bit fingerprints).
    pub fn new() -> Self {
        // The default configuration always validates.
        Self::build(CuckooFilterConfig::default())
    }

    /// Creates a table with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidConfiguration`] if the configuration does
    /// not validate.
    pub fn with_config(config: CuckooFilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CuckooFilterConfig) -> Self {
        let buckets = (0..config.num_buckets)
            .map(|_| Bucket::with_capacity(config.bucket_size))
            .collect();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            buckets,
            digester: KeyDigester::new(config.bucket_bits(), config.fingerprint_bits),
            config,
            rng,
            item_count: 0,
        }
    }

    /// The configuration this table was built with.
    pub fn config(&self) -> &CuckooFilterConfig {
        &self.config
    }

    /// The digester used to place keys.
    pub fn digester(&self) -> &KeyDigester {
        &self.digester
    }

    /// Primary bucket and fingerprint of `key` under this table's geometry.
    pub fn digest<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Digest {
        self.digester.digest(key.as_ref())
    }

    /// Number of entries stored.
    pub fn count(&self) -> usize {
        self.item_count
    }

    /// Alias of [`count`](Self::count).
    pub fn len(&self) -> usize {
        self.item_count
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Maximum number of entries, `num_buckets * bucket_size`.
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Fraction of capacity in use, in `[0, 1]`.
    pub fn load_factor(&self) -> f64 {
        self.item_count as f64 / self.capacity() as f64
    }

    /// Number of entries in each bucket, in bucket order.
    pub fn bucket_occupancy(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(Bucket::len)
    }

    /// Inserts `value` under `key`.
    ///
    /// # Errors
    ///
    /// * [`FilterError::Duplicate`] if the key's fingerprint already occupies
    ///   its slot. Nothing changes.
    /// * [`FilterError::RelocationLimitExceeded`] if both homes are full and
    ///   no free slot was reached within `max_relocations` evictions.
    /// * [`FilterError::BucketOutOfRange`] if the key hashes outside a table
    ///   whose bucket count is not a power of two.
    pub fn insert<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K, value: V) -> Result<Placement> {
        let (digest, alt_bucket) = self.locate(key.as_ref())?;
        let Digest {
            bucket,
            fingerprint,
        } = digest;

        if self.buckets[bucket as usize]
            .position(fingerprint, Selector::Primary)
            .is_some()
            || self.buckets[alt_bucket as usize]
                .position(fingerprint, Selector::Alternate)
                .is_some()
        {
            debug!(fingerprint, bucket, "Fingerprint already present, insert rejected");
            return Err(FilterError::Duplicate {
                fingerprint,
                bucket,
            });
        }

        let capacity = self.config.bucket_size;
        if self.buckets[bucket as usize].has_room(capacity) {
            self.buckets[bucket as usize].push(Entry::new(fingerprint, Selector::Primary, value));
            self.item_count += 1;
            return Ok(Placement::Primary);
        }
        if self.buckets[alt_bucket as usize].has_room(capacity) {
            self.buckets[alt_bucket as usize].push(Entry::new(
                fingerprint,
                Selector::Alternate,
                value,
            ));
            self.item_count += 1;
            return Ok(Placement::Alternate);
        }

        let relocations =
            self.relocate(alt_bucket, Entry::new(fingerprint, Selector::Alternate, value))?;
        self.item_count += 1;
        Ok(Placement::Relocated { relocations })
    }

    /// Eviction cascade. Carries `entry` into `target`, displacing a random
    /// occupant whenever the target is full and moving the victim to its
    /// other home, until a free slot is found or the cap is hit.
    ///
    /// Returns the number of evictions performed.
    fn relocate(&mut self, target: u32, entry: Entry<V>) -> Result<usize> {
        let capacity = self.config.bucket_size;
        let max_relocations = self.config.max_relocations;
        let num_buckets = self.buckets.len();

        // (bucket, slot) of every swap, for rollback
        let mut journal: Vec<(u32, usize)> = Vec::new();
        let mut in_hand = entry;
        let mut bucket = target;

        let failure = loop {
            let Some(slots) = self.buckets.get_mut(bucket as usize) else {
                break FilterError::BucketOutOfRange {
                    index: bucket,
                    num_buckets,
                };
            };
            if slots.has_room(capacity) {
                slots.push(in_hand);
                trace!(relocations = journal.len(), bucket, "Cascade placed entry");
                return Ok(journal.len());
            }
            if journal.len() >= max_relocations {
                break FilterError::RelocationLimitExceeded { max_relocations };
            }

            let slot = self.rng.gen_range(0..slots.len());
            let victim = slots.swap(slot, in_hand);
            journal.push((bucket, slot));

            bucket = self.digester.alt_bucket(bucket, victim.fingerprint);
            in_hand = Entry::new(victim.fingerprint, victim.selector.flip(), victim.payload);
        };

        warn!(
            fingerprint = in_hand.fingerprint,
            relocations = journal.len(),
            policy = ?self.config.failure_policy,
            error = %failure,
            "Eviction cascade failed"
        );

        match self.config.failure_policy {
            FailurePolicy::Rollback => {
                for (bucket, slot) in journal.into_iter().rev() {
                    let restored =
                        Entry::new(in_hand.fingerprint, in_hand.selector.flip(), in_hand.payload);
                    in_hand = self.buckets[bucket as usize].swap(slot, restored);
                }
                // `in_hand` is now the rejected new entry.
            }
            FailurePolicy::LeaveDisplaced => {
                // The new entry stays wherever it landed and the entry in hand
                // is lost, so the stored count is unchanged either way.
            }
        }
        Err(failure)
    }

    /// Returns the payload stored for `key`, if any.
    ///
    /// A hit only proves that an entry with the same fingerprint sits in the
    /// matching slot; it may belong to a colliding key.
    pub fn get<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> Option<&V> {
        let (digest, alt_bucket) = self.locate_or_warn(key.as_ref())?;
        self.buckets[digest.bucket as usize]
            .find(digest.fingerprint, Selector::Primary)
            .or_else(|| {
                self.buckets[alt_bucket as usize].find(digest.fingerprint, Selector::Alternate)
            })
    }

    /// Whether an entry matching `key` is present.
    pub fn contains<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes the entry matching `key`, returning whether one was removed.
    ///
    /// A colliding key's entry may be the one removed.
    pub fn delete<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Removes the entry matching `key` and returns its payload.
    pub fn remove<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) -> Option<V> {
        let (digest, alt_bucket) = self.locate_or_warn(key.as_ref())?;
        let Digest {
            bucket,
            fingerprint,
        } = digest;

        let (home, index) = match self.buckets[bucket as usize].position(fingerprint, Selector::Primary) {
            Some(index) => (bucket, index),
            None => {
                let Some(index) =
                    self.buckets[alt_bucket as usize].position(fingerprint, Selector::Alternate)
                else {
                    debug!(fingerprint, bucket, "No entry to delete");
                    return None;
                };
                (alt_bucket, index)
            }
        };

        self.item_count -= 1;
        Some(self.buckets[home as usize].remove(index).payload)
    }

    /// Removes every entry. Geometry and the eviction generator are kept.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(Bucket::clear);
        self.item_count = 0;
    }

    /// Scans the whole table and reports occupancy.
    pub fn stats(&self) -> FilterStats {
        let mut primary_count = 0;
        let mut alternate_count = 0;
        let mut empty_buckets = 0;

        for bucket in &self.buckets {
            if bucket.is_empty() {
                empty_buckets += 1;
            }
            for entry in bucket.iter() {
                match entry.selector {
                    Selector::Primary => primary_count += 1,
                    Selector::Alternate => alternate_count += 1,
                }
            }
        }

        let count = primary_count + alternate_count;
        debug_assert_eq!(count, self.item_count);
        FilterStats {
            count,
            capacity: self.capacity(),
            load_factor: count as f64 / self.capacity() as f64,
            primary_count,
            alternate_count,
            empty_buckets,
            num_buckets: self.buckets.len(),
        }
    }

    /// Digest and alternate bucket of `key`, both checked against the table.
    fn locate(&self, key: &[u8]) -> Result<(Digest, u32)> {
        let digest = self.digester.digest(key);
        let alt_bucket = self.digester.alt_bucket(digest.bucket, digest.fingerprint);
        let num_buckets = self.buckets.len();
        for index in [digest.bucket, alt_bucket] {
            if index as usize >= num_buckets {
                return Err(FilterError::BucketOutOfRange { index, num_buckets });
            }
        }
        Ok((digest, alt_bucket))
    }

    fn locate_or_warn(&self, key: &[u8]) -> Option<(Digest, u32)> {
        match self.locate(key) {
            Ok(located) => Some(located),
            Err(e) => {
                warn!(error = %e, "Key maps outside the table");
                None
            }
        }
    }
}

impl<V> Default for PerfectCuckooFilter<V> {
    fn default() -> Self {
        Self::new()
    }
}
