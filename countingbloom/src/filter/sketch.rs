// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::hash::Hash;
use std::hash::Hasher;

use super::CountingBloomFilterBuilder;
use super::DecrementPolicy;
use super::counters::MAX_COUNTER;
use super::counters::PackedCounters;
use crate::error::Error;
use crate::hash::MurmurHash3X64128;

/// A counting Bloom filter with 4-bit saturating counters.
///
/// Supports insertion, deletion and frequency lookup:
/// - `lookup` never under-reports an element that was inserted and not deleted (up to the
///   saturation ceiling of 15)
/// - `lookup` may over-report when other elements share all of an element's slots
/// - a `lookup` of 0 means the element is definitely absent
///
/// Use [`CountingBloomFilter::new`] or [`CountingBloomFilterBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct CountingBloomFilter {
    /// Expected element count (n)
    pub(super) element_num: u64,
    /// Target false positive probability (p)
    pub(super) false_positive_rate: f64,
    /// Number of slots per element (k)
    pub(super) hash_num: u16,
    /// Digest seed shared by all k slot functions
    pub(super) seed: u64,
    pub(super) policy: DecrementPolicy,
    /// m counters, two per byte
    pub(super) counters: PackedCounters,
    pub(super) saturated_increments: u64,
    pub(super) clamped_decrements: u64,
}

impl CountingBloomFilter {
    /// Creates a filter sized for `element_num` elements at `false_positive_rate`, with the
    /// default seed and [`DecrementPolicy::FloorAtOne`].
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter)
    /// under the same conditions as [`CountingBloomFilterBuilder::with_accuracy`].
    ///
    /// # Examples
    ///
    /// ```
    /// use countingbloom::filter::CountingBloomFilter;
    ///
    /// let filter = CountingBloomFilter::new(10_000, 0.001).unwrap();
    /// assert_eq!(filter.element_num(), 10_000);
    /// assert_eq!(filter.false_positive_rate(), 0.001);
    /// assert!(CountingBloomFilter::new(0, 0.001).is_err());
    /// ```
    pub fn new(element_num: u64, false_positive_rate: f64) -> Result<Self, Error> {
        Ok(CountingBloomFilterBuilder::with_accuracy(element_num, false_positive_rate)?.build())
    }

    /// Returns a builder sized for `element_num` elements at `false_positive_rate`.
    ///
    /// # Errors
    ///
    /// See [`CountingBloomFilterBuilder::with_accuracy`].
    pub fn builder(
        element_num: u64,
        false_positive_rate: f64,
    ) -> Result<CountingBloomFilterBuilder, Error> {
        CountingBloomFilterBuilder::with_accuracy(element_num, false_positive_rate)
    }

    // ========================================================================
    // Update Operations
    // ========================================================================

    /// Inserts an item, incrementing each of its k counters.
    ///
    /// Counters already at 15 stay at 15.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilter;
    /// let mut filter = CountingBloomFilter::new(100, 0.01).unwrap();
    /// filter.insert("apple");
    /// filter.insert("apple");
    /// filter.insert(42_u64);
    ///
    /// assert_eq!(filter.lookup("apple"), 2);
    /// ```
    pub fn insert<T: Hash>(&mut self, item: T) {
        for slot in self.slots(&item) {
            if self.counters.increment(slot) {
                self.saturated_increments += 1;
                tracing::trace!(slot, "counter saturated at {MAX_COUNTER}");
            }
        }
    }

    /// Deletes an item if it appears present, decrementing each of its k counters.
    ///
    /// Returns `false` without touching any counter when [`lookup`](Self::lookup) reports the
    /// item absent. A false positive lookup lets a never-inserted item through, in which case
    /// its counters are decremented and `true` is returned.
    ///
    /// Under [`DecrementPolicy::FloorAtOne`] no counter drops below 1, so an item inserted once
    /// still reads 1 after its delete.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilter;
    /// let mut filter = CountingBloomFilter::new(100, 0.01).unwrap();
    /// assert!(!filter.delete("apple"));
    ///
    /// filter.insert("apple");
    /// filter.insert("apple");
    /// assert!(filter.delete("apple"));
    /// assert_eq!(filter.lookup("apple"), 1);
    /// ```
    pub fn delete<T: Hash>(&mut self, item: T) -> bool {
        if self.lookup(&item) == 0 {
            return false;
        }

        let policy = self.policy;
        for slot in self.slots(&item) {
            if self.counters.decrement(slot, policy) {
                self.clamped_decrements += 1;
                tracing::trace!(slot, %policy, "counter clamped at decrement floor");
            }
        }
        true
    }

    /// Resets every counter to zero while keeping the derived parameters.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.saturated_increments = 0;
        self.clamped_decrements = 0;
    }

    /// Adds another filter into this one, slot by slot, saturating at 15.
    ///
    /// # Panics
    ///
    /// Panics if the filters are not compatible (different length, hash count, or seed).
    /// Use [`is_compatible()`](Self::is_compatible) to check first.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilter;
    /// let mut f1 = CountingBloomFilter::new(100, 0.01).unwrap();
    /// let mut f2 = CountingBloomFilter::new(100, 0.01).unwrap();
    /// f1.insert("a");
    /// f2.insert("a");
    /// f2.insert("b");
    ///
    /// f1.union(&f2);
    /// assert!(f1.lookup("a") >= 2);
    /// assert!(f1.contains("b"));
    /// ```
    pub fn union(&mut self, other: &CountingBloomFilter) {
        assert!(
            self.is_compatible(other),
            "Cannot union incompatible counting Bloom filters"
        );
        self.counters.saturating_add_assign(&other.counters);
    }

    // ========================================================================
    // Query Operations
    // ========================================================================

    /// Estimates how many times an item was inserted.
    ///
    /// Returns 0 as soon as any of the item's counters reads 0: the item is definitely absent.
    /// Otherwise returns the smallest of its k counters.
    pub fn lookup<T: Hash>(&self, item: T) -> u8 {
        let mut estimate = MAX_COUNTER;
        for slot in self.slots(&item) {
            let value = self.counters.get(slot).get();
            if value == 0 {
                return 0;
            }
            estimate = estimate.min(value);
        }
        estimate
    }

    /// Tests whether an item is possibly present, i.e. `lookup(item) > 0`.
    pub fn contains<T: Hash>(&self, item: T) -> bool {
        self.lookup(item) > 0
    }

    /// Returns the value of the counter at `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= self.length()`.
    pub fn counter(&self, slot: u64) -> u8 {
        assert!(
            slot < self.length(),
            "slot {slot} out of range for length {}",
            self.length()
        );
        self.counters.get(slot).get()
    }

    // ========================================================================
    // Statistics and Properties
    // ========================================================================

    /// Returns the expected element count the filter was sized for (n).
    pub fn element_num(&self) -> u64 {
        self.element_num
    }

    /// Returns the target false positive probability the filter was sized for (p).
    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    /// Returns the number of counters (m).
    pub fn length(&self) -> u64 {
        self.counters.num_slots()
    }

    /// Returns the number of slots each item maps to (k).
    pub fn hash_num(&self) -> u16 {
        self.hash_num
    }

    /// Returns the digest seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the policy applied by [`delete`](Self::delete).
    pub fn decrement_policy(&self) -> DecrementPolicy {
        self.policy
    }

    /// Returns whether every counter is zero.
    pub fn is_empty(&self) -> bool {
        self.counters.num_nonzero() == 0
    }

    /// Returns the number of non-zero counters.
    pub fn counters_used(&self) -> u64 {
        self.counters.num_nonzero()
    }

    /// Returns the fraction of counters that are non-zero.
    pub fn load_factor(&self) -> f64 {
        self.counters.num_nonzero() as f64 / self.length() as f64
    }

    /// Estimates the current false positive probability as `load_factor ^ k`: the chance that
    /// all k slots of an unseen item are already non-zero.
    pub fn estimated_fpp(&self) -> f64 {
        self.load_factor().powi(i32::from(self.hash_num))
    }

    /// Returns the number of counters currently at 15.
    ///
    /// Increments past 15 are dropped, so these counters no longer track exact counts.
    pub fn saturated_counters(&self) -> u64 {
        self.counters.num_saturated()
    }

    /// Returns how many increments hit a counter that was already saturated.
    pub fn saturated_increments(&self) -> u64 {
        self.saturated_increments
    }

    /// Returns how many decrements were held at the [`DecrementPolicy`] floor.
    pub fn clamped_decrements(&self) -> u64 {
        self.clamped_decrements
    }

    /// Checks if two filters are compatible for [`union`](Self::union).
    ///
    /// Filters are compatible if they have the same length, number of hash functions, and seed.
    pub fn is_compatible(&self, other: &CountingBloomFilter) -> bool {
        self.length() == other.length()
            && self.hash_num == other.hash_num
            && self.seed == other.seed
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Maps an item to its k slots.
    ///
    /// The item is fed to the digest once; each slot seed in `1..=k` is then appended to a copy
    /// of that state, so slot `i` is `digest(item ‖ i) mod m`.
    fn slots<T: Hash>(&self, item: &T) -> Slots {
        let mut prefix = MurmurHash3X64128::with_seed(self.seed);
        item.hash(&mut prefix);
        Slots {
            prefix,
            next_seed: 1,
            hash_num: self.hash_num,
            length: self.length(),
        }
    }
}

/// The k slot indices of one item, in seed order. Indices may repeat.
struct Slots {
    prefix: MurmurHash3X64128,
    next_seed: u16,
    hash_num: u16,
    length: u64,
}

impl Iterator for Slots {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.next_seed > self.hash_num {
            return None;
        }
        let mut hasher = self.prefix.clone();
        hasher.write(&u64::from(self.next_seed).to_le_bytes());
        self.next_seed += 1;
        Some((hasher.finish_u128() % u128::from(self.length)) as u64)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::from(self.hash_num.saturating_sub(self.next_seed - 1));
        (remaining, Some(remaining))
    }
}
