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

use std::f64::consts::LN_2;
use std::fmt;

use super::CountingBloomFilter;
use super::counters::PackedCounters;
use crate::error::Error;
use crate::hash::DEFAULT_UPDATE_SEED;

/// Smallest counter array a filter is built with.
pub const MIN_LENGTH: u64 = 1;
/// Largest counter array a filter is built with: 2^32 counters, 2 GiB of packed storage.
pub const MAX_LENGTH: u64 = 1 << 32;
/// Fewest hash functions a filter uses.
pub const MIN_HASH_NUM: u16 = 1;
/// Most hash functions a filter uses.
pub const MAX_HASH_NUM: u16 = i16::MAX as u16;

/// How [`CountingBloomFilter::delete`] treats a counter that is already at the bottom of its
/// range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DecrementPolicy {
    /// Counters never fall below 1 through a decrement; a counter at 0 or 1 is set to 1.
    ///
    /// After an element inserted once is deleted, its slots keep reading 1, so it still looks
    /// present. This is the reference behavior of the filter.
    #[default]
    FloorAtOne,
    /// Counters decrement down to 0 and stay there.
    FloorAtZero,
}

impl DecrementPolicy {
    pub(super) fn floor(self) -> u8 {
        match self {
            DecrementPolicy::FloorAtOne => 1,
            DecrementPolicy::FloorAtZero => 0,
        }
    }
}

impl fmt::Display for DecrementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecrementPolicy::FloorAtOne => write!(f, "floor-at-one"),
            DecrementPolicy::FloorAtZero => write!(f, "floor-at-zero"),
        }
    }
}

/// Builder for creating [`CountingBloomFilter`] instances.
///
/// The counter array length and the number of hash functions are derived once, from the
/// expected element count and the target false positive rate, and never change afterwards.
#[derive(Debug, Clone)]
pub struct CountingBloomFilterBuilder {
    element_num: u64,
    false_positive_rate: f64,
    length: u64,
    hash_num: u16,
    seed: u64,
    policy: DecrementPolicy,
}

impl CountingBloomFilterBuilder {
    /// Creates a builder sized for `element_num` elements at `false_positive_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter) if:
    /// - `element_num` is 0
    /// - `false_positive_rate` is not strictly between 0.0 and 1.0
    /// - the derived length exceeds [`MAX_LENGTH`], or its packed size does not fit in memory
    ///   addressable by the target
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilterBuilder;
    /// let filter = CountingBloomFilterBuilder::with_accuracy(10_000, 0.001)
    ///     .unwrap()
    ///     .seed(42)
    ///     .build();
    /// assert_eq!(filter.length(), 143_776);
    /// assert_eq!(filter.hash_num(), 10);
    /// ```
    pub fn with_accuracy(element_num: u64, false_positive_rate: f64) -> Result<Self, Error> {
        if element_num == 0 {
            let err = Error::invalid_parameter("element_num must be greater than 0");
            return Err(err.with_context("element_num", element_num));
        }
        // NaN fails both comparisons
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            let err = Error::invalid_parameter(
                "false_positive_rate must be between 0.0 and 1.0 (exclusive)",
            );
            return Err(err.with_context("false_positive_rate", false_positive_rate));
        }

        let length = Self::suggest_length(element_num, false_positive_rate);
        // the packed array must also be addressable on 32-bit targets
        if length > MAX_LENGTH || isize::try_from(length.div_ceil(2)).is_err() {
            let err = Error::invalid_parameter(format!("length must not exceed {MAX_LENGTH}"))
                .with_context("element_num", element_num)
                .with_context("false_positive_rate", false_positive_rate)
                .with_context("length", length);
            return Err(err);
        }
        let hash_num = Self::suggest_hash_num(element_num, length);

        Ok(CountingBloomFilterBuilder {
            element_num,
            false_positive_rate,
            length,
            hash_num,
            seed: DEFAULT_UPDATE_SEED,
            policy: DecrementPolicy::default(),
        })
    }

    /// Sets a custom digest seed (default: 9001).
    ///
    /// Filters with different seeds map the same element to different slots and cannot be
    /// merged.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets how deletes treat counters at the bottom of their range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::{CountingBloomFilterBuilder, DecrementPolicy};
    /// let mut filter = CountingBloomFilterBuilder::with_accuracy(100, 0.01)
    ///     .unwrap()
    ///     .decrement_policy(DecrementPolicy::FloorAtZero)
    ///     .build();
    /// filter.insert("apple");
    /// assert!(filter.delete("apple"));
    /// assert_eq!(filter.lookup("apple"), 0);
    /// ```
    pub fn decrement_policy(mut self, policy: DecrementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the filter with every counter at zero.
    pub fn build(self) -> CountingBloomFilter {
        tracing::debug!(
            element_num = self.element_num,
            false_positive_rate = self.false_positive_rate,
            length = self.length,
            hash_num = self.hash_num,
            seed = self.seed,
            policy = %self.policy,
            "building counting bloom filter"
        );

        CountingBloomFilter {
            element_num: self.element_num,
            false_positive_rate: self.false_positive_rate,
            hash_num: self.hash_num,
            seed: self.seed,
            policy: self.policy,
            counters: PackedCounters::new(self.length),
            saturated_increments: 0,
            clamped_decrements: 0,
        }
    }

    /// Suggests the number of counters for `element_num` elements at `false_positive_rate`.
    ///
    /// Formula: `m = ceil(-n * ln(p) / ln(2)^2)`, at least [`MIN_LENGTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilterBuilder;
    /// assert_eq!(CountingBloomFilterBuilder::suggest_length(1000, 0.01), 9586);
    /// ```
    pub fn suggest_length(element_num: u64, false_positive_rate: f64) -> u64 {
        let n = element_num as f64;
        let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil();
        // float-to-int casts saturate, so huge results land above MAX_LENGTH
        (m as u64).max(MIN_LENGTH)
    }

    /// Suggests the number of hash functions for `element_num` elements over `length` counters.
    ///
    /// Formula: `k = ceil((m / n) * ln(2))`, clamped to [`MIN_HASH_NUM`]..=[`MAX_HASH_NUM`].
    ///
    /// # Examples
    ///
    /// ```
    /// # use countingbloom::filter::CountingBloomFilterBuilder;
    /// assert_eq!(CountingBloomFilterBuilder::suggest_hash_num(1000, 9586), 7);
    /// ```
    pub fn suggest_hash_num(element_num: u64, length: u64) -> u16 {
        let m = length as f64;
        let n = element_num.max(1) as f64;
        let k = (m / n * LN_2).ceil();
        k.clamp(f64::from(MIN_HASH_NUM), f64::from(MAX_HASH_NUM)) as u16
    }
}
