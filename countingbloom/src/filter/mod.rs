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

//! Counting Bloom filter for approximate membership and frequency queries.
//!
//! A counting Bloom filter replaces each bit of a Bloom filter with a small counter, so elements
//! can be deleted as well as inserted, and a lookup can estimate how often an element was seen.
//!
//! # Properties
//!
//! - **No false negatives**: an element inserted and not deleted always has a non-zero
//!   [`lookup()`](CountingBloomFilter::lookup)
//! - **Possible false positives**: a never-inserted element reads non-zero with probability
//!   close to the configured rate, once the filter holds its designed element count
//! - **Fixed size**: counter array length and hash count are derived once and never change
//! - **Saturating counters**: each counter is 4 bits wide and sticks at 15
//!
//! # Usage
//!
//! ```rust
//! use countingbloom::filter::CountingBloomFilter;
//!
//! // 10,000 expected elements at a 0.1% false positive rate
//! let mut filter = CountingBloomFilter::new(10_000, 0.001).unwrap();
//!
//! filter.insert("apple");
//! filter.insert("apple");
//! filter.insert(42_u64);
//!
//! assert_eq!(filter.lookup("apple"), 2);
//! assert_eq!(filter.lookup("grape"), 0); // never inserted (probably)
//!
//! assert!(filter.delete("apple"));
//! assert_eq!(filter.lookup("apple"), 1);
//!
//! println!("m = {}, k = {}", filter.length(), filter.hash_num());
//! println!("Est. FPP: {:.4}%", filter.estimated_fpp() * 100.0);
//! ```
//!
//! # Deleting
//!
//! [`delete()`](CountingBloomFilter::delete) only decrements when a lookup says the element is
//! present. By default counters never fall below 1 through a delete
//! ([`DecrementPolicy::FloorAtOne`]), so an element inserted once keeps reading 1 after it is
//! deleted. [`DecrementPolicy::FloorAtZero`] lets counters return to 0:
//!
//! ```rust
//! # use countingbloom::filter::{CountingBloomFilter, DecrementPolicy};
//! let mut filter = CountingBloomFilter::builder(1000, 0.01)
//!     .unwrap()
//!     .decrement_policy(DecrementPolicy::FloorAtZero)
//!     .build();
//! filter.insert(7_u32);
//! assert!(filter.delete(7_u32));
//! assert!(!filter.contains(7_u32));
//! ```
//!
//! # Element Encoding
//!
//! Elements are encoded through their [`Hash`](std::hash::Hash) implementation. The same
//! logical element must always be passed as the same type: `7_u32` and `7_u64` feed different
//! bytes to the digest and land in different slots. Passing a reference hashes like the value.
//!
//! # Implementation Details
//!
//! - Sizing: `m = ceil(-n ln p / (ln 2)^2)`, `k = ceil((m / n) ln 2)`
//! - Slot `i` for `i` in `1..=k` is a 128-bit MurmurHash3 digest of the element followed by
//!   `i`, reduced modulo `m`
//! - Counters packed two per byte, low nibble for even slots
//! - Not synchronized: wrap the filter in a lock to share it between writers
//!
//! # References
//!
//! - Fan, Cao, Almeida, and Broder (2000). "Summary Cache: A Scalable Wide-Area Web Cache
//!   Sharing Protocol"

mod builder;
mod counters;
mod sketch;

pub use self::builder::CountingBloomFilterBuilder;
pub use self::builder::DecrementPolicy;
pub use self::builder::MAX_HASH_NUM;
pub use self::builder::MAX_LENGTH;
pub use self::builder::MIN_HASH_NUM;
pub use self::builder::MIN_LENGTH;
pub use self::sketch::CountingBloomFilter;
