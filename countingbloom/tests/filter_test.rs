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

mod common;

use countingbloom::error::ErrorKind;
use countingbloom::filter::CountingBloomFilter;
use countingbloom::filter::DecrementPolicy;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::eq;
use googletest::prelude::ge;
use googletest::prelude::le;

use self::common::XorShift64;

#[test]
fn test_init_defaults() {
    let filter = CountingBloomFilter::new(10_000, 0.001).unwrap();
    assert_eq!(filter.element_num(), 10_000);
    assert_eq!(filter.false_positive_rate(), 0.001);
    assert_eq!(filter.length(), 143_776);
    assert_eq!(filter.hash_num(), 10);
    assert_eq!(filter.seed(), 9001);
    assert_eq!(filter.decrement_policy(), DecrementPolicy::FloorAtOne);
    assert!(filter.is_empty());
    assert_eq!(filter.lookup("missing"), 0);
}

#[test]
fn test_invalid_parameters() {
    let err = CountingBloomFilter::new(0, 0.01).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_that!(err.message(), contains_substring("element_num"));

    let err = CountingBloomFilter::new(100, 1.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert_that!(err.to_string(), contains_substring("false_positive_rate: 1"));
}

#[test]
fn test_length_scales_with_element_num() {
    let mut previous = 0;
    for n in [10u64, 100, 1_000, 10_000, 100_000] {
        let filter = CountingBloomFilter::new(n, 0.01).unwrap();
        assert!(filter.length() >= 1);
        assert!(filter.hash_num() >= 1);
        assert!(filter.length() > previous);
        // ~9.59 counters per element at 1%
        let per_element = filter.length() as f64 / n as f64;
        assert_that!(per_element, ge(9.5));
        assert_that!(per_element, le(9.7));
        previous = filter.length();
    }
}

#[test]
fn test_single_insert_is_found() {
    let mut filter = CountingBloomFilter::new(1000, 0.01).unwrap();
    for i in 0..1000u64 {
        filter.insert(i);
        assert_that!(filter.lookup(i), ge(1));
    }
    // no false negatives once everything is in
    for i in 0..1000u64 {
        assert!(filter.contains(i));
    }
}

#[test]
fn test_repeated_insert_counts() {
    let mut filter = CountingBloomFilter::new(1000, 0.01).unwrap();
    for c in 1..=15u8 {
        filter.insert("counted");
        assert_that!(filter.lookup("counted"), eq(c));
    }
}

#[test]
fn test_saturation() {
    let mut filter = CountingBloomFilter::new(1000, 0.01).unwrap();
    for _ in 0..20 {
        filter.insert(99_u64);
    }
    assert_that!(filter.lookup(99_u64), eq(15));
    assert!((0..filter.length()).all(|slot| filter.counter(slot) <= 15));
    assert!(filter.saturated_increments() > 0);

    let at_max = (0..filter.length())
        .filter(|&slot| filter.counter(slot) == 15)
        .count() as u64;
    assert_that!(filter.saturated_counters(), eq(at_max));
    assert_that!(at_max, ge(1));
    assert_that!(at_max, le(u64::from(filter.hash_num())));
}

#[test]
fn test_delete_then_lookup() {
    let mut filter = CountingBloomFilter::new(1000, 0.01).unwrap();
    for _ in 0..3 {
        filter.insert("x");
    }

    assert!(filter.delete("x"));
    assert_that!(filter.lookup("x"), eq(2));
    assert!(filter.delete("x"));
    assert_that!(filter.lookup("x"), eq(1));

    // counters stay at the floor of 1
    assert!(filter.delete("x"));
    assert_that!(filter.lookup("x"), eq(1));
    assert!(filter.clamped_decrements() > 0);
}

#[test]
fn test_delete_floor_at_zero() {
    let mut filter = CountingBloomFilter::builder(1000, 0.01)
        .unwrap()
        .decrement_policy(DecrementPolicy::FloorAtZero)
        .build();
    filter.insert("x");
    filter.insert("x");

    assert!(filter.delete("x"));
    assert_that!(filter.lookup("x"), eq(1));
    assert!(filter.delete("x"));
    assert_that!(filter.lookup("x"), eq(0));
    assert!(filter.is_empty());
    assert!(!filter.delete("x"));
}

#[test]
fn test_delete_never_inserted() {
    let mut filter = CountingBloomFilter::new(1000, 0.01).unwrap();
    for i in 0..500u64 {
        filter.insert(i);
    }
    let before = filter.clone();

    let mut false_positives = 0;
    for i in 1_000_000..1_010_000u64 {
        if filter.contains(i) {
            false_positives += 1;
        } else {
            assert!(!filter.delete(i));
        }
    }
    assert_eq!(filter, before);
    // half-full filter, so well under the designed rate
    assert_that!(false_positives, le(100));
}

#[test]
fn test_false_positive_delete_mutates() {
    // tiny and overfull, so false positives are easy to find
    let mut filter = CountingBloomFilter::builder(10, 0.5)
        .unwrap()
        .decrement_policy(DecrementPolicy::FloorAtZero)
        .build();
    for i in 0..50u64 {
        filter.insert(i);
    }
    let impostor = (1_000u64..).find(|i| filter.contains(i)).unwrap();
    let before = filter.clone();

    assert!(filter.delete(impostor));
    assert_ne!(filter, before);
}

#[test]
fn test_false_positive_rate_at_capacity() {
    let mut filter = CountingBloomFilter::new(10_000, 0.01).unwrap();
    let mut rng = XorShift64::seeded(42);
    for _ in 0..10_000 {
        filter.insert(rng.next_u64());
    }

    let trials = 20_000;
    let false_positives = (0..trials)
        .map(|i| format!("absent-{i}"))
        .filter(|item| filter.contains(item))
        .count();
    let rate = false_positives as f64 / trials as f64;
    assert_that!(rate, le(0.02));
    assert_that!(filter.estimated_fpp(), le(0.02));
}

#[test]
fn test_reset() {
    let mut filter = CountingBloomFilter::new(100, 0.01).unwrap();
    filter.insert("test");
    assert!(!filter.is_empty());
    assert_that!(filter.counters_used(), ge(1));

    filter.reset();
    assert!(filter.is_empty());
    assert_eq!(filter.load_factor(), 0.0);
    assert_eq!(filter.lookup("test"), 0);
    assert_eq!(filter.length(), 959);
}

#[test]
fn test_union() {
    let mut left = CountingBloomFilter::builder(100, 0.01)
        .unwrap()
        .seed(7)
        .build();
    let mut right = CountingBloomFilter::builder(100, 0.01)
        .unwrap()
        .seed(7)
        .build();
    for _ in 0..10 {
        left.insert("a");
        right.insert("a");
    }
    right.insert("b");

    left.union(&right);
    assert_that!(left.lookup("a"), eq(15));
    assert_that!(left.lookup("b"), ge(1));
}

#[test]
fn test_is_compatible() {
    let f1 = CountingBloomFilter::builder(100, 0.01)
        .unwrap()
        .seed(1)
        .build();
    let f2 = CountingBloomFilter::builder(100, 0.01)
        .unwrap()
        .seed(1)
        .build();
    let f3 = CountingBloomFilter::builder(100, 0.01)
        .unwrap()
        .seed(2)
        .build();
    let f4 = CountingBloomFilter::builder(200, 0.01)
        .unwrap()
        .seed(1)
        .build();

    assert!(f1.is_compatible(&f2));
    assert!(!f1.is_compatible(&f3));
    assert!(!f1.is_compatible(&f4));
}

#[test]
#[should_panic(expected = "Cannot union incompatible counting Bloom filters")]
fn test_union_incompatible() {
    let mut left = CountingBloomFilter::new(100, 0.01).unwrap();
    let right = CountingBloomFilter::new(200, 0.01).unwrap();
    left.union(&right);
}
