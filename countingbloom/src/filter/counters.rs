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

//! Packed array of 4-bit saturating counters, two per byte.

use super::DecrementPolicy;

/// Largest value a single counter can hold.
pub(super) const MAX_COUNTER: u8 = 0xF;

/// One 4-bit counter value.
///
/// Increments stop at [`MAX_COUNTER`]. Decrements stop at the floor chosen by the
/// [`DecrementPolicy`]; under [`DecrementPolicy::FloorAtOne`] a counter at 0 or 1 is forced to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) struct Counter(u8);

/// Result of a single counter step: the new value and whether the step was clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Step {
    pub counter: Counter,
    pub clamped: bool,
}

impl Counter {
    pub const ZERO: Counter = Counter(0);

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn increment(self) -> Step {
        if self.0 < MAX_COUNTER {
            Step {
                counter: Counter(self.0 + 1),
                clamped: false,
            }
        } else {
            Step {
                counter: Counter(MAX_COUNTER),
                clamped: true,
            }
        }
    }

    pub fn decrement(self, policy: DecrementPolicy) -> Step {
        let floor = policy.floor();
        if self.0 > floor {
            Step {
                counter: Counter(self.0 - 1),
                clamped: false,
            }
        } else {
            Step {
                counter: Counter(floor),
                clamped: true,
            }
        }
    }

    /// Adds two counters, clamping at [`MAX_COUNTER`].
    pub fn saturating_add(self, other: Counter) -> Counter {
        Counter(self.0.saturating_add(other.0).min(MAX_COUNTER))
    }
}

/// Fixed-size nibble array. Slot `i` lives in byte `i / 2`: even slots in the low nibble, odd
/// slots in the high nibble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct PackedCounters {
    bytes: Box<[u8]>,
    num_slots: u64,
    /// Number of slots currently holding a non-zero value.
    num_nonzero: u64,
    /// Number of slots currently at [`MAX_COUNTER`].
    num_saturated: u64,
}

impl PackedCounters {
    pub fn new(num_slots: u64) -> Self {
        let num_bytes = num_slots.div_ceil(2) as usize;
        PackedCounters {
            bytes: vec![0u8; num_bytes].into_boxed_slice(),
            num_slots,
            num_nonzero: 0,
            num_saturated: 0,
        }
    }

    pub fn num_slots(&self) -> u64 {
        self.num_slots
    }

    pub fn num_nonzero(&self) -> u64 {
        self.num_nonzero
    }

    pub fn num_saturated(&self) -> u64 {
        self.num_saturated
    }

    #[inline]
    pub fn get(&self, slot: u64) -> Counter {
        debug_assert!(slot < self.num_slots);

        let byte = self.bytes[(slot >> 1) as usize];
        Counter((byte >> nibble_shift(slot)) & MAX_COUNTER)
    }

    #[inline]
    fn put(&mut self, slot: u64, counter: Counter) {
        let old = self.get(slot);
        match (old.get(), counter.get()) {
            (0, 0) => {}
            (0, _) => self.num_nonzero += 1,
            (_, 0) => self.num_nonzero -= 1,
            _ => {}
        }
        match (old.get() == MAX_COUNTER, counter.get() == MAX_COUNTER) {
            (false, true) => self.num_saturated += 1,
            (true, false) => self.num_saturated -= 1,
            _ => {}
        }

        let shift = nibble_shift(slot);
        let byte = &mut self.bytes[(slot >> 1) as usize];
        *byte = (*byte & !(MAX_COUNTER << shift)) | (counter.get() << shift);
    }

    /// Increments one slot. Returns `true` when the slot was already saturated.
    pub fn increment(&mut self, slot: u64) -> bool {
        let step = self.get(slot).increment();
        self.put(slot, step.counter);
        step.clamped
    }

    /// Decrements one slot. Returns `true` when the slot was held at the policy floor.
    pub fn decrement(&mut self, slot: u64, policy: DecrementPolicy) -> bool {
        let step = self.get(slot).decrement(policy);
        self.put(slot, step.counter);
        step.clamped
    }

    /// Adds `other` slot by slot, clamping each slot at [`MAX_COUNTER`].
    pub fn saturating_add_assign(&mut self, other: &PackedCounters) {
        debug_assert_eq!(self.num_slots, other.num_slots);

        for slot in 0..self.num_slots {
            let rhs = other.get(slot);
            if rhs != Counter::ZERO {
                let sum = self.get(slot).saturating_add(rhs);
                self.put(slot, sum);
            }
        }
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.num_nonzero = 0;
        self.num_saturated = 0;
    }
}

#[inline]
fn nibble_shift(slot: u64) -> u8 {
    ((slot & 1) as u8) * 4
}
