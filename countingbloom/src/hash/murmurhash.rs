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

use std::hash::Hasher;

use byteorder::ByteOrder;
use byteorder::LE;

const C1: u64 = 0x87c37b91114253d5;
const C2: u64 = 0x4cf5ad432745937f;
const BLOCK_LEN: usize = 16;

/// Streaming MurmurHash3 (x64, 128-bit) exposed through [`Hasher`].
///
/// The state is `Clone`, so a prefix can be hashed once and then extended with different
/// suffixes. Feeding bytes in any chunking yields the same digest as the one-shot function.
#[derive(Debug, Clone)]
pub(crate) struct MurmurHash3X64128 {
    h1: u64,
    h2: u64,
    /// Bytes already folded into `h1`/`h2`.
    consumed: u64,
    pending: [u8; BLOCK_LEN],
    pending_len: usize,
}

impl MurmurHash3X64128 {
    pub fn with_seed(seed: u64) -> Self {
        MurmurHash3X64128 {
            h1: seed,
            h2: seed,
            consumed: 0,
            pending: [0; BLOCK_LEN],
            pending_len: 0,
        }
    }

    /// Returns both 64-bit halves of the digest.
    pub fn finish128(&self) -> (u64, u64) {
        let mut h1 = self.h1;
        let mut h2 = self.h2;
        let tail = &self.pending[..self.pending_len];

        if tail.len() > 8 {
            h2 ^= mix_k2(LE::read_uint(&tail[8..], tail.len() - 8));
        }
        if !tail.is_empty() {
            let len = tail.len().min(8);
            h1 ^= mix_k1(LE::read_uint(&tail[..len], len));
        }

        let total = self.consumed + self.pending_len as u64;
        h1 ^= total;
        h2 ^= total;
        h1 = h1.wrapping_add(h2);
        h2 = h2.wrapping_add(h1);
        h1 = fmix64(h1);
        h2 = fmix64(h2);
        h1 = h1.wrapping_add(h2);
        h2 = h2.wrapping_add(h1);
        (h1, h2)
    }

    /// Returns the digest as one wide integer, high half first.
    pub fn finish_u128(&self) -> u128 {
        let (h1, h2) = self.finish128();
        (u128::from(h2) << 64) | u128::from(h1)
    }

    #[inline]
    fn absorb(&mut self, block: &[u8]) {
        debug_assert_eq!(block.len(), BLOCK_LEN);

        self.h1 ^= mix_k1(LE::read_u64(&block[..8]));
        self.h1 = self
            .h1
            .rotate_left(27)
            .wrapping_add(self.h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dce729);

        self.h2 ^= mix_k2(LE::read_u64(&block[8..]));
        self.h2 = self
            .h2
            .rotate_left(31)
            .wrapping_add(self.h1)
            .wrapping_mul(5)
            .wrapping_add(0x38495ab5);

        self.consumed += BLOCK_LEN as u64;
    }
}

impl Hasher for MurmurHash3X64128 {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, mut bytes: &[u8]) {
        if self.pending_len > 0 {
            let wanted = (BLOCK_LEN - self.pending_len).min(bytes.len());
            self.pending[self.pending_len..self.pending_len + wanted]
                .copy_from_slice(&bytes[..wanted]);
            self.pending_len += wanted;
            bytes = &bytes[wanted..];

            if self.pending_len < BLOCK_LEN {
                return;
            }
            let block = self.pending;
            self.absorb(&block);
            self.pending_len = 0;
        }

        let mut blocks = bytes.chunks_exact(BLOCK_LEN);
        for block in blocks.by_ref() {
            self.absorb(block);
        }

        let rest = blocks.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }
}

#[inline]
fn mix_k1(k1: u64) -> u64 {
    k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2)
}

#[inline]
fn mix_k2(k2: u64) -> u64 {
    k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1)
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}
