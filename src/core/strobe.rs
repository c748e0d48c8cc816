// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Address strobe generator
//!
//! Produces a repeating, recognisable pattern on the module address pins for
//! a logic analyser. For every bank and every single-bit wire mask (plus the
//! all-zero mask) the mask's address and the address of its complement are
//! read back to back, twice. The probe trigger is held active for the whole
//! burst so the analyser can start capturing on it.

use crate::core::platform::{CriticalSection, Platform, SectionFlags};
use crate::core::translate::{to_address, AddrBits, BANK_COUNT};
use serde::Serialize;

/// Passes over the complete address list
pub const STROBE_ITERATIONS: usize = 21;

/// One pair of complementary reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrobePair {
    pub bank: usize,
    /// 0 for the all-zero mask, otherwise wire bit + 1
    pub step: u32,
    pub mask0: u32,
    pub addr0: u32,
    pub mask1: u32,
    pub addr1: u32,
}

/// Every strobe pair, in the order they are read
pub fn strobe_pairs(addrbits: AddrBits) -> Vec<StrobePair> {
    let all = addrbits.mask();
    let mut pairs = Vec::with_capacity(BANK_COUNT * (addrbits.get() as usize + 1));

    for bank in 0..BANK_COUNT {
        for step in 0..=addrbits.get() {
            let mask0 = if step == 0 { 0 } else { 1 << (step - 1) };
            let mask1 = all ^ mask0;
            let pair = StrobePair {
                bank,
                step,
                mask0,
                addr0: to_address(bank, mask0, addrbits),
                mask1,
                addr1: to_address(bank, mask1, addrbits),
            };
            log::debug!(
                "{:06x}={:08x} {:06x}={:08x}",
                pair.mask0,
                pair.addr0,
                pair.mask1,
                pair.addr1
            );
            pairs.push(pair);
        }
    }
    pairs
}

/// Generate the strobe burst
///
/// Returns the number of reads issued.
pub fn generate_strobes<P: Platform + ?Sized>(platform: &mut P, addrbits: AddrBits) -> usize {
    let pairs = strobe_pairs(addrbits);
    let mut reads = 0;

    log::info!(
        "Generating address strobes ({} pairs, {} passes)",
        pairs.len(),
        STROBE_ITERATIONS
    );

    // Drop anything cached from address setup
    let cached = platform.set_data_cache(false);
    platform.set_data_cache(cached);

    let flags = SectionFlags::MEASURE.physical(&platform.cpu());
    platform.set_probe_trigger(true);
    for _ in 0..STROBE_ITERATIONS {
        let mut cs = CriticalSection::new(platform, flags);
        for pair in pairs.iter() {
            for _ in 0..2 {
                let _ = cs.read32(pair.addr0);
                let _ = cs.read32(pair.addr1);
                reads += 2;
            }
        }
    }
    platform.set_probe_trigger(false);

    reads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sim::SimBoard;
    use crate::core::translate::to_wire_mask;

    #[test]
    fn test_pairs_are_complements() {
        let bits = AddrBits::BITS_20;
        let pairs = strobe_pairs(bits);

        assert_eq!(pairs.len(), 4 * 21);
        for pair in &pairs {
            assert_eq!(pair.mask0 ^ pair.mask1, 0xF_FFFF);
            assert_eq!(to_wire_mask(pair.addr0, bits), pair.mask0);
            assert_eq!(to_wire_mask(pair.addr1, bits), pair.mask1);
        }
        assert_eq!(pairs[0].mask0, 0);
        assert_eq!(pairs[1].mask0, 1);
        assert_eq!(pairs[20].mask0, 1 << 19);
        assert_eq!(pairs[21].bank, 1);
    }

    #[test]
    fn test_small_modules() {
        let pairs = strobe_pairs(AddrBits::BITS_18);
        assert_eq!(pairs.len(), 4 * 19);
        assert_eq!(pairs[18].mask1, 0x3_FFFF ^ (1 << 17));
    }

    #[test]
    fn test_strobe_burst() {
        let mut board = SimBoard::default();
        let bits = board.addrbits();
        let reads = generate_strobes(&mut board, bits);

        assert_eq!(reads, STROBE_ITERATIONS * 4 * 21 * 4);
        assert_eq!(board.strobe_log().len(), reads);
        assert!(!board.probe_trigger());
        assert_eq!(board.interrupt_depth(), 0);
        assert!(board.data_cache_enabled());
        assert_eq!(board.stats().unmasked_fast_accesses, 0);

        let first = strobe_pairs(bits)[0];
        assert_eq!(
            &board.strobe_log()[..4],
            &[first.addr0, first.addr1, first.addr0, first.addr1]
        );
    }
}
