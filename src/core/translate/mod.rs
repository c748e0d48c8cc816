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

//! Wire mask to physical address translation
//!
//! The memory controller does not present CPU address bits to the modules
//! one-to-one. A wire mask is the combined RAS+CAS pattern seen on the module
//! address pins of one bank; CAS occupies the low half of the mask and RAS the
//! high half. Converting a wire mask to the CPU address that produces it takes
//! four steps:
//!
//! 1. XOR with a density-specific inversion constant
//! 2. (20-bit modules only) roll bit 10 up to bit 19, shifting bits 11-19 down
//! 3. Shift left by 2, because eight x4 modules form one 32-bit word
//! 4. Offset from the top of fast memory by the bank index
//!
//! # Bank Layout
//!
//! | Bank | 256Kx4 (18 bits)        | 1Mx4 (20 bits)          |
//! |------|-------------------------|-------------------------|
//! | 0    | 0x07F00000-0x07FFFFFF   | 0x07C00000-0x07FFFFFF   |
//! | 1    | 0x07E00000-0x07EFFFFF   | 0x07800000-0x07BFFFFF   |
//! | 2    | 0x07D00000-0x07DFFFFF   | 0x07400000-0x077FFFFF   |
//! | 3    | 0x07C00000-0x07CFFFFF   | 0x07000000-0x073FFFFF   |
//!
//! # Example
//!
//! ```
//! use zipdiag::core::translate::{to_address, to_wire_mask, AddrBits};
//!
//! let bits = AddrBits::BITS_20;
//!
//! // All-inverted mask lands on the first byte of bank 0
//! assert_eq!(to_address(0, 0xFFBFE, bits), 0x07C0_0000);
//! assert_eq!(to_wire_mask(0x07C0_0000, bits), 0xFFBFE);
//! ```

use crate::core::error::{DiagError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First address past the end of fast memory
pub const FASTMEM_TOP: u32 = 0x0800_0000;

/// Number of independently addressed controller banks
pub const BANK_COUNT: usize = 4;

/// Number of 4-bit modules that together form one 32-bit word
pub const NIBBLES: usize = 8;

/// Widest possible CAS half of a wire mask (1Mx4 parts)
pub const MAX_CAS_BITS: usize = 10;

/// Inversion constant for 1Mx4 parts (bits 1-9 and 11-19)
const INVERT_20: u32 = 0xF_FBFE;

/// Inversion constant for 256Kx4 parts (bits 1-8 and 10-17)
const INVERT_18: u32 = 0x3_FDFE;

#[inline(always)]
const fn bit(n: u32) -> u32 {
    1 << n
}

/// Module address width in wire-mask bits
///
/// Only two densities exist on this controller: 256Kx4 (18 bits) and
/// 1Mx4 (20 bits). Any other width is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AddrBits(u32);

impl AddrBits {
    /// 256Kx4 modules
    pub const BITS_18: AddrBits = AddrBits(18);

    /// 1Mx4 modules
    pub const BITS_20: AddrBits = AddrBits(20);

    /// Validate an address width
    ///
    /// # Errors
    ///
    /// Returns `DiagError::InvalidAddrBits` for anything other than 18 or 20.
    pub fn new(bits: u32) -> Result<Self> {
        match bits {
            18 | 20 => Ok(AddrBits(bits)),
            _ => Err(DiagError::InvalidAddrBits(bits)),
        }
    }

    /// Number of wire-mask bits
    #[inline(always)]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Number of CAS (and RAS) bits, i.e. address pins per module
    #[inline(always)]
    pub fn cas_bits(self) -> u32 {
        self.0 / 2
    }

    /// Mask covering every valid wire bit
    #[inline(always)]
    pub fn mask(self) -> u32 {
        bit(self.0) - 1
    }

    /// Bytes spanned by one bank of x4 modules
    #[inline(always)]
    pub fn bank_size(self) -> u32 {
        bit(self.0) * 4
    }

    #[inline(always)]
    fn inversion(self) -> u32 {
        if self.0 == 20 {
            INVERT_20
        } else {
            INVERT_18
        }
    }
}

impl TryFrom<u32> for AddrBits {
    type Error = DiagError;

    fn try_from(bits: u32) -> Result<Self> {
        AddrBits::new(bits)
    }
}

impl From<AddrBits> for u32 {
    fn from(bits: AddrBits) -> u32 {
        bits.0
    }
}

impl fmt::Display for AddrBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 20 {
            write!(f, "1Mx4")
        } else {
            write!(f, "256Kx4")
        }
    }
}

/// Lowest address of a bank
#[inline(always)]
pub fn bank_base(bank: usize, bits: AddrBits) -> u32 {
    debug_assert!(bank < BANK_COUNT, "bank {} out of range", bank);
    FASTMEM_TOP - bits.bank_size() * (bank as u32 + 1)
}

/// Half-open address range `[start, end)` covered by a bank
pub fn bank_range(bank: usize, bits: AddrBits) -> std::ops::Range<u32> {
    let start = bank_base(bank, bits);
    start..start + bits.bank_size()
}

/// Identify the bank containing an address, if any
pub fn bank_of(address: u32, bits: AddrBits) -> Option<usize> {
    let bottom = FASTMEM_TOP - bits.bank_size() * BANK_COUNT as u32;
    if !(bottom..FASTMEM_TOP).contains(&address) {
        return None;
    }
    Some(((FASTMEM_TOP - 1 - address) / bits.bank_size()) as usize)
}

/// Convert a bank and RAS+CAS wire mask to a CPU physical address
///
/// Bits of `mask` above the address width are ignored.
///
/// # Arguments
///
/// * `bank` - Controller bank (0-3, 0 is highest in memory)
/// * `mask` - RAS+CAS wire mask, CAS in the low half
/// * `bits` - Module address width
#[inline]
pub fn to_address(bank: usize, mask: u32, bits: AddrBits) -> u32 {
    let mut amask = (mask & bits.mask()) ^ bits.inversion();

    if bits.get() == 20 {
        amask = ((amask & bit(10)) << 9)
            | ((amask & (bit(20) - bit(11))) >> 1)
            | (amask & (bit(10) - 1));
    }

    bank_base(bank, bits) + (amask << 2)
}

/// Checked form of [`to_address`]
///
/// # Errors
///
/// Returns `DiagError::InvalidBank` if `bank` is not a controller bank.
pub fn try_to_address(bank: usize, mask: u32, bits: AddrBits) -> Result<u32> {
    if bank >= BANK_COUNT {
        return Err(DiagError::InvalidBank {
            bank,
            max: BANK_COUNT - 1,
        });
    }
    Ok(to_address(bank, mask, bits))
}

/// Convert a CPU physical address back to the RAS+CAS wire mask
///
/// The bank is implied by the address and discarded; use [`bank_of`] to
/// recover it.
#[inline]
pub fn to_wire_mask(address: u32, bits: AddrBits) -> u32 {
    let mut amask = (address >> 2) & bits.mask();

    if bits.get() == 20 {
        amask = ((amask & bit(19)) >> 9)
            | ((amask & (bit(19) - bit(10))) << 1)
            | (amask & (bit(10) - 1));
    }

    amask ^ bits.inversion()
}

/// Combine a CAS value with an identical RAS value
///
/// The address-line test drives the same pattern on both strobes so that a
/// single module address pin carries the bit under test twice.
#[inline(always)]
pub fn ras_eq_cas(cas: u32, bits: AddrBits) -> u32 {
    cas | (cas << bits.cas_bits())
}

/// Render the low `count` bits of `value` MSB first
pub fn format_bits(count: u32, value: u32) -> String {
    (0..count)
        .rev()
        .map(|n| if value & bit(n) != 0 { '1' } else { '0' })
        .collect()
}

/// Address that drives a single wire bit high in bank 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WireMapEntry {
    /// Wire-mask bit index
    pub bit: u32,
    /// Wire mask with only that bit set
    pub mask: u32,
    /// Physical address producing the mask
    pub address: u32,
}

/// Map every single-bit wire mask to the bank 0 address that produces it
pub fn address_line_map(bits: AddrBits) -> Vec<WireMapEntry> {
    (0..bits.get())
        .map(|b| WireMapEntry {
            bit: b,
            mask: bit(b),
            address: to_address(0, bit(b), bits),
        })
        .collect()
}

/// Walking-0 and walking-1 vectors for 1Mx4 parts
const SELFTEST_1MX4: [u32; 32] = [
    0xffbfe, 0xffbff, 0xffbfc, 0xffbfa, 0xffbf6, 0xffbee, 0xffbde, 0xffbbe, 0xffb7e, 0xffafe,
    0xff9fe, 0xff3fe, 0xfebfe, 0xfdbfe, 0xfbbfe, 0xf7bfe, 0xefbfe, 0xdfbfe, 0xbfbfe, 0x7fbfe,
    0xffffe, 0x00001, 0x00002, 0x00004, 0x00008, 0x00010, 0x00020, 0x00040, 0x00080, 0x00100,
    0x00200, 0x00400,
];

/// Walking-0 and walking-1 vectors for 256Kx4 parts
const SELFTEST_256KX4: [u32; 29] = [
    0x3fdfe, 0x3fdff, 0x3fdfc, 0x3fdfa, 0x3fdf6, 0x3fdee, 0x3fdde, 0x3fdbe, 0x3fd7e, 0x3fcfe,
    0x3fffe, 0x3fbfe, 0x3f5fe, 0x3edfe, 0x3ddfe, 0x3bdfe, 0x37dfe, 0x2fdfe, 0x1fdfe, 0x00001,
    0x00002, 0x00004, 0x00008, 0x00010, 0x00020, 0x00040, 0x00080, 0x00100, 0x00200,
];

/// A wire mask that did not survive a round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelftestMismatch {
    pub bits: AddrBits,
    pub original: u32,
    pub address: u32,
    pub reverted: u32,
}

/// Round-trip the walking-bit vectors for both densities through bank 0
///
/// Returns every vector whose reverted mask differs from the original; an
/// empty result means the conversion code is consistent.
pub fn selftest() -> Vec<SelftestMismatch> {
    let vectors = SELFTEST_1MX4
        .iter()
        .map(|&v| (AddrBits::BITS_20, v))
        .chain(SELFTEST_256KX4.iter().map(|&v| (AddrBits::BITS_18, v)));

    let mut mismatches = Vec::new();
    for (bits, original) in vectors {
        let address = to_address(0, original, bits);
        let reverted = to_wire_mask(address, bits);
        if reverted != original {
            log::error!(
                "conversion failed: original={:06x} {} reverted={:06x} {} addr={:08x}",
                original,
                format_bits(bits.get(), original),
                reverted,
                format_bits(bits.get(), reverted),
                address
            );
            mismatches.push(SelftestMismatch {
                bits,
                original,
                address,
                reverted,
            });
        }
    }
    mismatches
}

#[cfg(test)]
mod tests;
