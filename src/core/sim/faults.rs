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

//! Fault injection plan
//!
//! A `FaultPlan` lists physical defects to emulate. It is compiled into a
//! per-bank form once, when handed to the board, so the access path only
//! does a handful of mask operations.
//!
//! # Example
//!
//! ```
//! use zipdiag::core::sim::FaultPlan;
//!
//! let plan = FaultPlan::new()
//!     .stuck0(1, 13)     // bank 1, data bit 13 always reads 0
//!     .floating(2, 4)    // bank 2, data bit 4 reads noise
//!     .wire(3, 5, true)  // bank 3, address wire A5 stuck high
//!     .bad_cell(0, 6);   // one bad cell in bank 0, nibble 6
//!
//! assert_eq!(plan.data_faults().len(), 2);
//! ```

use crate::core::error::{DiagError, Result};
use crate::core::translate::{AddrBits, BANK_COUNT, NIBBLES};
use std::collections::HashMap;

/// How a data line misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFaultKind {
    /// Always reads 0
    Stuck0,
    /// Always reads 1
    Stuck1,
    /// Reads the stored bit XOR noise
    Floating,
    /// Not driven on reads; the bus keeps its previous level
    Open,
}

/// Defect on one data bit of one bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFault {
    pub bank: usize,
    pub bit: u8,
    pub kind: DataFaultKind,
}

/// Module address wire stuck at a level
///
/// Affects both the RAS and CAS halves of the wire mask, for the modules
/// selected by `nibbles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFault {
    pub bank: usize,
    pub wire: u8,
    pub value: bool,
    pub nibbles: u8,
}

/// One defective storage cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFault {
    pub bank: usize,
    /// Wire mask of the cell
    pub mask: u32,
    /// Data bit (0-31)
    pub bit: u8,
    pub value: bool,
}

/// Wire mask used for cells added with [`FaultPlan::bad_cell`]
pub const DEFAULT_BAD_CELL_MASK: u32 = 0x0_0155;

/// Defects to emulate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    data: Vec<DataFault>,
    address: Vec<AddressFault>,
    cells: Vec<CellFault>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, bank: usize, bit: u8, kind: DataFaultKind) -> Self {
        self.data.push(DataFault { bank, bit, kind });
        self
    }

    pub fn stuck0(self, bank: usize, bit: u8) -> Self {
        self.data(bank, bit, DataFaultKind::Stuck0)
    }

    pub fn stuck1(self, bank: usize, bit: u8) -> Self {
        self.data(bank, bit, DataFaultKind::Stuck1)
    }

    pub fn floating(self, bank: usize, bit: u8) -> Self {
        self.data(bank, bit, DataFaultKind::Floating)
    }

    pub fn open(self, bank: usize, bit: u8) -> Self {
        self.data(bank, bit, DataFaultKind::Open)
    }

    /// Stick an address wire for every module in the bank
    pub fn wire(self, bank: usize, wire: u8, value: bool) -> Self {
        self.wire_nibbles(bank, wire, value, 0xFF)
    }

    /// Stick an address wire for the modules selected by `nibbles`
    pub fn wire_nibbles(mut self, bank: usize, wire: u8, value: bool, nibbles: u8) -> Self {
        self.address.push(AddressFault {
            bank,
            wire,
            value,
            nibbles,
        });
        self
    }

    pub fn cell(mut self, fault: CellFault) -> Self {
        self.cells.push(fault);
        self
    }

    /// Add a stuck-at-0 cell in the low bit of a nibble
    pub fn bad_cell(self, bank: usize, nibble: usize) -> Self {
        self.cell(CellFault {
            bank,
            mask: DEFAULT_BAD_CELL_MASK,
            bit: (nibble * 4) as u8,
            value: false,
        })
    }

    pub fn data_faults(&self) -> &[DataFault] {
        &self.data
    }

    pub fn address_faults(&self) -> &[AddressFault] {
        &self.address
    }

    pub fn cell_faults(&self) -> &[CellFault] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.address.is_empty() && self.cells.is_empty()
    }

    /// Check that a board of the given density can emulate every entry
    ///
    /// # Errors
    ///
    /// Returns `DiagError::Config` naming the first entry that is out of
    /// range: a bank past 3, a data bit past 31 or an address wire the
    /// modules do not have.
    pub fn check(&self, addrbits: AddrBits) -> Result<()> {
        let cas = addrbits.cas_bits();
        if let Some(f) = self.data.iter().find(|f| f.bank >= BANK_COUNT || f.bit >= 32) {
            return Err(DiagError::Config(format!(
                "data fault on bank {} bit {} is out of range",
                f.bank, f.bit
            )));
        }
        if let Some(f) = self
            .address
            .iter()
            .find(|f| f.bank >= BANK_COUNT || f.wire as u32 >= cas)
        {
            return Err(DiagError::Config(format!(
                "address wire A{} on bank {} does not exist on {} modules (A0-A{})",
                f.wire,
                f.bank,
                addrbits,
                cas - 1
            )));
        }
        if let Some(f) = self.cells.iter().find(|f| f.bank >= BANK_COUNT || f.bit >= 32) {
            return Err(DiagError::Config(format!(
                "cell fault on bank {} bit {} is out of range",
                f.bank, f.bit
            )));
        }
        Ok(())
    }

    /// Fold the plan into per-bank masks
    ///
    /// Out-of-range entries are dropped with a warning.
    pub(super) fn compile(&self, addrbits: AddrBits) -> [BankFaults; BANK_COUNT] {
        let mut banks: [BankFaults; BANK_COUNT] = Default::default();
        let cas = addrbits.cas_bits();
        if let Err(e) = self.check(addrbits) {
            log::warn!("Ignoring fault: {}", e);
        }

        for f in self.data.iter().filter(|f| f.bank < BANK_COUNT && f.bit < 32) {
            let b = &mut banks[f.bank];
            let bit = 1u32 << f.bit;
            match f.kind {
                DataFaultKind::Stuck0 => b.stuck0 |= bit,
                DataFaultKind::Stuck1 => b.stuck1 |= bit,
                DataFaultKind::Floating => b.floating |= bit,
                DataFaultKind::Open => b.open |= bit,
            }
        }

        for f in self
            .address
            .iter()
            .filter(|f| f.bank < BANK_COUNT && (f.wire as u32) < cas)
        {
            let b = &mut banks[f.bank];
            let bits = (1u32 << f.wire) | (1u32 << (f.wire as u32 + cas));
            for nibble in 0..NIBBLES {
                if f.nibbles & (1 << nibble) == 0 {
                    continue;
                }
                if f.value {
                    b.wire_or[nibble] |= bits;
                } else {
                    b.wire_and[nibble] &= !bits;
                }
            }
            b.has_wire = true;
        }

        for f in self.cells.iter().filter(|f| f.bank < BANK_COUNT && f.bit < 32) {
            let entry = banks[f.bank]
                .cells
                .entry(f.mask & addrbits.mask())
                .or_insert((0, 0));
            let bit = 1u32 << f.bit;
            if f.value {
                entry.1 |= bit;
            } else {
                entry.0 |= bit;
            }
        }

        banks
    }
}

/// Compiled faults of one bank
#[derive(Debug, Clone)]
pub(super) struct BankFaults {
    pub stuck0: u32,
    pub stuck1: u32,
    pub floating: u32,
    pub open: u32,
    pub has_wire: bool,
    pub wire_and: [u32; NIBBLES],
    pub wire_or: [u32; NIBBLES],
    /// Wire mask -> (bits forced low, bits forced high)
    pub cells: HashMap<u32, (u32, u32)>,
}

impl Default for BankFaults {
    fn default() -> Self {
        Self {
            stuck0: 0,
            stuck1: 0,
            floating: 0,
            open: 0,
            has_wire: false,
            wire_and: [u32::MAX; NIBBLES],
            wire_or: [0; NIBBLES],
            cells: HashMap::new(),
        }
    }
}

impl BankFaults {
    /// Wire mask the module driving `nibble` actually decodes
    #[inline(always)]
    pub fn effective_mask(&self, mask: u32, nibble: usize) -> u32 {
        (mask & self.wire_and[nibble]) | self.wire_or[nibble]
    }

    /// Apply bad cells to a stored word
    #[inline(always)]
    pub fn cell_value(&self, mask: u32, stored: u32) -> u32 {
        match self.cells.get(&mask) {
            Some(&(low, high)) => (stored & !low) | high,
            None => stored,
        }
    }

    /// Apply data-line faults to a word leaving the modules
    #[inline(always)]
    pub fn drive(&self, word: u32, noise: u32, latch: u32) -> u32 {
        let word = (word & !self.stuck0) | self.stuck1;
        let word = word ^ (noise & self.floating);
        (word & !self.open) | (latch & self.open)
    }
}

/// Deterministic noise source for floating lines
#[derive(Debug, Clone)]
pub(super) struct Noise(u32);

impl Noise {
    pub fn new(seed: u32) -> Self {
        Noise(seed.max(1))
    }

    /// xorshift32
    #[inline(always)]
    pub fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}
