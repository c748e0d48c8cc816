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

//! Shared classification types
//!
//! Every tester reduces raw readbacks to one of these enums. They are plain
//! data; nothing here touches the platform.

use crate::core::translate::{BANK_COUNT, MAX_CAS_BITS, NIBBLES};
use serde::Serialize;
use std::fmt;

/// Classification of a single data bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BitStatus {
    Good,
    Stuck0,
    Stuck1,
    Floating,
}

impl BitStatus {
    /// Short marker used in tables
    pub fn symbol(self) -> &'static str {
        match self {
            BitStatus::Good => "Good",
            BitStatus::Stuck0 => "0",
            BitStatus::Stuck1 => "1",
            BitStatus::Floating => "?",
        }
    }
}

impl fmt::Display for BitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Classification of one module's memory cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CellStatus {
    #[default]
    Good,
    Bad,
}

/// Classification of one address wire as seen by one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WireStatus {
    Good,
    /// Some mismatches, below the threshold
    Suspect,
    Bad,
}

impl WireStatus {
    pub fn symbol(self) -> &'static str {
        match self {
            WireStatus::Good => "Gd",
            WireStatus::Suspect => "?",
            WireStatus::Bad => "!",
        }
    }
}

/// Running aggregates over every readback of a data-line measurement
///
/// `or` collects bits ever seen high, `and` bits always seen high and `diff`
/// bits that ever differed from what was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAggregate {
    pub or: u32,
    pub and: u32,
    pub diff: u32,
}

impl Default for LineAggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAggregate {
    pub fn new() -> Self {
        Self {
            or: 0,
            and: 0xFFFF_FFFF,
            diff: 0,
        }
    }

    /// Fold one readback into the aggregates
    #[inline]
    pub fn record(&mut self, written: u32, read: u32) {
        self.or |= read;
        self.and &= read;
        self.diff |= read ^ written;
    }

    /// Every bit of interest has already toggled both ways and mismatched
    ///
    /// Nothing further can change the classification of those bits.
    #[inline]
    pub fn saturated(&self, bitvals: u32) -> bool {
        (self.diff & bitvals) == bitvals && (self.and & bitvals) == 0 && (self.or & bitvals) == bitvals
    }

    /// Classify the bits selected by `bitvals`
    ///
    /// Priority: Stuck0, then Stuck1, then Floating. A multi-bit selection is
    /// Stuck0 only when every selected bit read low; callers classify one pin
    /// at a time.
    pub fn classify(&self, bitvals: u32) -> BitStatus {
        if self.or & bitvals == 0 {
            BitStatus::Stuck0
        } else if self.and & bitvals != 0 {
            BitStatus::Stuck1
        } else if self.diff & bitvals != 0 {
            BitStatus::Floating
        } else {
            BitStatus::Good
        }
    }
}

/// Per (bank, wire bit, nibble) mismatch counters for the address-line test
///
/// Only the CAS half of the wire is indexed; RAS carries the same pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadCountTable {
    counts: [[[u16; NIBBLES]; MAX_CAS_BITS]; BANK_COUNT],
}

impl Default for BadCountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BadCountTable {
    pub fn new() -> Self {
        Self {
            counts: [[[0; NIBBLES]; MAX_CAS_BITS]; BANK_COUNT],
        }
    }

    /// Credit one mismatch, saturating at `u16::MAX`
    #[inline]
    pub fn credit(&mut self, bank: usize, bit: usize, nibble: usize) {
        let slot = &mut self.counts[bank][bit][nibble];
        *slot = slot.saturating_add(1);
    }

    #[inline]
    pub fn get(&self, bank: usize, bit: usize, nibble: usize) -> u16 {
        self.counts[bank][bit][nibble]
    }

    /// Total credits across a bank
    pub fn bank_total(&self, bank: usize) -> u32 {
        self.counts[bank]
            .iter()
            .flat_map(|bits| bits.iter())
            .map(|&c| c as u32)
            .sum()
    }

    /// Threshold one counter
    pub fn status(&self, bank: usize, bit: usize, nibble: usize, threshold: u16) -> WireStatus {
        match self.get(bank, bit, nibble) {
            0 => WireStatus::Good,
            n if n < threshold => WireStatus::Suspect,
            _ => WireStatus::Bad,
        }
    }
}
