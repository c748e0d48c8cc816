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

//! Address decoding for the emulated board
//!
//! Only two kinds of RAM exist on the board: chip RAM at the bottom of the
//! address space and the four controller banks just below `FASTMEM_TOP`.
//! Everything else floats and returns whatever the bus last carried.

use super::SimBoard;
use crate::core::translate::bank_of;

/// Memory region identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimRegion {
    /// Chip RAM (2MB, never faulty, never cached)
    ChipRam,
    /// Controller bank
    FastMem(usize),
    /// Nothing decodes here
    Unmapped,
}

impl SimBoard {
    /// Chip RAM start address
    pub(super) const CHIP_START: u32 = 0x0000_0000;

    /// Chip RAM end address (inclusive)
    pub(super) const CHIP_END: u32 = 0x001F_FFFF;

    /// Identify the region an address belongs to
    ///
    /// # Example
    ///
    /// ```
    /// use zipdiag::core::sim::{SimBoard, SimRegion};
    ///
    /// let board = SimBoard::default();
    ///
    /// assert_eq!(board.identify_region(0x0001_0000), SimRegion::ChipRam);
    /// assert_eq!(board.identify_region(0x07FF_FFFC), SimRegion::FastMem(0));
    /// assert_eq!(board.identify_region(0x0700_0000), SimRegion::FastMem(3));
    /// assert_eq!(board.identify_region(0x00F8_0000), SimRegion::Unmapped);
    /// ```
    pub fn identify_region(&self, addr: u32) -> SimRegion {
        if (Self::CHIP_START..=Self::CHIP_END).contains(&addr) {
            SimRegion::ChipRam
        } else if let Some(bank) = bank_of(addr, self.addrbits) {
            SimRegion::FastMem(bank)
        } else {
            SimRegion::Unmapped
        }
    }
}
