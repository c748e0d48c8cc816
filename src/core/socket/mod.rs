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

//! Socket map
//!
//! Static tables describing where each x4 module sits on the board and which
//! CPU data bits its IO pins drive. The ZIP table covers all four banks; the
//! DIP table describes the alternative bank 0 population, where IO3 and IO4 are
//! swapped on every part except the top nibble.
//!
//! Rows are ordered the way they appear on the board, left column then right
//! column, so a reporter can print two sockets per line.
//!
//! # Example
//!
//! ```
//! use zipdiag::core::socket::{find, SocketPosition};
//!
//! let u850 = find(0, 0).unwrap();
//! assert_eq!(u850.label, "U850");
//! assert_eq!(u850.position, SocketPosition::Right);
//! assert_eq!(u850.bitvals(), 0x0000_000F);
//! ```

use crate::core::translate::{BANK_COUNT, NIBBLES};
use serde::Serialize;

/// Physical column of a socket on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SocketPosition {
    Left,
    Right,
    Bottom,
}

/// One memory module position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocketEntry {
    /// Board reference designator, e.g. "U881"
    pub label: &'static str,
    /// Controller bank (0-3)
    pub bank: usize,
    /// Data nibble (0-7) the module drives
    pub nibble: usize,
    pub position: SocketPosition,
    /// CPU data bit driven by IO1..IO4
    pub pins: [u8; 4],
}

impl SocketEntry {
    /// Mask of every data bit driven by this module
    #[inline]
    pub fn bitvals(&self) -> u32 {
        self.pins.iter().fold(0, |acc, &p| acc | (1 << p))
    }

    /// Mask of the data bit driven by one IO pin (0-based)
    #[inline]
    pub fn pin_mask(&self, io_pin: usize) -> u32 {
        1 << self.pins[io_pin]
    }
}

const fn zip(
    label: &'static str,
    bank: usize,
    nibble: usize,
    position: SocketPosition,
) -> SocketEntry {
    let base = (nibble * 4) as u8;
    SocketEntry {
        label,
        bank,
        nibble,
        position,
        pins: [base, base + 1, base + 2, base + 3],
    }
}

use SocketPosition::{Bottom, Left, Right};

/// ZIP module sockets, all banks
pub static ZIP_SOCKETS: [SocketEntry; 32] = [
    zip("U881", 3, 7, Left),
    zip("U879", 3, 5, Right),
    zip("U873", 2, 7, Left),
    zip("U871", 2, 5, Right),
    zip("U865", 1, 7, Left),
    zip("U863", 1, 5, Right),
    zip("U857", 0, 7, Left),
    zip("U855", 0, 5, Right),
    zip("U880", 3, 6, Left),
    zip("U878", 3, 4, Right),
    zip("U872", 2, 6, Left),
    zip("U870", 2, 4, Right),
    zip("U864", 1, 6, Left),
    zip("U862", 1, 4, Right),
    zip("U856", 0, 6, Left),
    zip("U854", 0, 4, Right),
    zip("U877", 3, 3, Left),
    zip("U875", 3, 1, Right),
    zip("U869", 2, 3, Left),
    zip("U867", 2, 1, Right),
    zip("U861", 1, 3, Left),
    zip("U859", 1, 1, Right),
    zip("U853", 0, 3, Left),
    zip("U851", 0, 1, Right),
    zip("U876", 3, 2, Left),
    zip("U874", 3, 0, Right),
    zip("U868", 2, 2, Left),
    zip("U866", 2, 0, Right),
    zip("U860", 1, 2, Left),
    zip("U858", 1, 0, Right),
    zip("U852", 0, 2, Left),
    zip("U850", 0, 0, Right),
];

/// DIP module sockets, bank 0 only
pub static DIP_SOCKETS: [SocketEntry; 8] = [
    SocketEntry { label: "U857D", bank: 0, nibble: 7, position: Bottom, pins: [28, 29, 30, 31] },
    SocketEntry { label: "U856D", bank: 0, nibble: 6, position: Bottom, pins: [24, 25, 27, 26] },
    SocketEntry { label: "U855D", bank: 0, nibble: 5, position: Bottom, pins: [20, 21, 23, 22] },
    SocketEntry { label: "U854D", bank: 0, nibble: 4, position: Bottom, pins: [16, 17, 19, 18] },
    SocketEntry { label: "U853D", bank: 0, nibble: 3, position: Bottom, pins: [12, 13, 15, 14] },
    SocketEntry { label: "U852D", bank: 0, nibble: 2, position: Bottom, pins: [8, 9, 11, 10] },
    SocketEntry { label: "U851D", bank: 0, nibble: 1, position: Bottom, pins: [4, 5, 7, 6] },
    SocketEntry { label: "U850D", bank: 0, nibble: 0, position: Bottom, pins: [0, 1, 3, 2] },
];

/// Bank populated by DIP parts when the DIP layout is selected
pub const DIP_BANK: usize = 0;

/// Find the ZIP socket for a (bank, nibble) position
pub fn find(bank: usize, nibble: usize) -> Option<&'static SocketEntry> {
    ZIP_SOCKETS
        .iter()
        .find(|s| s.bank == bank && s.nibble == nibble)
}

/// ZIP sockets belonging to one bank, in board order
pub fn sockets_for_bank(bank: usize) -> impl Iterator<Item = &'static SocketEntry> {
    ZIP_SOCKETS.iter().filter(move |s| s.bank == bank)
}

/// Check that every bank has exactly one socket per nibble
///
/// Returns the first offending (bank, nibble) pair, if any. A bank with a
/// missing nibble has no usable 32-bit word.
pub fn verify_table(table: &[SocketEntry]) -> Option<(usize, usize)> {
    let mut seen = [[0u8; NIBBLES]; BANK_COUNT];
    for s in table {
        seen[s.bank][s.nibble] += 1;
    }
    let banks: Vec<usize> = {
        let mut b: Vec<usize> = table.iter().map(|s| s.bank).collect();
        b.sort_unstable();
        b.dedup();
        b
    };
    for bank in banks {
        for nibble in 0..NIBBLES {
            if seen[bank][nibble] != 1 {
                return Some((bank, nibble));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests;
