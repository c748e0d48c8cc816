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

//! Socket table invariant tests

use super::super::*;

#[test]
fn test_zip_table_complete_per_bank() {
    assert_eq!(verify_table(&ZIP_SOCKETS), None);
    for bank in 0..BANK_COUNT {
        let mut nibbles: Vec<usize> = sockets_for_bank(bank).map(|s| s.nibble).collect();
        nibbles.sort_unstable();
        assert_eq!(nibbles, (0..NIBBLES).collect::<Vec<_>>(), "bank {}", bank);
    }
}

#[test]
fn test_dip_table_complete() {
    assert_eq!(verify_table(&DIP_SOCKETS), None);
    assert!(DIP_SOCKETS.iter().all(|s| s.bank == DIP_BANK));
}

#[test]
fn test_verify_table_detects_duplicate() {
    let mut table = ZIP_SOCKETS;
    table[31].nibble = 1;
    assert_eq!(verify_table(&table), Some((0, 0)));
}

#[test]
fn test_zip_pins_follow_nibble() {
    for s in ZIP_SOCKETS.iter() {
        assert_eq!(s.bitvals(), 0xF << (s.nibble * 4), "{}", s.label);
    }
}

#[test]
fn test_dip_io3_io4_swapped() {
    for s in DIP_SOCKETS.iter() {
        assert_eq!(s.bitvals(), 0xF << (s.nibble * 4), "{}", s.label);
        if s.nibble != 7 {
            assert_eq!(s.pins[2] as usize, s.nibble * 4 + 3);
            assert_eq!(s.pins[3] as usize, s.nibble * 4 + 2);
        }
    }
}

#[test]
fn test_positions() {
    for s in ZIP_SOCKETS.iter() {
        let expected = if matches!(s.nibble, 7 | 6 | 3 | 2) {
            SocketPosition::Left
        } else {
            SocketPosition::Right
        };
        assert_eq!(s.position, expected, "{}", s.label);
    }
}

#[test]
fn test_find() {
    assert_eq!(find(3, 7).map(|s| s.label), Some("U881"));
    assert_eq!(find(1, 3).map(|s| s.label), Some("U861"));
    assert_eq!(find(2, 0).map(|s| s.label), Some("U866"));
    assert!(find(4, 0).is_none());
}

#[test]
fn test_pin_mask() {
    let s = &DIP_SOCKETS[1];
    assert_eq!(s.pin_mask(2), 1 << 27);
    assert_eq!(s.pin_mask(3), 1 << 26);
}
