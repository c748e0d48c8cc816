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

//! Capability probe tests

use super::*;
use crate::core::sim::SimBoard;

mod capability;
mod register;

pub fn run(board: &mut SimBoard) -> ProbeReport {
    let config = DiagConfig::default();
    let bits = board.addrbits();
    CapabilityProbe::new(&config, bits).run(board)
}

#[test]
fn test_threshold() {
    assert!(beats(1000, 950, 4));
    assert!(!beats(1000, 960, 4));
    assert!(!beats(1000, 1000, 4));
    assert!(!beats(1000, 1100, 4));
    assert!(!beats(0, 0, 4));
}

#[test]
fn test_pattern_neighbours_differ() {
    let pattern = static_column_pattern();
    assert_eq!(pattern[0], 0x1111_1111);
    assert_eq!(pattern[14], 0xFFFF_FFFF);
    assert_eq!(pattern[15], 0x1111_1111);
    for pair in pattern.windows(2) {
        let diff = pair[0] ^ pair[1];
        for nibble in 0..NIBBLES {
            assert_ne!((diff >> (nibble * 4)) & 0xF, 0);
        }
    }
}
