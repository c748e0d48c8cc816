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

//! Address line isolator tests

use super::*;
use crate::core::sim::{FaultPlan, SimBoard};


pub fn run(board: &mut SimBoard, config: &DiagConfig) -> AddressLineReport {
    let bits = board.addrbits();
    AddressLineFaultIsolator::new(config, bits).run(board)
}

/// Circular distance between two CAS positions
pub fn distance(a: usize, b: usize, cas: usize) -> usize {
    let d = (a + cas - b) % cas;
    d.min(cas - d)
}

/// Stuck wire is Bad in the given nibbles, carries the most credit there
/// and wires three or more positions away stay clean
pub fn assert_isolated(report: &AddressLineReport, bank: usize, wire: usize, nibbles: u8) {
    let cas = report.cas_bits as usize;
    for nibble in 0..NIBBLES {
        let counts: Vec<u16> = (0..cas).map(|b| report.badcount.get(bank, b, nibble)).collect();
        if nibbles & (1 << nibble) == 0 {
            assert!(counts.iter().all(|&c| c == 0), "nibble {} credited: {:?}", nibble, counts);
            continue;
        }
        assert_eq!(report.status(bank, wire, nibble), WireStatus::Bad, "nibble {}: {:?}", nibble, counts);
        assert_eq!(counts.iter().max(), Some(&counts[wire]), "nibble {}: {:?}", nibble, counts);
        for (b, &c) in counts.iter().enumerate() {
            if distance(b, wire, cas) >= 3 {
                assert_eq!(c, 0, "A{} nibble {}: {:?}", b, nibble, counts);
                assert_eq!(report.status(bank, b, nibble), WireStatus::Good);
            }
        }
    }
}
