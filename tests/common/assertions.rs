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

//! Custom assertions for fault isolation results

use zipdiag::core::dataline::DataLineReport;
use zipdiag::core::socket::sockets_for_bank;
use zipdiag::core::status::BitStatus;
use zipdiag::core::translate::NIBBLES;

/// Assert every tested pin of a bank reads Good
#[allow(dead_code)]
pub fn assert_bank_good(report: &DataLineReport, bank: usize) {
    for nibble in 0..NIBBLES {
        if let Some(pins) = report.status(bank, nibble) {
            assert!(
                pins.iter().all(|&s| s == BitStatus::Good),
                "bank {} nibble {}: {:?}",
                bank,
                nibble,
                pins
            );
        }
    }
}

/// Assert exactly one pin of a bank carries `expected`, the one wired to
/// CPU data bit `bit`, and every other pin reads Good
#[allow(dead_code)]
pub fn assert_single_pin(report: &DataLineReport, bank: usize, bit: u8, expected: BitStatus) {
    for socket in sockets_for_bank(bank) {
        let pins = report
            .status(bank, socket.nibble)
            .unwrap_or_else(|| panic!("{} was not tested", socket.label));
        for (io, &status) in pins.iter().enumerate() {
            let want = if socket.pins[io] == bit {
                expected
            } else {
                BitStatus::Good
            };
            assert_eq!(
                status, want,
                "{} IO{} (D{}) mismatch",
                socket.label,
                io + 1,
                socket.pins[io]
            );
        }
    }
}
