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

use super::*;

#[test]
fn test_register_restored() {
    let mut board = SimBoard::default();
    board.set_control_latency(7);
    let before = board.read_control();

    let report = run(&mut board);

    assert!(report.error.is_none());
    assert_eq!(board.read_control(), before);
}

#[test]
fn test_pattern_area_restored() {
    let mut board = SimBoard::default();
    board.set_fast_page_module(2, 0);
    let before: Vec<Vec<u32>> = (0..BANK_COUNT).map(|b| board.bank_contents(b).to_vec()).collect();

    run(&mut board);

    for (bank, contents) in before.iter().enumerate() {
        assert!(board.bank_contents(bank) == contents.as_slice(), "bank {} changed", bank);
    }
    assert_eq!(board.interrupt_depth(), 0);
    assert!(board.data_cache_enabled());
}

#[test]
fn test_register_timeout_is_reported() {
    let mut board = SimBoard::default();
    board.set_control_latency(5000);

    let report = run(&mut board);

    assert!(report.error.is_some());
    assert_eq!(report.module_type, ModuleType::Unknown);
    assert!(report.timings.is_empty());
    assert_eq!(board.stats().fast_reads, 0);
}
