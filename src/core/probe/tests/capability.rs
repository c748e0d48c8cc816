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
fn test_static_column_board() {
    let mut board = SimBoard::default();
    let report = run(&mut board);

    assert!(report.error.is_none());
    assert_eq!(report.timings.len(), 4);
    assert!(report.burst_capable);
    assert!(report.page_capable);
    assert!(report.ticks(AccessMode::Burst).unwrap() < report.ticks(AccessMode::None).unwrap());
    assert_eq!(report.static_column, Some([[true; NIBBLES]; BANK_COUNT]));
    assert_eq!(report.module_type, ModuleType::StaticColumn);
    assert_eq!(report.configured, ModuleType::StaticColumn);
}

#[test]
fn test_fast_page_module() {
    let mut board = SimBoard::default();
    board.set_fast_page_module(1, 3);
    let report = run(&mut board);

    let sc = report.static_column.unwrap();
    assert!(!sc[1][3]);
    let good = sc.iter().flatten().filter(|&&ok| ok).count();
    assert_eq!(good, BANK_COUNT * NIBBLES - 1);
    assert_eq!(report.module_type, ModuleType::FastPage);
}

#[test]
fn test_no_burst_cpu() {
    let mut board = SimBoard::default();
    board.set_cpu_burst(false);
    let report = run(&mut board);

    assert!(!report.burst_capable);
    assert!(report.page_capable);
    assert!(report.static_column.is_none());
    assert_eq!(report.module_type, ModuleType::FastPage);
}

#[test]
fn test_nothing_faster() {
    let mut board = SimBoard::default();
    board.set_cpu_burst(false);
    board.set_page_cycles(false);
    let report = run(&mut board);

    assert!(!report.burst_capable);
    assert!(!report.page_capable);
    assert_eq!(report.module_type, ModuleType::Unknown);
}

#[test]
fn test_measure_directly() {
    let config = DiagConfig::default();
    let mut board = SimBoard::default();
    let probe = CapabilityProbe::new(&config, board.addrbits());
    let register = AccessModeRegister::save(&mut board, 100);
    let base = bank_base(0, board.addrbits());

    let none = probe.measure(&mut board, &register, AccessMode::None, base, 0x1000).unwrap();
    let both = probe.measure(&mut board, &register, AccessMode::Both, base, 0x1000).unwrap();
    assert!(none > 0);
    assert!(both < none);
    assert_eq!(board.interrupt_depth(), 0);
    assert_eq!(board.stats().unmasked_fast_accesses, 0);
}
