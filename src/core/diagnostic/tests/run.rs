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
use crate::core::platform::ModuleType;

#[test]
fn test_selection_default() {
    let none = TestSelection::default().or_default();
    assert_eq!(none, TestSelection::all());

    let probe_only = TestSelection {
        probe: true,
        ..Default::default()
    };
    let resolved = probe_only.or_default();
    assert!(resolved.data && resolved.address && resolved.cell && resolved.probe);

    let cell_only = TestSelection {
        cell: true,
        ..Default::default()
    };
    assert_eq!(cell_only.or_default(), cell_only);
}

#[test]
fn test_clean_run() {
    let mut diag = small_diag(FaultPlan::new());
    let mut ticks = 0;
    let report = diag.run(TestSelection::default(), |_| ticks += 1).unwrap();

    assert!(report.data.as_ref().unwrap().all_good());
    assert_eq!(report.address.as_ref().unwrap().errors, 0);
    assert!(report.cell.as_ref().unwrap().all_good());
    assert!(report.probe.is_none());
    assert!(report.cell_error.is_none());
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.cpu.model, 68030);
    assert_eq!(ticks, 16);
}

#[test]
fn test_error_count_is_sum() {
    let mut diag = small_diag(FaultPlan::new().stuck0(2, 9));
    let report = diag.run(TestSelection::all(), |_| {}).unwrap();

    let data = report.data.as_ref().unwrap().errors;
    let address = report.address.as_ref().unwrap().errors;
    let cell = report.cell.as_ref().unwrap().errors;
    assert_eq!(data, 1);
    assert!(address > 0);
    assert_eq!(cell, 256);
    assert_eq!(report.error_count(), data + address + cell);
}

#[test]
fn test_cell_allocation_failure_isolated() {
    let mut diag = small_diag(FaultPlan::new().stuck1(1, 0));
    diag.platform_mut().set_scratch_available(false);

    let report = diag.run(TestSelection::all(), |_| {}).unwrap();

    assert!(report.cell.is_none());
    assert!(report.cell_error.as_ref().unwrap().contains("4096"));
    assert_eq!(report.data.as_ref().unwrap().errors, 1);
    assert!(report.address.is_some());
}

#[test]
fn test_probe_annotates_address_report() {
    let mut diag = small_diag(FaultPlan::new());
    let selection = TestSelection {
        address: true,
        probe: true,
        ..Default::default()
    };
    let report = diag.run(selection, |_| {}).unwrap();

    let probe = report.probe.as_ref().unwrap();
    assert_eq!(probe.module_type, ModuleType::StaticColumn);
    assert_eq!(
        report.address.as_ref().unwrap().module_type,
        Some(ModuleType::StaticColumn)
    );
    assert!(report.data.is_none());
    assert!(report.cell.is_none());
}

#[test]
fn test_state_left_as_found() {
    let mut diag = small_diag(FaultPlan::new());
    let control = diag.platform_mut().read_control();
    let selection = TestSelection {
        probe: true,
        ..TestSelection::all()
    };
    diag.run(selection, |_| {}).unwrap();

    let mut board = diag.into_platform();
    assert_eq!(board.interrupt_depth(), 0);
    assert!(board.data_cache_enabled());
    assert!(!board.supervisor());
    assert!(!board.probe_trigger());
    assert_eq!(board.stats().unmasked_fast_accesses, 0);
    assert_eq!(board.read_control(), control);
}

#[test]
fn test_translation_off_while_testing() {
    let mut diag = small_diag(FaultPlan::new().stuck0(1, 4));
    diag.platform_mut().set_mmu(true);
    let selection = TestSelection {
        probe: true,
        ..TestSelection::all()
    };

    let report = diag.run(selection, |_| {}).unwrap();
    assert!(report.cpu.mmu);
    assert_eq!(report.data.as_ref().unwrap().errors, 1);
    diag.strobe().unwrap();

    let board = diag.into_platform();
    assert!(board.stats().fast_reads > 0);
    assert_eq!(board.stats().translated_fast_accesses, 0);
    assert!(board.mmu_enabled());
}
