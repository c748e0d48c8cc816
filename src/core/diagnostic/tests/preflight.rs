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
fn test_conflicting_tool_blocks_run() {
    let mut diag = small_diag(FaultPlan::new());
    diag.platform_mut().add_running_tool("Enforcer V37");

    let result = diag.run(TestSelection::all(), |_| {});

    assert!(matches!(result, Err(DiagError::ConflictingTool(_))));
    assert_eq!(diag.platform().stats().total(), 0);
}

#[test]
fn test_force_skips_tool_check() {
    let mut diag = small_diag(FaultPlan::new()).with_force(true);
    diag.platform_mut().add_running_tool("MuForce");

    let selection = TestSelection {
        data: true,
        ..Default::default()
    };
    assert!(diag.run(selection, |_| {}).is_ok());
}

#[test]
fn test_unsupported_controller() {
    let mut diag = small_diag(FaultPlan::new());
    diag.platform_mut().set_version(0x02);

    let result = diag.run(TestSelection::all(), |_| {});
    assert!(matches!(
        result,
        Err(DiagError::UnsupportedController { version: 0x02 })
    ));
    assert_eq!(diag.platform().stats().total(), 0);
}

#[test]
fn test_residency_checked_even_when_forced() {
    let mut diag = small_diag(FaultPlan::new()).with_force(true);
    diag.platform_mut().set_section("pc", 0x07F0_0000);

    let result = diag.run(TestSelection::all(), |_| {});
    assert!(matches!(result, Err(DiagError::UnsafeResidency(_))));
    assert_eq!(diag.platform().stats().total(), 0);
}

#[test]
fn test_map_and_strobe_run_preflight() {
    let mut diag = small_diag(FaultPlan::new());
    diag.platform_mut().add_running_tool("Enforcer");

    assert!(diag.map().is_err());
    assert!(diag.strobe().is_err());
    assert_eq!(diag.platform().stats().total(), 0);
}

#[test]
fn test_invalid_config_rejected_before_access() {
    let board = SimBoard::new(ModeBits::RAMWIDTH | ModeBits::BURST);
    let mut config = DiagConfig::default();
    config.cell.progress_stride = 0;
    let mut diag = Diagnostic::new(board, config);

    let cell_only = TestSelection {
        cell: true,
        ..Default::default()
    };
    assert!(matches!(diag.run(cell_only, |_| {}), Err(DiagError::Config(_))));
    assert_eq!(diag.platform().stats().total(), 0);
}

#[test]
fn test_zero_data_passes_rejected() {
    let board = SimBoard::new(ModeBits::RAMWIDTH | ModeBits::BURST).with_faults(FaultPlan::new());
    let mut config = DiagConfig::default();
    config.data.passes = 0;
    let mut diag = Diagnostic::new(board, config);

    let data_only = TestSelection {
        data: true,
        ..Default::default()
    };
    assert!(matches!(diag.run(data_only, |_| {}), Err(DiagError::Config(_))));
    assert!(matches!(diag.map(), Err(DiagError::Config(_))));
    assert_eq!(diag.platform().stats().total(), 0);
}
