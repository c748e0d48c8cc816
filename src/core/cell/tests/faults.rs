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
fn test_single_bad_cell() {
    let mut board = small_board().with_faults(FaultPlan::new().bad_cell(1, 6));
    let (result, _) = run(&mut board, &DiagConfig::default());
    let report = result.unwrap();

    for bank in 0..BANK_COUNT {
        for nibble in 0..NIBBLES {
            let expected = if (bank, nibble) == (1, 6) {
                CellStatus::Bad
            } else {
                CellStatus::Good
            };
            assert_eq!(report.status(bank, nibble), expected, "{}.{}", bank, nibble);
        }
    }
    assert_eq!(report.errors, 1);
}

#[test]
fn test_stuck_bit_fails_every_block() {
    let mut board = small_board().with_faults(FaultPlan::new().stuck1(3, 13));
    let (result, _) = run(&mut board, &DiagConfig::default());
    let report = result.unwrap();

    assert_eq!(report.status(3, 3), CellStatus::Bad);
    assert_eq!(report.cells[3].iter().filter(|&&c| c == CellStatus::Bad).count(), 1);
    // 1MB bank in 4KB blocks
    assert_eq!(report.errors, 256);
    assert_eq!(report.early_exits, 0);
}

#[test]
fn test_early_exit_when_bank_dead() {
    let plan = (0..8u8).fold(FaultPlan::new(), |plan, n| plan.stuck0(2, n * 4));
    let mut board = small_board().with_faults(plan);
    let (result, progress) = run(&mut board, &DiagConfig::default());
    let report = result.unwrap();

    assert_eq!(report.cells[2], [CellStatus::Bad; NIBBLES]);
    assert_eq!(report.early_exits, 1);
    assert_eq!(report.errors, 1);
    assert_eq!(progress.iter().filter(|p| p.bank == 2).count(), 1);
    assert_eq!(progress.len(), 13);
    for bank in [0, 1, 3] {
        assert_eq!(report.cells[bank], [CellStatus::Good; NIBBLES]);
    }
}

#[test]
fn test_progress_reports_bad_modules() {
    let mut board = small_board().with_faults(FaultPlan::new().stuck0(0, 20));
    let (_, progress) = run(&mut board, &DiagConfig::default());

    let first = progress.first().unwrap();
    assert_eq!(first.bank, 0);
    assert_eq!(first.cells[5], CellStatus::Bad);
    assert_eq!(first.cells[4], CellStatus::Good);
}
