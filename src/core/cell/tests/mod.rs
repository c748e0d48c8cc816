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

//! Cell tester tests
//!
//! Run on 256Kx4 boards to keep the sweeps short.

use super::*;
use crate::core::platform::ModeBits;
use crate::core::sim::{FaultPlan, SimBoard};

mod faults;

pub fn small_board() -> SimBoard {
    SimBoard::new(ModeBits::RAMWIDTH | ModeBits::BURST)
}

pub fn run(board: &mut SimBoard, config: &DiagConfig) -> (Result<CellReport>, Vec<CellProgress>) {
    let bits = board.addrbits();
    let mut seen = Vec::new();
    let result = CellPatternTester::new(config, bits).run(board, |p| seen.push(p));
    (result, seen)
}
