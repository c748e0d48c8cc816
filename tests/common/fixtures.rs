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

//! Boards and sessions for common test scenarios

use zipdiag::core::config::DiagConfig;
use zipdiag::core::diagnostic::Diagnostic;
use zipdiag::core::platform::ModeBits;
use zipdiag::core::sim::{FaultPlan, SimBoard};

/// 1Mx4 static column board with the given faults
#[allow(dead_code)]
pub fn board_1m(plan: FaultPlan) -> SimBoard {
    SimBoard::default().with_faults(plan)
}

/// 256Kx4 board with the given faults; a quarter of the cells to sweep
#[allow(dead_code)]
pub fn board_256k(plan: FaultPlan) -> SimBoard {
    SimBoard::new(ModeBits::RAMWIDTH | ModeBits::BURST).with_faults(plan)
}

/// Stock configuration with short data passes
#[allow(dead_code)]
pub fn quick_config() -> DiagConfig {
    let mut config = DiagConfig::default();
    config.data.passes = 64;
    config
}

/// Session over a board using [`quick_config`]
#[allow(dead_code)]
pub fn session(board: SimBoard) -> Diagnostic<SimBoard> {
    Diagnostic::new(board, quick_config())
}
