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

//! Orchestration tests
//!
//! - Preflight gates every memory access
//! - Default selection, partial failures and error totals
//! - Map and strobe modes

use super::*;
use crate::core::platform::ModeBits;
use crate::core::sim::{FaultPlan, SimBoard};

mod preflight;
mod run;

/// 256Kx4 board with short data passes
pub fn small_diag(plan: FaultPlan) -> Diagnostic<SimBoard> {
    let board = SimBoard::new(ModeBits::RAMWIDTH | ModeBits::BURST).with_faults(plan);
    let mut config = DiagConfig::default();
    config.data.passes = 32;
    Diagnostic::new(board, config)
}
