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

//! Data line detector tests
//!
//! - Clean board reports every pin Good
//! - Stuck and floating bits are pinned to the right socket and IO pin
//! - Open lines are caught by both disturb strategies
//! - DIP layout, cache strategies and state restoration

use super::*;
use crate::core::sim::{FaultPlan, SimBoard};
use crate::core::socket::find;


/// Config with a reduced pass count so debug builds stay quick
pub fn quick_config() -> DiagConfig {
    let mut config = DiagConfig::default();
    config.data.passes = 64;
    config.data.passes_thorough = 64;
    config
}

/// Socket and IO pin index driving a data bit of a bank
pub fn locate(bank: usize, bit: u8) -> (usize, usize) {
    let nibble = bit as usize / 4;
    let socket = find(bank, nibble).unwrap();
    let pin = socket.pins.iter().position(|&p| p == bit).unwrap();
    (nibble, pin)
}

pub fn run(board: &mut SimBoard, config: &DiagConfig) -> DataLineReport {
    let bits = board.addrbits();
    DataLineFaultDetector::new(config, bits).run(board)
}
