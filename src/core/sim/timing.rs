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

//! Access cost model
//!
//! The board clock advances by a fixed cost per bus cycle. Costs are in
//! nanoseconds and the counter runs at 1GHz, so one tick is one nanosecond.

/// Counter frequency of the emulated board
pub const TICK_HZ: u64 = 1_000_000_000;

/// Cost of each kind of bus cycle, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTiming {
    /// Any chip RAM cycle
    pub chip: u64,
    /// Fast memory cycle that opens a new row
    pub random: u64,
    /// Fast memory cycle in the already open row (page mode)
    pub page: u64,
    /// Second to fourth beat of a burst
    pub burst: u64,
    /// Extra cost added to every fast memory cycle
    pub penalty: u64,
}

impl Default for AccessTiming {
    fn default() -> Self {
        Self {
            chip: 280,
            random: 140,
            page: 80,
            burst: 40,
            penalty: 0,
        }
    }
}
