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

//! Emulated board tests
//!
//! - Region decoding and plain readback
//! - Each fault kind as seen through the bus
//! - Cache masking and flushing
//! - Cycle costs for random, page and burst accesses

use super::*;


/// Lowest address of a bank on a default (1Mx4) board
pub fn base(bank: usize) -> u32 {
    crate::core::translate::bank_base(bank, AddrBits::BITS_20)
}
