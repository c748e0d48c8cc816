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

//! Data cache model
//!
//! Write-through with read allocation. Only fast memory is cacheable. A hit
//! returns the cached copy without a bus cycle, which is exactly what hides
//! a bad data line from a careless test.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct DataCache {
    enabled: bool,
    lines: HashMap<u32, u32>,
}

impl DataCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            lines: HashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switch the cache, returning the previous state
    ///
    /// Disabling also invalidates every entry.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if !enabled {
            self.lines.clear();
        }
        std::mem::replace(&mut self.enabled, enabled)
    }

    pub fn lookup(&self, addr: u32) -> Option<u32> {
        if self.enabled {
            self.lines.get(&addr).copied()
        } else {
            None
        }
    }

    /// Record a value fetched from memory
    pub fn fill(&mut self, addr: u32, value: u32) {
        if self.enabled {
            self.lines.insert(addr, value);
        }
    }

    /// Keep an existing entry coherent with a write
    pub fn write(&mut self, addr: u32, value: u32) {
        if let Some(entry) = self.lines.get_mut(&addr) {
            *entry = value;
        }
    }

    /// Drop every entry in `[addr, addr + len)`
    pub fn flush(&mut self, addr: u32, len: usize) {
        let end = addr.saturating_add(len as u32);
        if len <= 64 {
            let mut a = addr & !3;
            while a < end {
                self.lines.remove(&a);
                a += 4;
            }
        } else {
            self.lines.retain(|&a, _| a < addr || a >= end);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
