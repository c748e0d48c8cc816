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

//! Platform layer tests
//!
//! Uses a recording platform that logs every state change so acquisition
//! and release order can be checked exactly.

use super::*;
use crate::core::error::DiagError;
use std::collections::HashMap;

mod preflight;

/// Platform that records state transitions
pub struct RecordingPlatform {
    pub events: Vec<&'static str>,
    pub cache: bool,
    pub mmu: bool,
    pub supervisor: bool,
    pub interrupt_depth: i32,
    pub control: u8,
    pub pending_control: Option<(u8, u32)>,
    /// Reads before a control write becomes visible
    pub control_latency: u32,
    /// Control writes are ignored
    pub control_stuck: bool,
    pub version: u8,
    pub tools: Vec<String>,
    pub sections: Vec<(&'static str, u32)>,
    pub memory: HashMap<u32, u32>,
    pub memory_accesses: u32,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            cache: true,
            mmu: true,
            supervisor: false,
            interrupt_depth: 0,
            control: 0x1B,
            pending_control: None,
            control_latency: 0,
            control_stuck: false,
            version: 0x0D,
            tools: Vec::new(),
            sections: vec![("sp", 0x0000_8000), ("pc", 0x0001_2000), ("rodata", 0x0001_4000)],
            memory: HashMap::new(),
            memory_accesses: 0,
        }
    }
}

impl Platform for RecordingPlatform {
    fn read32(&mut self, addr: u32) -> u32 {
        self.memory_accesses += 1;
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.memory_accesses += 1;
        self.memory.insert(addr, value);
    }

    fn flush_cache_line(&mut self, _addr: u32, _len: usize) {
        self.events.push("flush");
    }

    fn set_data_cache(&mut self, enabled: bool) -> bool {
        self.events.push(if enabled { "cache on" } else { "cache off" });
        std::mem::replace(&mut self.cache, enabled)
    }

    fn set_mmu(&mut self, enabled: bool) -> bool {
        self.events.push(if enabled { "mmu on" } else { "mmu off" });
        std::mem::replace(&mut self.mmu, enabled)
    }

    fn set_supervisor(&mut self, supervisor: bool) -> bool {
        self.events.push(if supervisor { "super" } else { "user" });
        std::mem::replace(&mut self.supervisor, supervisor)
    }

    fn mask_interrupts(&mut self) {
        self.events.push("mask");
        self.interrupt_depth += 1;
    }

    fn unmask_interrupts(&mut self) {
        self.events.push("unmask");
        self.interrupt_depth -= 1;
    }

    fn ticks(&mut self) -> u64 {
        0
    }

    fn tick_hz(&self) -> u64 {
        1_000_000_000
    }

    fn read_control(&mut self) -> u8 {
        if let Some((value, remaining)) = self.pending_control {
            if remaining == 0 {
                self.control = value;
                self.pending_control = None;
            } else {
                self.pending_control = Some((value, remaining - 1));
            }
        }
        self.control
    }

    fn write_control(&mut self, value: u8) {
        if !self.control_stuck {
            self.pending_control = Some((value, self.control_latency));
        }
    }

    fn controller_version(&mut self) -> u8 {
        self.version
    }

    fn cpu(&self) -> CpuInfo {
        CpuInfo {
            model: 68030,
            burst: true,
            mmu: self.mmu,
        }
    }

    fn running_tools(&self) -> Vec<String> {
        self.tools.clone()
    }

    fn resident_sections(&self) -> Vec<(&'static str, u32)> {
        self.sections.clone()
    }

    fn alloc_scratch(&mut self, words: usize) -> crate::core::error::Result<Vec<u32>> {
        Err(DiagError::AllocationFailed { bytes: words * 4 })
    }
}
