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

//! Platform interface
//!
//! Everything the testers need from the machine they run on: raw longword
//! access to memory, cache and MMU control, supervisor state, interrupt
//! masking, a free-running counter and the memory controller's registers.
//!
//! The testers never touch hardware directly; they are generic over
//! [`Platform`]. [`crate::core::sim::SimBoard`] is the in-process
//! implementation used by the command-line tool and the tests.
//!
//! # Critical sections
//!
//! Timing-sensitive sequences run inside a [`CriticalSection`], which
//! acquires the requested resources in a fixed order and releases them in
//! reverse when dropped:
//!
//! ```text
//! acquire: data cache off -> MMU off -> supervisor -> interrupts masked
//! release: interrupts unmasked -> supervisor restored -> MMU -> data cache
//! ```

pub mod mode;
pub mod preflight;
pub mod section;

pub use mode::{AccessMode, AccessModeRegister, MemoryConfig, ModeBits, ModuleType, RefreshRate};
pub use preflight::preflight;
pub use section::{CriticalSection, SectionFlags};

use crate::core::error::Result;
use serde::Serialize;

/// CPU identification reported by bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuInfo {
    /// Processor model number, e.g. 68030
    pub model: u32,
    /// Burst fills are enabled in the CPU cache control register
    pub burst: bool,
    /// An MMU translation table is active
    pub mmu: bool,
}

/// Machine services used by the testers
///
/// Memory accessors are infallible: a diagnostic observes whatever the bus
/// returns. State setters return the previous state so callers can restore
/// it exactly.
pub trait Platform {
    /// Read one longword
    fn read32(&mut self, addr: u32) -> u32;

    /// Write one longword
    fn write32(&mut self, addr: u32, value: u32);

    /// Sequential read of `buf.len()` longwords starting at `addr`
    ///
    /// Implementations may use burst or page cycles when the controller
    /// allows them.
    fn read_burst(&mut self, addr: u32, buf: &mut [u32]) {
        for (i, word) in buf.iter_mut().enumerate() {
            *word = self.read32(addr + (i as u32) * 4);
        }
    }

    /// Sequential write of `data` starting at `addr`
    fn write_burst(&mut self, addr: u32, data: &[u32]) {
        for (i, &word) in data.iter().enumerate() {
            self.write32(addr + (i as u32) * 4, word);
        }
    }

    /// Push any cached copy of `[addr, addr + len)` out to memory and drop it
    fn flush_cache_line(&mut self, addr: u32, len: usize);

    /// Enable or disable the data cache, returning the previous state
    fn set_data_cache(&mut self, enabled: bool) -> bool;

    /// Enable or disable MMU translation, returning the previous state
    fn set_mmu(&mut self, enabled: bool) -> bool;

    /// Enter or leave supervisor state, returning the previous state
    fn set_supervisor(&mut self, supervisor: bool) -> bool;

    /// Mask interrupts (nests)
    fn mask_interrupts(&mut self);

    /// Undo one `mask_interrupts`
    fn unmask_interrupts(&mut self);

    /// Free-running counter
    fn ticks(&mut self) -> u64;

    /// Counter frequency
    fn tick_hz(&self) -> u64;

    /// Memory controller access-mode register
    fn read_control(&mut self) -> u8;

    /// Write the access-mode register; the change may not be visible at once
    fn write_control(&mut self, value: u8);

    /// Memory controller revision
    fn controller_version(&mut self) -> u8;

    fn cpu(&self) -> CpuInfo;

    /// Names of resident debugging monitors
    fn running_tools(&self) -> Vec<String> {
        Vec::new()
    }

    /// Addresses of the diagnostic's own stack, code and read-only data
    fn resident_sections(&self) -> Vec<(&'static str, u32)>;

    /// Allocate a scratch buffer of `words` longwords in chip RAM
    ///
    /// # Errors
    ///
    /// Returns `DiagError::AllocationFailed` when no chip RAM is available.
    fn alloc_scratch(&mut self, words: usize) -> Result<Vec<u32>>;

    /// Drive the external probe trigger (a parallel port on real hardware)
    fn set_probe_trigger(&mut self, _active: bool) {}
}

#[cfg(test)]
mod tests;
