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

//! Emulated memory board
//!
//! `SimBoard` implements [`Platform`] over an in-process model of the board:
//! 2MB of chip RAM, four banks of x4 modules addressed by wire mask, the
//! memory controller's access-mode register, a write-through data cache and
//! an interrupt mask counter. Physical defects come from a [`FaultPlan`].
//!
//! The model is built so each test's countermeasure matters:
//!
//! - a cached read never reaches the modules, so a faulty bit stays hidden
//!   unless the cache is off or the line is flushed
//! - an open data line returns the last level driven on the bus, so it looks
//!   good unless something else drives the bus between write and read
//! - a stuck address wire makes modules decode a different cell, so tagged
//!   writes to neighbouring wire masks alias
//! - burst beats on a module without static column support return the
//!   previous beat's nibble
//!
//! # Example
//!
//! ```
//! use zipdiag::core::platform::Platform;
//! use zipdiag::core::sim::{FaultPlan, SimBoard};
//!
//! let mut board = SimBoard::default().with_faults(FaultPlan::new().stuck0(0, 3));
//!
//! board.write32(0x07C0_0000, 0xFFFF_FFFF);
//! assert_eq!(board.read32(0x07C0_0000), 0xFFFF_FFF7);
//! ```

mod cache;
mod faults;
mod region;
mod timing;

pub use faults::{
    AddressFault, CellFault, DataFault, DataFaultKind, FaultPlan, DEFAULT_BAD_CELL_MASK,
};
pub use region::SimRegion;
pub use timing::{AccessTiming, TICK_HZ};

use crate::core::error::{DiagError, Result};
use crate::core::platform::{CpuInfo, ModeBits, Platform};
use crate::core::translate::{to_wire_mask, AddrBits, BANK_COUNT, NIBBLES};
use cache::DataCache;
use faults::{BankFaults, Noise};

/// Access counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessStats {
    pub chip_reads: u64,
    pub chip_writes: u64,
    pub fast_reads: u64,
    pub fast_writes: u64,
    pub cache_hits: u64,
    /// Fast memory cycles made while interrupts were enabled
    pub unmasked_fast_accesses: u64,
    /// Fast memory cycles made with MMU translation on
    pub translated_fast_accesses: u64,
}

impl AccessStats {
    /// Every memory cycle, chip and fast
    pub fn total(&self) -> u64 {
        self.chip_reads + self.chip_writes + self.fast_reads + self.fast_writes
    }
}

/// Emulated board
pub struct SimBoard {
    addrbits: AddrBits,
    control: u8,
    pending_control: Option<(u8, u32)>,
    control_latency: u32,
    version: u8,

    chip: Vec<u32>,
    banks: Vec<Vec<u32>>,

    plan: FaultPlan,
    faults: [BankFaults; BANK_COUNT],
    noise: Noise,
    bus_latch: u32,

    cache: DataCache,
    mmu: bool,
    supervisor: bool,
    interrupt_depth: u32,

    timing: AccessTiming,
    clock: u64,
    open_row: Option<(usize, u32)>,
    page_cycles: bool,
    /// Nibbles per bank whose modules lack static column support
    fast_page_nibbles: [u32; BANK_COUNT],
    cpu: CpuInfo,

    tools: Vec<String>,
    sections: Vec<(&'static str, u32)>,
    scratch_available: bool,
    trigger: bool,
    strobe_log: Vec<u32>,
    stats: AccessStats,
}

impl Default for SimBoard {
    /// 1Mx4 static column modules, 154 clock refresh
    fn default() -> Self {
        Self::new(ModeBits::RAMSIZE | ModeBits::RAMWIDTH | ModeBits::BURST)
    }
}

impl SimBoard {
    /// Build a board strapped according to `control`
    ///
    /// Module density is fixed at construction from the RAMSIZE bit.
    pub fn new(control: ModeBits) -> Self {
        let addrbits = if control.contains(ModeBits::RAMSIZE) {
            AddrBits::BITS_20
        } else {
            AddrBits::BITS_18
        };
        let words = 1usize << addrbits.get();
        let banks = (0..BANK_COUNT)
            .map(|bank| {
                (0..words as u32)
                    .map(|mask| (mask ^ ((bank as u32) << 24)).wrapping_mul(0x9E37_79B1))
                    .collect()
            })
            .collect();

        log::debug!("SimBoard: {} modules, control=0x{:02X}", addrbits, control.bits());

        Self {
            addrbits,
            control: control.bits(),
            pending_control: None,
            control_latency: 3,
            version: 0x0D,
            chip: vec![0; ((Self::CHIP_END - Self::CHIP_START + 1) / 4) as usize],
            banks,
            plan: FaultPlan::default(),
            faults: Default::default(),
            noise: Noise::new(0x2545_F491),
            bus_latch: 0,
            cache: DataCache::new(true),
            mmu: false,
            supervisor: false,
            interrupt_depth: 0,
            timing: AccessTiming::default(),
            clock: 0,
            open_row: None,
            page_cycles: true,
            fast_page_nibbles: [0; BANK_COUNT],
            cpu: CpuInfo {
                model: 68030,
                burst: true,
                mmu: false,
            },
            tools: Vec::new(),
            sections: vec![
                ("sp", 0x0000_C000),
                ("pc", 0x0002_0000),
                ("rodata", 0x0003_0000),
            ],
            scratch_available: true,
            trigger: false,
            strobe_log: Vec::new(),
            stats: AccessStats::default(),
        }
    }

    /// Install a fault plan
    pub fn with_faults(mut self, plan: FaultPlan) -> Self {
        self.set_faults(plan);
        self
    }

    pub fn set_faults(&mut self, plan: FaultPlan) {
        self.faults = plan.compile(self.addrbits);
        self.plan = plan;
    }

    pub fn faults(&self) -> &FaultPlan {
        &self.plan
    }

    pub fn addrbits(&self) -> AddrBits {
        self.addrbits
    }

    pub fn set_control_latency(&mut self, reads: u32) {
        self.control_latency = reads;
    }

    pub fn set_version(&mut self, version: u8) {
        self.version = version;
    }

    pub fn add_running_tool(&mut self, name: &str) {
        self.tools.push(name.to_string());
    }

    /// Move one of the diagnostic's own sections
    pub fn set_section(&mut self, name: &'static str, addr: u32) {
        match self.sections.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = addr,
            None => self.sections.push((name, addr)),
        }
    }

    pub fn set_scratch_available(&mut self, available: bool) {
        self.scratch_available = available;
    }

    /// Mark one module as fast page only
    pub fn set_fast_page_module(&mut self, bank: usize, nibble: usize) {
        self.fast_page_nibbles[bank] |= 0xF << (nibble * 4);
    }

    /// Enable or disable CPU burst fills
    pub fn set_cpu_burst(&mut self, burst: bool) {
        self.cpu.burst = burst;
    }

    /// Allow the controller to keep rows open between cycles
    pub fn set_page_cycles(&mut self, enabled: bool) {
        self.page_cycles = enabled;
    }

    pub fn timing_mut(&mut self) -> &mut AccessTiming {
        &mut self.timing
    }

    pub fn interrupt_depth(&self) -> u32 {
        self.interrupt_depth
    }

    pub fn data_cache_enabled(&self) -> bool {
        self.cache.enabled()
    }

    pub fn mmu_enabled(&self) -> bool {
        self.mmu
    }

    pub fn supervisor(&self) -> bool {
        self.supervisor
    }

    pub fn probe_trigger(&self) -> bool {
        self.trigger
    }

    pub fn stats(&self) -> AccessStats {
        self.stats
    }

    /// Fast memory addresses read while the probe trigger was raised
    pub fn strobe_log(&self) -> &[u32] {
        &self.strobe_log
    }

    /// Raw contents of one bank, indexed by wire mask
    pub fn bank_contents(&self, bank: usize) -> &[u32] {
        &self.banks[bank]
    }

    /// Raw chip RAM contents
    pub fn chip_contents(&self) -> &[u32] {
        &self.chip
    }

    /// Stored word at a fast memory address, bypassing bus, cache and faults
    pub fn peek(&self, addr: u32) -> Option<u32> {
        match self.identify_region(addr) {
            SimRegion::FastMem(bank) => {
                Some(self.banks[bank][to_wire_mask(addr, self.addrbits) as usize])
            }
            SimRegion::ChipRam => Some(self.chip[(addr >> 2) as usize]),
            SimRegion::Unmapped => None,
        }
    }

    fn control_bits(&self) -> ModeBits {
        ModeBits::from_bits_retain(self.control)
    }

    /// Read what the modules of a bank drive for a wire mask
    fn load(&self, bank: usize, mask: u32) -> u32 {
        let faults = &self.faults[bank];
        let storage = &self.banks[bank];

        if !faults.has_wire {
            return faults.cell_value(mask, storage[mask as usize]);
        }

        let mut word = 0;
        for nibble in 0..NIBBLES {
            let eff = faults.effective_mask(mask, nibble);
            let lane = 0xFu32 << (nibble * 4);
            word |= faults.cell_value(eff, storage[eff as usize]) & lane;
        }
        word
    }

    /// Write a word into the cells the modules decode for a wire mask
    fn store(&mut self, bank: usize, mask: u32, value: u32) {
        let faults = &self.faults[bank];
        let storage = &mut self.banks[bank];

        if !faults.has_wire {
            storage[mask as usize] = value;
            return;
        }

        for nibble in 0..NIBBLES {
            let eff = faults.effective_mask(mask, nibble) as usize;
            let lane = 0xFu32 << (nibble * 4);
            storage[eff] = (storage[eff] & !lane) | (value & lane);
        }
    }

    /// Charge one fast memory cycle and track the open row
    fn fast_cycle(&mut self, bank: usize, mask: u32, beat: bool) {
        let row = mask >> self.addrbits.cas_bits();
        let page_hit = self.page_cycles
            && self.control_bits().contains(ModeBits::PAGE)
            && self.open_row == Some((bank, row));

        let cost = if beat {
            self.timing.burst
        } else if page_hit {
            self.timing.page
        } else {
            self.timing.random
        };
        self.clock += cost + self.timing.penalty;
        self.open_row = Some((bank, row));

        if self.interrupt_depth == 0 {
            self.stats.unmasked_fast_accesses += 1;
        }
        if self.mmu {
            self.stats.translated_fast_accesses += 1;
        }
    }

    fn fast_read(&mut self, addr: u32, bank: usize, beat: bool) -> u32 {
        self.stats.fast_reads += 1;
        if self.trigger {
            self.strobe_log.push(addr);
        }

        if let Some(hit) = self.cache.lookup(addr) {
            self.stats.cache_hits += 1;
            self.clock += 20;
            return hit;
        }

        let mask = to_wire_mask(addr, self.addrbits);
        self.fast_cycle(bank, mask, beat);

        let stored = self.load(bank, mask);
        let noise = self.noise.next();
        let value = self.faults[bank].drive(stored, noise, self.bus_latch);
        self.bus_latch = value;
        self.cache.fill(addr, value);
        value
    }

    fn fast_write(&mut self, addr: u32, bank: usize, value: u32) {
        self.stats.fast_writes += 1;
        let mask = to_wire_mask(addr, self.addrbits);
        self.fast_cycle(bank, mask, false);
        self.store(bank, mask, value);
        self.cache.write(addr, value);
        self.bus_latch = value;
    }
}

impl Platform for SimBoard {
    fn read32(&mut self, addr: u32) -> u32 {
        let addr = addr & !3;
        match self.identify_region(addr) {
            SimRegion::ChipRam => {
                self.stats.chip_reads += 1;
                self.clock += self.timing.chip;
                let value = self.chip[(addr >> 2) as usize];
                self.bus_latch = value;
                value
            }
            SimRegion::FastMem(bank) => self.fast_read(addr, bank, false),
            SimRegion::Unmapped => self.bus_latch,
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        let addr = addr & !3;
        match self.identify_region(addr) {
            SimRegion::ChipRam => {
                self.stats.chip_writes += 1;
                self.clock += self.timing.chip;
                self.chip[(addr >> 2) as usize] = value;
                self.bus_latch = value;
            }
            SimRegion::FastMem(bank) => self.fast_write(addr, bank, value),
            SimRegion::Unmapped => self.bus_latch = value,
        }
    }

    /// Burst reads fetch aligned lines of four longwords; beats after the
    /// first come from the open column and are only valid on static column
    /// modules.
    fn read_burst(&mut self, addr: u32, buf: &mut [u32]) {
        let bursting = self.cpu.burst && self.control_bits().contains(ModeBits::BURST);
        let mut previous = 0;

        for (i, word) in buf.iter_mut().enumerate() {
            let a = (addr & !3) + (i as u32) * 4;
            let beat = bursting && i > 0 && (a >> 2) & 3 != 0;

            *word = match self.identify_region(a) {
                SimRegion::FastMem(bank) if beat => {
                    let value = self.fast_read(a, bank, true);
                    let stale = self.fast_page_nibbles[bank];
                    let value = (value & !stale) | (previous & stale);
                    self.bus_latch = value;
                    value
                }
                _ => self.read32(a),
            };
            previous = *word;
        }
    }

    fn flush_cache_line(&mut self, addr: u32, len: usize) {
        self.cache.flush(addr, len);
    }

    fn set_data_cache(&mut self, enabled: bool) -> bool {
        self.cache.set_enabled(enabled)
    }

    fn set_mmu(&mut self, enabled: bool) -> bool {
        self.cpu.mmu = enabled;
        std::mem::replace(&mut self.mmu, enabled)
    }

    fn set_supervisor(&mut self, supervisor: bool) -> bool {
        std::mem::replace(&mut self.supervisor, supervisor)
    }

    fn mask_interrupts(&mut self) {
        self.interrupt_depth += 1;
    }

    fn unmask_interrupts(&mut self) {
        if self.interrupt_depth == 0 {
            log::warn!("Interrupt unmask without matching mask");
            return;
        }
        self.interrupt_depth -= 1;
    }

    fn ticks(&mut self) -> u64 {
        self.clock
    }

    fn tick_hz(&self) -> u64 {
        TICK_HZ
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
        log::trace!("Control register write 0x{:02X}", value);
        self.pending_control = Some((value, self.control_latency));
    }

    fn controller_version(&mut self) -> u8 {
        self.version
    }

    fn cpu(&self) -> CpuInfo {
        self.cpu
    }

    fn running_tools(&self) -> Vec<String> {
        self.tools.clone()
    }

    fn resident_sections(&self) -> Vec<(&'static str, u32)> {
        self.sections.clone()
    }

    fn alloc_scratch(&mut self, words: usize) -> Result<Vec<u32>> {
        if !self.scratch_available {
            return Err(DiagError::AllocationFailed { bytes: words * 4 });
        }
        Ok(vec![0; words])
    }

    fn set_probe_trigger(&mut self, active: bool) {
        if active && !self.trigger {
            self.strobe_log.clear();
        }
        self.trigger = active;
    }
}

#[cfg(test)]
mod tests;
