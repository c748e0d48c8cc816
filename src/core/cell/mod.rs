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

//! Memory cell pattern test
//!
//! Every bank is swept one block at a time. Each block is saved to a chip RAM
//! scratch buffer, filled with a rotating pattern sequence, verified and
//! restored, all inside one critical section. The pattern count is prime, so
//! consecutive words never share a pattern and every word sees every pattern
//! once the rotation start has cycled through all of them.
//!
//! Any mismatching bit marks its nibble's module Bad for the bank. Once every
//! module of a bank is Bad the rest of that bank is skipped.

use crate::core::config::DiagConfig;
use crate::core::error::Result;
use crate::core::platform::{CriticalSection, MemoryConfig, Platform, SectionFlags};
use crate::core::status::CellStatus;
use crate::core::translate::{bank_range, AddrBits, BANK_COUNT, NIBBLES};
use serde::Serialize;

/// Rotating test patterns; the length must stay prime
pub const CELL_PATTERNS: [u32; 13] = [
    0xAAAA_AAAA, 0x5555_5555, 0xCCCC_CCCC, 0x3333_3333,
    0x1111_1111, 0x2222_2222, 0x4444_4444, 0x8888_8888,
    0x7777_7777, 0xEEEE_EEEE, 0xDDDD_DDDD, 0xBBBB_BBBB,
    0x0000_0000,
];

/// Progress notification, sent once per progress stride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellProgress {
    pub bank: usize,
    /// Block just tested
    pub address: u32,
    /// Bytes of the bank covered so far
    pub done: u32,
    pub bank_size: u32,
    pub cells: [CellStatus; NIBBLES],
}

/// Complete cell test output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellReport {
    /// Indexed `[bank][nibble]`
    pub cells: [[CellStatus; NIBBLES]; BANK_COUNT],
    /// Blocks with at least one mismatching bit
    pub errors: u32,
    /// Banks abandoned early because every module had failed
    pub early_exits: u32,
}

impl CellReport {
    pub fn status(&self, bank: usize, nibble: usize) -> CellStatus {
        self.cells[bank][nibble]
    }

    pub fn all_good(&self) -> bool {
        self.cells
            .iter()
            .all(|bank| bank.iter().all(|&c| c == CellStatus::Good))
    }
}

/// Memory cell pattern tester
pub struct CellPatternTester<'a> {
    config: &'a DiagConfig,
    addrbits: AddrBits,
}

impl<'a> CellPatternTester<'a> {
    pub fn new(config: &'a DiagConfig, addrbits: AddrBits) -> Self {
        Self { config, addrbits }
    }

    /// Run the pattern rotation over one block
    ///
    /// Returns the OR of every mismatch. The block is left holding the last
    /// pattern set; callers restore it.
    pub fn pattern_check<P: Platform + ?Sized>(&self, platform: &mut P, addr: u32, words: usize) -> u32 {
        let iters = self.config.cell_patterns().min(CELL_PATTERNS.len());
        let mut err = 0;

        for iter in 0..iters {
            let mut pat = iter;
            for i in 0..words {
                platform.write32(addr + (i as u32) * 4, CELL_PATTERNS[pat]);
                pat += 1;
                if pat == iters {
                    pat = 0;
                }
            }

            platform.flush_cache_line(addr, words * 4);

            let mut pat = iter;
            for i in 0..words {
                err |= platform.read32(addr + (i as u32) * 4) ^ CELL_PATTERNS[pat];
                pat += 1;
                if pat == iters {
                    pat = 0;
                }
            }
        }
        err
    }

    /// Save, pattern check and restore one block
    fn test_block<P: Platform + ?Sized>(&self, platform: &mut P, addr: u32, scratch: &mut [u32]) -> u32 {
        let flags = (SectionFlags::NO_DATA_CACHE | SectionFlags::SUPERVISOR | SectionFlags::INTERRUPTS)
            .physical(&platform.cpu());
        let mut cs = CriticalSection::new(platform, flags);

        for (i, word) in scratch.iter_mut().enumerate() {
            *word = cs.read32(addr + (i as u32) * 4);
        }
        let err = self.pattern_check(&mut *cs, addr, scratch.len());
        cs.write_burst(addr, scratch);
        err
    }

    /// Sweep every bank
    ///
    /// `progress` is called after each block that starts a new progress
    /// stride.
    ///
    /// # Errors
    ///
    /// Returns `DiagError::Config` for an invalid block size or progress
    /// stride, and `DiagError::AllocationFailed` if the scratch buffer cannot
    /// be obtained. Nothing has been touched in either case.
    pub fn run<P, F>(&self, platform: &mut P, mut progress: F) -> Result<CellReport>
    where
        P: Platform + ?Sized,
        F: FnMut(CellProgress),
    {
        self.config.validate()?;
        let block = self.config.cell.block_size;
        let stride = self.config.cell.progress_stride;
        let mut scratch = platform.alloc_scratch(block / 4).inspect_err(|e| {
            log::warn!("Memory cell test skipped: {}", e);
        })?;

        let memory = MemoryConfig::read(platform);
        if memory.width != 4 {
            log::warn!("Controller reports x{} modules; testing x4 bank layout", memory.width);
        }

        log::info!(
            "Memory cell test ({} patterns, {} byte blocks)",
            self.config.cell_patterns(),
            block
        );

        let mut report = CellReport {
            cells: [[CellStatus::Good; NIBBLES]; BANK_COUNT],
            errors: 0,
            early_exits: 0,
        };

        for bank in 0..BANK_COUNT {
            let range = bank_range(bank, self.addrbits);
            log::debug!("Bank {}: {:08x}-{:08x}", bank, range.start, range.end);

            for addr in range.clone().step_by(block) {
                let mut err = self.test_block(platform, addr, &mut scratch);

                if err != 0 {
                    if report.errors < 10 {
                        log::debug!("err={:08x} at {:08x}", err, addr);
                    }
                    report.errors += 1;
                    for cell in report.cells[bank].iter_mut() {
                        if err & 0xF != 0 {
                            *cell = CellStatus::Bad;
                        }
                        err >>= 4;
                    }
                }

                if (addr - range.start) % stride == 0 {
                    progress(CellProgress {
                        bank,
                        address: addr,
                        done: addr + block as u32 - range.start,
                        bank_size: range.end - range.start,
                        cells: report.cells[bank],
                    });

                    if report.cells[bank].iter().all(|&c| c == CellStatus::Bad) {
                        log::warn!("Bank {}: every module failed, skipping the rest", bank);
                        report.early_exits += 1;
                        break;
                    }
                }
            }
        }

        log::info!("Memory cell test complete: {} errors", report.errors);
        Ok(report)
    }
}

#[cfg(test)]
mod tests;
