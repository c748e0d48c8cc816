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

//! Address line fault isolation
//!
//! A module address pin carries one CAS bit and one RAS bit, so the test
//! always drives RAS equal to CAS and works on CAS positions only.
//!
//! For each position `m` the neighbours `l = m - 1` and `h = m + 1` (wrapping
//! within the CAS width) are combined with it into eight addresses, one per
//! value of the three bits. Each address is tagged with `0x11111111 * (i + 1)`
//! and read back. A nibble that returns the tag of another address `j` (or a
//! value outside 1-8) means the module decoded the wrong cell; the bits in
//! which `i` and `j` differ identify the wires to blame:
//!
//! ```text
//! xor bit 0 -> l    xor bit 1 -> m    xor bit 2 -> h
//! ```
//!
//! Out-of-range nibbles blame all three. The other CAS bits are held at a
//! background that alternates all-zero and all-one between walks, so a wire
//! stuck at either level is eventually exercised both ways.
//!
//! Credits accumulate in a [`BadCountTable`] and are thresholded into
//! [`WireStatus`] per (bank, wire, nibble).

use crate::core::config::DiagConfig;
use crate::core::platform::{CriticalSection, MemoryConfig, ModuleType, Platform, SectionFlags};
use crate::core::status::{BadCountTable, WireStatus};
use crate::core::translate::{ras_eq_cas, to_address, AddrBits, BANK_COUNT, NIBBLES};
use serde::Serialize;

/// Tag multiplier; tag `i` fills every nibble with `i + 1`
const TAG: u32 = 0x1111_1111;

/// Complete address line test output
#[derive(Debug, Clone, Serialize)]
pub struct AddressLineReport {
    pub badcount: BadCountTable,
    pub threshold: u16,
    /// Module address pins per bank
    pub cas_bits: u32,
    /// Readbacks that did not return their own tag
    pub errors: u32,
    /// Sections that ran longer than one refresh interval
    pub overruns: u32,
    /// Filled in when the capability probe ran
    pub module_type: Option<ModuleType>,
}

impl AddressLineReport {
    pub fn status(&self, bank: usize, wire: usize, nibble: usize) -> WireStatus {
        self.badcount.status(bank, wire, nibble, self.threshold)
    }

    /// Worst status of a wire over all nibbles of a bank
    pub fn wire_status(&self, bank: usize, wire: usize) -> WireStatus {
        (0..NIBBLES)
            .map(|n| self.status(bank, wire, n))
            .max_by_key(|s| match s {
                WireStatus::Good => 0,
                WireStatus::Suspect => 1,
                WireStatus::Bad => 2,
            })
            .unwrap_or(WireStatus::Good)
    }
}

/// Address line fault isolator
pub struct AddressLineFaultIsolator<'a> {
    config: &'a DiagConfig,
    addrbits: AddrBits,
}

impl<'a> AddressLineFaultIsolator<'a> {
    pub fn new(config: &'a DiagConfig, addrbits: AddrBits) -> Self {
        Self { config, addrbits }
    }

    /// The eight wire masks exercised for CAS position `bitm`
    ///
    /// # Arguments
    ///
    /// * `bitm` - CAS bit under test
    /// * `background` - Level of the CAS bits outside the l/m/h group
    pub fn address_group(&self, bank: usize, bitm: u32, background: u32) -> [u32; 8] {
        let cas = self.addrbits.cas_bits();
        let bitl = (bitm + cas - 1) % cas;
        let bith = (bitm + 1) % cas;
        let maskval = (1 << bitl) | (1 << bitm) | (1 << bith);

        let mut addrs = [0; 8];
        for (t, addr) in addrs.iter_mut().enumerate() {
            let t = t as u32;
            let orval = ((t & 1) << bitl) | (((t >> 1) & 1) << bitm) | (((t >> 2) & 1) << bith);
            let cas_value = orval | (background & !maskval);
            *addr = to_address(bank, ras_eq_cas(cas_value, self.addrbits), self.addrbits);
        }
        addrs
    }

    /// Tag, read back and restore one address group
    ///
    /// Returns the readbacks and the section duration in ticks.
    fn exercise<P: Platform + ?Sized>(&self, platform: &mut P, addrs: &[u32; 8]) -> ([u32; 8], u64) {
        let mut saved = [0; 8];
        let mut read = [0; 8];

        let flags = SectionFlags::MEASURE.physical(&platform.cpu());
        let mut cs = CriticalSection::new(platform, flags);
        let start = cs.ticks();
        for (i, &addr) in addrs.iter().enumerate() {
            saved[i] = cs.read32(addr);
            cs.write32(addr, TAG * (i as u32 + 1));
        }
        for (i, &addr) in addrs.iter().enumerate() {
            read[i] = cs.read32(addr);
            cs.write32(addr, saved[i]);
        }
        let elapsed = cs.ticks().saturating_sub(start);
        (read, elapsed)
    }

    /// Blame the wires of a mismatched readback
    fn credit(table: &mut BadCountTable, bank: usize, wires: [u32; 3], index: u32, value: u32) {
        for nibble in 0..NIBBLES {
            let v = (value >> (nibble * 4)) & 0xF;
            if v == index + 1 {
                continue;
            }
            let xor = if v == 0 || v > 8 { 7 } else { (v - 1) ^ index };
            for (k, &wire) in wires.iter().enumerate() {
                if xor & (1 << k) != 0 {
                    table.credit(bank, wire as usize, nibble);
                }
            }
        }
    }

    /// Run every walk over one bank
    ///
    /// # Arguments
    ///
    /// * `window` - Refresh window in ticks, `None` when refresh is off
    pub fn test_bank<P: Platform + ?Sized>(
        &self,
        platform: &mut P,
        bank: usize,
        window: Option<u64>,
        report: &mut AddressLineReport,
    ) {
        let cas = self.addrbits.cas_bits();
        let cas_mask = (1u32 << cas) - 1;

        for walk in 0..self.config.walk_count() {
            let background = cas_mask * (walk & 1);
            for bitm in 0..cas {
                let wires = [(bitm + cas - 1) % cas, bitm, (bitm + 1) % cas];
                let addrs = self.address_group(bank, bitm, background);
                let (read, elapsed) = self.exercise(platform, &addrs);

                if let Some(window) = window {
                    if elapsed > window {
                        report.overruns += 1;
                        log::warn!(
                            "Bank {} A{}: section took {} ticks, refresh window is {}",
                            bank,
                            bitm,
                            elapsed,
                            window
                        );
                    }
                }

                for (i, &value) in read.iter().enumerate() {
                    let i = i as u32;
                    if value == TAG * (i + 1) {
                        continue;
                    }
                    report.errors += 1;
                    log::trace!(
                        "Bank {} A{} {:08x}: wrote {:08x} read {:08x}",
                        bank,
                        bitm,
                        addrs[i as usize],
                        TAG * (i + 1),
                        value
                    );
                    Self::credit(&mut report.badcount, bank, wires, i, value);
                }
            }
        }
    }

    /// Test every bank
    pub fn run<P: Platform + ?Sized>(&self, platform: &mut P) -> AddressLineReport {
        let memory = MemoryConfig::read(platform);
        let window = memory.refresh.window_ticks(platform.tick_hz());

        log::info!(
            "Address line test ({} walks, threshold {})",
            self.config.walk_count(),
            self.config.bad_threshold()
        );

        let mut report = AddressLineReport {
            badcount: BadCountTable::new(),
            threshold: self.config.bad_threshold(),
            cas_bits: self.addrbits.cas_bits(),
            errors: 0,
            overruns: 0,
            module_type: None,
        };

        for bank in 0..BANK_COUNT {
            self.test_bank(platform, bank, window, &mut report);
            log::debug!("Bank {}: {} credits", bank, report.badcount.bank_total(bank));
        }

        if report.overruns > 0 {
            log::warn!(
                "{} sections exceeded the {} refresh interval",
                report.overruns,
                memory.refresh
            );
        }
        log::info!("Address line test complete: {} errors", report.errors);
        report
    }
}

#[cfg(test)]
mod tests;
