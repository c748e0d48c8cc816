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

//! Access capability probe
//!
//! Finds out which faster access cycles the installed modules can take.
//! Two probes run, both through the saved access-mode register so the
//! controller is always left as it was found:
//!
//! 1. **Timing.** The same sequential read is timed under each access mode.
//!    A mode counts as supported when it beats plain access by more than the
//!    configured percentage.
//! 2. **Static column.** A 16-word pattern in one page is written with plain
//!    cycles and read back as bursts. Modules that cannot hold the column
//!    open return the previous beat's data, which shows up per nibble.
//!
//! The result only annotates the address line report. A probe that cannot
//! run is logged and reported, never treated as a failed test.

use crate::core::config::DiagConfig;
use crate::core::error::Result;
use crate::core::platform::{
    AccessMode, AccessModeRegister, CriticalSection, MemoryConfig, ModuleType, Platform,
    SectionFlags,
};
use crate::core::translate::{bank_base, AddrBits, BANK_COUNT, NIBBLES};
use serde::Serialize;

/// Words in the static column pattern
pub const STATIC_COLUMN_WORDS: usize = 16;

/// Elapsed time of one timed read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeTiming {
    pub mode: AccessMode,
    pub ticks: u64,
}

/// Probe results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub timings: Vec<ModeTiming>,
    pub burst_capable: bool,
    pub page_capable: bool,
    /// Static column support, indexed `[bank][nibble]`
    pub static_column: Option<[[bool; NIBBLES]; BANK_COUNT]>,
    pub module_type: ModuleType,
    /// Module type implied by the register as found
    pub configured: ModuleType,
    /// Why the probe stopped early, if it did
    pub error: Option<String>,
}

impl ProbeReport {
    fn new(configured: ModuleType) -> Self {
        Self {
            timings: Vec::new(),
            burst_capable: false,
            page_capable: false,
            static_column: None,
            module_type: ModuleType::Unknown,
            configured,
            error: None,
        }
    }

    pub fn ticks(&self, mode: AccessMode) -> Option<u64> {
        self.timings.iter().find(|t| t.mode == mode).map(|t| t.ticks)
    }
}

/// The static column pattern; neighbouring words differ in every nibble
pub fn static_column_pattern() -> [u32; STATIC_COLUMN_WORDS] {
    let mut pattern = [0; STATIC_COLUMN_WORDS];
    for (i, word) in pattern.iter_mut().enumerate() {
        *word = 0x1111_1111 * ((i as u32 % 15) + 1);
    }
    pattern
}

/// True when `ticks` beats `baseline` by more than `threshold_percent`
pub fn beats(baseline: u64, ticks: u64, threshold_percent: u32) -> bool {
    baseline > ticks && (baseline - ticks) * 100 > baseline * threshold_percent as u64
}

/// Access capability probe
pub struct CapabilityProbe<'a> {
    config: &'a DiagConfig,
    addrbits: AddrBits,
}

impl<'a> CapabilityProbe<'a> {
    pub fn new(config: &'a DiagConfig, addrbits: AddrBits) -> Self {
        Self { config, addrbits }
    }

    /// Time a sequential read of `size` bytes under one access mode
    ///
    /// # Errors
    ///
    /// Returns `DiagError::RegisterTimeout` if the mode could not be selected
    /// or the saved mode could not be put back.
    pub fn measure<P: Platform + ?Sized>(
        &self,
        platform: &mut P,
        register: &AccessModeRegister,
        mode: AccessMode,
        base: u32,
        size: usize,
    ) -> Result<u64> {
        let mut buf = vec![0; size / 4];
        let measure_flags = SectionFlags::MEASURE.physical(&platform.cpu());
        register.with_mode(platform, mode, |p| {
            let mut cs = CriticalSection::new(p, measure_flags);
            let start = cs.ticks();
            cs.read_burst(base, &mut buf);
            Ok(cs.ticks().saturating_sub(start))
        })
    }

    /// Check every (bank, nibble) for static column support
    ///
    /// The pattern area is restored even if the burst read fails.
    ///
    /// # Errors
    ///
    /// Returns `DiagError::RegisterTimeout` on a register handshake failure.
    pub fn static_column<P: Platform + ?Sized>(
        &self,
        platform: &mut P,
        register: &AccessModeRegister,
    ) -> Result<[[bool; NIBBLES]; BANK_COUNT]> {
        let pattern = static_column_pattern();
        let measure_flags = SectionFlags::MEASURE.physical(&platform.cpu());
        let mut result = [[true; NIBBLES]; BANK_COUNT];

        for (bank, modules) in result.iter_mut().enumerate() {
            let base = bank_base(bank, self.addrbits);
            let mut saved = [0; STATIC_COLUMN_WORDS];
            let mut readback = [0; STATIC_COLUMN_WORDS];

            register.with_mode(platform, AccessMode::None, |p| {
                let mut cs = CriticalSection::new(p, measure_flags);
                for (i, word) in saved.iter_mut().enumerate() {
                    *word = cs.read32(base + (i as u32) * 4);
                }
                cs.write_burst(base, &pattern);
                Ok(())
            })?;

            let burst = register.with_mode(platform, AccessMode::Burst, |p| {
                let mut cs = CriticalSection::new(p, measure_flags);
                cs.read_burst(base, &mut readback);
                Ok(())
            });

            let restore = register.with_mode(platform, AccessMode::None, |p| {
                let mut cs = CriticalSection::new(p, measure_flags);
                cs.write_burst(base, &saved);
                Ok(())
            });
            burst?;
            restore?;

            let diff = readback
                .iter()
                .zip(pattern.iter())
                .fold(0, |acc, (r, p)| acc | (r ^ p));
            for (nibble, ok) in modules.iter_mut().enumerate() {
                *ok = (diff >> (nibble * 4)) & 0xF == 0;
            }
            log::debug!("Bank {} static column mismatch {:08x}", bank, diff);
        }
        Ok(result)
    }

    fn probe<P: Platform + ?Sized>(
        &self,
        platform: &mut P,
        register: &AccessModeRegister,
        report: &mut ProbeReport,
    ) -> Result<()> {
        let base = bank_base(0, self.addrbits);
        let size = self.config.probe.size;
        let threshold = self.config.probe.threshold_percent;

        for mode in AccessMode::ALL {
            let ticks = self.measure(platform, register, mode, base, size)?;
            log::debug!("{:?}: {} ticks for {} bytes", mode, ticks, size);
            report.timings.push(ModeTiming { mode, ticks });
        }

        let none = report.ticks(AccessMode::None).unwrap_or(0);
        report.burst_capable = report
            .ticks(AccessMode::Burst)
            .is_some_and(|t| beats(none, t, threshold));
        report.page_capable = report
            .ticks(AccessMode::Page)
            .is_some_and(|t| beats(none, t, threshold));

        if report.burst_capable {
            report.static_column = Some(self.static_column(platform, register)?);
        }

        let all_static = report
            .static_column
            .is_some_and(|sc| sc.iter().all(|bank| bank.iter().all(|&ok| ok)));
        report.module_type = if report.burst_capable && all_static {
            ModuleType::StaticColumn
        } else if report.page_capable {
            ModuleType::FastPage
        } else {
            ModuleType::Unknown
        };
        Ok(())
    }

    /// Run both probes
    ///
    /// Never fails; a register problem ends the probe early and is recorded
    /// in [`ProbeReport::error`].
    pub fn run<P: Platform + ?Sized>(&self, platform: &mut P) -> ProbeReport {
        let register = AccessModeRegister::save(platform, self.config.probe.register_poll_limit);
        let configured = MemoryConfig::from_control(register.saved()).module_type;
        let mut report = ProbeReport::new(configured);

        log::info!("Probing access capabilities");
        if let Err(e) = self.probe(platform, &register, &mut report) {
            log::error!("Capability probe aborted: {}", e);
            report.error = Some(e.to_string());
            report.module_type = ModuleType::Unknown;
        }

        log::info!(
            "Burst {}, page {}: {}",
            if report.burst_capable { "yes" } else { "no" },
            if report.page_capable { "yes" } else { "no" },
            report.module_type
        );
        if report.module_type != configured {
            log::warn!("Detected {} but controller is set for {}", report.module_type, configured);
        }
        report
    }
}

#[cfg(test)]
mod tests;
