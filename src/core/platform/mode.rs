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

//! Memory controller access-mode register
//!
//! The control register selects page and burst cycles, records how the
//! board was strapped (module density and width) and sets the refresh rate.
//! It is global state: every probe that changes it must put the saved value
//! back before returning, and because writes are not synchronous each write
//! is confirmed by reading the register until the new value shows up.
//!
//! # Register Layout
//!
//! | Bit | Name     | Meaning                          |
//! |-----|----------|----------------------------------|
//! | 0   | PAGE     | Page mode cycles                 |
//! | 1   | BURST    | Burst (static column) cycles     |
//! | 2   | WRAP     | Burst wraps within a line        |
//! | 3   | RAMSIZE  | 1 = 1Mx4 parts, 0 = 256Kx4       |
//! | 4   | RAMWIDTH | 1 = x4 parts, 0 = x1 parts       |
//! | 5-6 | REFRESH  | Refresh rate code                |
//! | 7   | TEST     | Controller test mode             |

use super::Platform;
use crate::core::error::{DiagError, Result};
use crate::core::translate::AddrBits;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// Access-mode register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModeBits: u8 {
        const PAGE = 0x01;
        const BURST = 0x02;
        const WRAP = 0x04;
        const RAMSIZE = 0x08;
        const RAMWIDTH = 0x10;
        const REFRESH0 = 0x20;
        const REFRESH1 = 0x40;
        const TEST = 0x80;
    }
}

/// Access cycles the controller can be asked to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AccessMode {
    None,
    Burst,
    Page,
    Both,
}

impl AccessMode {
    pub const ALL: [AccessMode; 4] = [
        AccessMode::None,
        AccessMode::Burst,
        AccessMode::Page,
        AccessMode::Both,
    ];

    /// Register bits selecting this mode
    pub fn bits(self) -> ModeBits {
        match self {
            AccessMode::None => ModeBits::empty(),
            AccessMode::Burst => ModeBits::BURST,
            AccessMode::Page => ModeBits::PAGE,
            AccessMode::Both => ModeBits::BURST | ModeBits::PAGE,
        }
    }

    /// Decode the mode bits of a register value
    pub fn from_bits(bits: ModeBits) -> Self {
        match (bits.contains(ModeBits::BURST), bits.contains(ModeBits::PAGE)) {
            (false, false) => AccessMode::None,
            (true, false) => AccessMode::Burst,
            (false, true) => AccessMode::Page,
            (true, true) => AccessMode::Both,
        }
    }
}

/// Refresh rate selected by the REFRESH bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshRate {
    Clocks154,
    Clocks238,
    Clocks380,
    Off,
}

impl RefreshRate {
    fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => RefreshRate::Clocks154,
            1 => RefreshRate::Clocks238,
            2 => RefreshRate::Clocks380,
            _ => RefreshRate::Off,
        }
    }

    /// Controller clocks between refresh cycles
    pub fn clocks(self) -> Option<u32> {
        match self {
            RefreshRate::Clocks154 => Some(154),
            RefreshRate::Clocks238 => Some(238),
            RefreshRate::Clocks380 => Some(380),
            RefreshRate::Off => None,
        }
    }

    /// Time between refresh cycles in nanoseconds
    pub fn interval_ns(self) -> Option<u64> {
        match self {
            RefreshRate::Clocks154 => Some(6_160),
            RefreshRate::Clocks238 => Some(9_520),
            RefreshRate::Clocks380 => Some(15_200),
            RefreshRate::Off => None,
        }
    }

    /// Refresh interval expressed in counter ticks
    pub fn window_ticks(self, tick_hz: u64) -> Option<u64> {
        self.interval_ns()
            .map(|ns| (ns * tick_hz / 1_000_000_000).max(1))
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshRate::Clocks154 => write!(f, "154 clocks (6.16 usec)"),
            RefreshRate::Clocks238 => write!(f, "238 clocks (9.52 usec)"),
            RefreshRate::Clocks380 => write!(f, "380 clocks (15.2 usec)"),
            RefreshRate::Off => write!(f, "N/A clocks (No refresh)"),
        }
    }
}

/// Kind of DRAM installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModuleType {
    /// Supports static column (burst) cycles, e.g. MSM514402
    StaticColumn,
    /// Supports fast page cycles only, e.g. MSM514400
    FastPage,
    Unknown,
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleType::StaticColumn => write!(f, "Static Column (MSM514402, etc)"),
            ModuleType::FastPage => write!(f, "Fast Page Mode (MSM514400, etc)"),
            ModuleType::Unknown => write!(f, "Unknown type (PAGE and BURST are off)"),
        }
    }
}

/// Memory layout decoded from the control register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryConfig {
    #[serde(skip)]
    pub control: ModeBits,
    pub addrbits: AddrBits,
    /// Data bits per part (1 or 4)
    pub width: u32,
    /// Bytes per bank
    pub bank_size: u32,
    pub refresh: RefreshRate,
    /// Module type implied by the configured access mode
    pub module_type: ModuleType,
}

impl MemoryConfig {
    pub fn from_control(control: ModeBits) -> Self {
        let addrbits = if control.contains(ModeBits::RAMSIZE) {
            AddrBits::BITS_20
        } else {
            AddrBits::BITS_18
        };
        let width = if control.contains(ModeBits::RAMWIDTH) {
            4
        } else {
            1
        };
        let module_type = if control.contains(ModeBits::PAGE) {
            ModuleType::FastPage
        } else if control.contains(ModeBits::BURST) {
            ModuleType::StaticColumn
        } else {
            ModuleType::Unknown
        };

        Self {
            control,
            addrbits,
            width,
            bank_size: (1 << addrbits.get()) * width,
            refresh: RefreshRate::from_code(control.bits() >> 5),
            module_type,
        }
    }

    /// Read and decode the live control register
    pub fn read<P: Platform + ?Sized>(platform: &mut P) -> Self {
        Self::from_control(ModeBits::from_bits_retain(platform.read_control()))
    }
}

impl fmt::Display for MemoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} ({}KB per bank) {}",
            if self.addrbits == AddrBits::BITS_20 {
                "1M"
            } else {
                "256"
            },
            self.width,
            self.bank_size >> 10,
            self.module_type
        )
    }
}

/// Saved access-mode register with verified writes
///
/// Created by [`AccessModeRegister::save`]; every mode change made through it
/// can be undone with [`AccessModeRegister::restore`].
#[derive(Debug, Clone, Copy)]
pub struct AccessModeRegister {
    saved: u8,
    poll_limit: u32,
}

impl AccessModeRegister {
    /// Capture the current register value
    pub fn save<P: Platform + ?Sized>(platform: &mut P, poll_limit: u32) -> Self {
        let saved = platform.read_control();
        log::trace!("Saved access-mode register: 0x{:02X}", saved);
        Self {
            saved,
            poll_limit: poll_limit.max(1),
        }
    }

    pub fn saved(&self) -> ModeBits {
        ModeBits::from_bits_retain(self.saved)
    }

    /// Write a value and poll until it reads back
    ///
    /// # Errors
    ///
    /// Returns `DiagError::RegisterTimeout` if the value is not observed within
    /// the poll limit.
    pub fn write_verified<P: Platform + ?Sized>(&self, platform: &mut P, value: u8) -> Result<()> {
        platform.write_control(value);
        let mut observed = platform.read_control();
        let mut polls = 1;
        while observed != value {
            if polls >= self.poll_limit {
                log::warn!(
                    "Access-mode register stuck at 0x{:02X} (wanted 0x{:02X})",
                    observed,
                    value
                );
                return Err(DiagError::RegisterTimeout {
                    expected: value,
                    observed,
                    polls,
                });
            }
            observed = platform.read_control();
            polls += 1;
        }
        log::trace!("Access-mode register = 0x{:02X} after {} polls", value, polls);
        Ok(())
    }

    /// Select an access mode, keeping every other saved bit
    pub fn set_mode<P: Platform + ?Sized>(&self, platform: &mut P, mode: AccessMode) -> Result<()> {
        let base = self.saved() & !(ModeBits::PAGE | ModeBits::BURST);
        self.write_verified(platform, (base | mode.bits()).bits())
    }

    /// Put the saved value back
    pub fn restore<P: Platform + ?Sized>(&self, platform: &mut P) -> Result<()> {
        self.write_verified(platform, self.saved)
    }

    /// Run `f` with a temporary access mode
    ///
    /// The saved value is restored whether or not the mode change or `f`
    /// succeeded. The first error wins.
    pub fn with_mode<P, T, F>(&self, platform: &mut P, mode: AccessMode, f: F) -> Result<T>
    where
        P: Platform + ?Sized,
        F: FnOnce(&mut P) -> Result<T>,
    {
        let result = self.set_mode(platform, mode).and_then(|_| f(platform));
        let restored = self.restore(platform);
        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
        }
    }
}
