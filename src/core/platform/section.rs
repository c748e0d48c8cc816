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

//! Scoped critical sections

use super::{CpuInfo, Platform};
use bitflags::bitflags;
use std::ops::{Deref, DerefMut};

bitflags! {
    /// Resources a critical section takes over
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u8 {
        /// Turn the data cache off
        const NO_DATA_CACHE = 1 << 0;
        /// Turn MMU translation off
        const NO_MMU = 1 << 1;
        /// Run in supervisor state
        const SUPERVISOR = 1 << 2;
        /// Mask interrupts
        const INTERRUPTS = 1 << 3;

        /// What every memory measurement uses
        const MEASURE = Self::NO_DATA_CACHE.bits()
            | Self::SUPERVISOR.bits()
            | Self::INTERRUPTS.bits();
    }
}

impl SectionFlags {
    /// Add `NO_MMU` when the CPU is translating addresses
    ///
    /// The testers work on physical addresses, so an active translation
    /// table must be switched off for the duration of the section.
    pub fn physical(self, cpu: &CpuInfo) -> Self {
        if cpu.mmu {
            self | SectionFlags::NO_MMU
        } else {
            self
        }
    }
}

/// RAII guard over a platform
///
/// Acquires data cache, MMU, supervisor and interrupt state in that order and
/// releases them in reverse when dropped, including on early return. The
/// guard derefs to the platform so accesses go through it.
///
/// # Example
///
/// ```
/// use zipdiag::core::platform::{CriticalSection, Platform, SectionFlags};
/// use zipdiag::core::sim::SimBoard;
///
/// let mut board = SimBoard::default();
/// {
///     let mut cs = CriticalSection::new(&mut board, SectionFlags::MEASURE);
///     cs.write32(0x07C0_0000, 0x1234_5678);
///     assert_eq!(cs.read32(0x07C0_0000), 0x1234_5678);
/// }
/// assert_eq!(board.interrupt_depth(), 0);
/// ```
pub struct CriticalSection<'a, P: Platform + ?Sized> {
    platform: &'a mut P,
    flags: SectionFlags,
    saved_cache: bool,
    saved_mmu: bool,
    saved_supervisor: bool,
}

impl<'a, P: Platform + ?Sized> CriticalSection<'a, P> {
    /// Enter a critical section
    pub fn new(platform: &'a mut P, flags: SectionFlags) -> Self {
        let mut saved_cache = false;
        let mut saved_mmu = false;
        let mut saved_supervisor = false;

        if flags.contains(SectionFlags::NO_DATA_CACHE) {
            saved_cache = platform.set_data_cache(false);
        }
        if flags.contains(SectionFlags::NO_MMU) {
            saved_mmu = platform.set_mmu(false);
        }
        if flags.contains(SectionFlags::SUPERVISOR) {
            saved_supervisor = platform.set_supervisor(true);
        }
        if flags.contains(SectionFlags::INTERRUPTS) {
            platform.mask_interrupts();
        }

        Self {
            platform,
            flags,
            saved_cache,
            saved_mmu,
            saved_supervisor,
        }
    }

    pub fn flags(&self) -> SectionFlags {
        self.flags
    }
}

impl<P: Platform + ?Sized> Deref for CriticalSection<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.platform
    }
}

impl<P: Platform + ?Sized> DerefMut for CriticalSection<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.platform
    }
}

impl<P: Platform + ?Sized> Drop for CriticalSection<'_, P> {
    fn drop(&mut self) {
        if self.flags.contains(SectionFlags::INTERRUPTS) {
            self.platform.unmask_interrupts();
        }
        if self.flags.contains(SectionFlags::SUPERVISOR) {
            self.platform.set_supervisor(self.saved_supervisor);
        }
        if self.flags.contains(SectionFlags::NO_MMU) {
            self.platform.set_mmu(self.saved_mmu);
        }
        if self.flags.contains(SectionFlags::NO_DATA_CACHE) {
            self.platform.set_data_cache(self.saved_cache);
        }
    }
}
