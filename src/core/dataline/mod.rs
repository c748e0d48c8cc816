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

//! Data line fault detection
//!
//! Holds the address lines of a bank at wire mask 0 and walks six patterns
//! across the data lines:
//!
//! | Pattern       | Exposes                      |
//! |---------------|------------------------------|
//! | `0x00000000`  | stuck high                   |
//! | `0xFFFFFFFF`  | stuck low                    |
//! | `bitvals`     | floating (bits of interest)  |
//! | `!bitvals`    | floating (everything else)   |
//! | `0xA5A5A5A5`  | floating, adjacent coupling  |
//! | `0x5A5A5A5A`  | floating, adjacent coupling  |
//!
//! Every readback is preceded by a disturb step that drives the bus to a
//! different level, so a line that is not driven at all cannot pass by
//! echoing the value just written. All accesses run with interrupts masked
//! and the data cache out of the way.
//!
//! Each bit is then classified from the aggregates, in priority order:
//! never read high is Stuck0, always read high is Stuck1, ever mismatched is
//! Floating, otherwise Good.

use crate::core::config::{CacheStrategy, DiagConfig, DisturbStrategy};
use crate::core::platform::{CriticalSection, Platform, SectionFlags};
use crate::core::socket::{SocketEntry, DIP_BANK, DIP_SOCKETS, ZIP_SOCKETS};
use crate::core::status::{BitStatus, LineAggregate};
use crate::core::translate::{bank_of, to_address, to_wire_mask, AddrBits, BANK_COUNT};
use serde::Serialize;

/// Result for one ZIP socket
#[derive(Debug, Clone, Serialize)]
pub struct DataLineResult {
    pub socket: SocketEntry,
    /// Address the socket was tested at
    pub address: u32,
    /// Per IO pin, `None` when the socket was not tested
    pub pins: Option<[BitStatus; 4]>,
}

/// Result for one DIP socket
#[derive(Debug, Clone, Serialize)]
pub struct DipResult {
    pub socket: SocketEntry,
    pub pins: [BitStatus; 4],
}

/// Data line results for the DIP population of bank 0
#[derive(Debug, Clone, Serialize)]
pub struct DipReport {
    pub address: u32,
    pub rows: Vec<DipResult>,
}

/// Complete data line test output
#[derive(Debug, Clone, Serialize)]
pub struct DataLineReport {
    pub rows: Vec<DataLineResult>,
    pub dip: Option<DipReport>,
    /// Measurements whose bits of interest ever mismatched
    pub errors: u32,
}

impl DataLineReport {
    /// Pin status of the ZIP socket at (bank, nibble)
    pub fn status(&self, bank: usize, nibble: usize) -> Option<[BitStatus; 4]> {
        self.rows
            .iter()
            .find(|r| r.socket.bank == bank && r.socket.nibble == nibble)
            .and_then(|r| r.pins)
    }

    /// True when every tested pin is Good
    pub fn all_good(&self) -> bool {
        let zip = self
            .rows
            .iter()
            .filter_map(|r| r.pins)
            .all(|pins| pins.iter().all(|&s| s == BitStatus::Good));
        let dip = self.dip.as_ref().is_none_or(|d| {
            d.rows
                .iter()
                .all(|r| r.pins.iter().all(|&s| s == BitStatus::Good))
        });
        zip && dip
    }
}

/// Data line fault detector
pub struct DataLineFaultDetector<'a> {
    config: &'a DiagConfig,
    addrbits: AddrBits,
}

impl<'a> DataLineFaultDetector<'a> {
    const PATTERN_A5: u32 = 0xA5A5_A5A5;
    const PATTERN_5A: u32 = 0x5A5A_5A5A;

    pub fn new(config: &'a DiagConfig, addrbits: AddrBits) -> Self {
        Self { config, addrbits }
    }

    /// Write one value and read it back through the disturb sequence
    ///
    /// Both the target and the disturb location are restored before
    /// returning. Must be called with interrupts already masked.
    pub fn test_value<P: Platform + ?Sized>(&self, platform: &mut P, addr: u32, value: u32) -> u32 {
        let flush = self.config.data.cache == CacheStrategy::LineFlush;

        match self.config.data.disturb {
            DisturbStrategy::FixedAddress { address: disturb } => {
                let orig_target = platform.read32(addr);
                let orig_disturb = platform.read32(disturb);

                platform.write32(disturb, !value);
                platform.write32(disturb, 0);
                if flush {
                    platform.flush_cache_line(disturb, 4);
                }
                platform.write32(addr, value);
                if flush {
                    platform.flush_cache_line(addr, 4);
                }
                let _ = platform.read32(disturb);
                let result = platform.read32(addr);

                platform.write32(addr, orig_target);
                platform.write32(disturb, orig_disturb);
                result
            }
            DisturbStrategy::CrossBankComplement => {
                let mask = to_wire_mask(addr, self.addrbits);
                let bank = bank_of(addr, self.addrbits).unwrap_or(0);
                let other = to_address((bank + 1) % BANK_COUNT, mask, self.addrbits);

                let orig_target = platform.read32(addr);
                let orig_other = platform.read32(other);

                platform.write32(addr, value);
                platform.write32(other, !value);
                if flush {
                    platform.flush_cache_line(addr, 4);
                    platform.flush_cache_line(other, 4);
                }
                let result = platform.read32(addr);

                platform.write32(addr, orig_target);
                platform.write32(other, orig_other);
                result
            }
        }
    }

    /// Run the pattern sequence repeatedly and aggregate the readbacks
    ///
    /// Stops early once every bit of `bitvals` has already shown floating
    /// behaviour.
    pub fn measure<P: Platform + ?Sized>(&self, platform: &mut P, addr: u32, bitvals: u32) -> LineAggregate {
        let patterns = [
            0x0000_0000,
            0xFFFF_FFFF,
            bitvals,
            !bitvals,
            Self::PATTERN_A5,
            Self::PATTERN_5A,
        ];
        let cache_flags = match self.config.data.cache {
            CacheStrategy::DisableCache => SectionFlags::NO_DATA_CACHE,
            CacheStrategy::LineFlush => SectionFlags::empty(),
        };

        let mut agg = LineAggregate::new();
        let outer_flags = cache_flags.physical(&platform.cpu());
        let mut outer = CriticalSection::new(platform, outer_flags);

        'passes: for _ in 0..self.config.data_passes() {
            let mut cs = CriticalSection::new(
                &mut *outer,
                SectionFlags::SUPERVISOR | SectionFlags::INTERRUPTS,
            );
            for &value in patterns.iter() {
                let result = self.test_value(&mut *cs, addr, value);
                agg.record(value, result);
                if agg.saturated(bitvals) {
                    log::trace!("{:08x}: bits {:08x} already floating", addr, bitvals);
                    break 'passes;
                }
            }
        }

        log::trace!(
            "{:08x} bitvals={:08x} or={:08x} and={:08x} diff={:08x}",
            addr,
            bitvals,
            agg.or,
            agg.and,
            agg.diff
        );
        agg
    }

    /// Test one socket, all pins at once or one pin at a time
    fn test_socket<P: Platform + ?Sized>(&self, platform: &mut P, socket: &SocketEntry, addr: u32, errors: &mut u32) -> [BitStatus; 4] {
        let mut pins = [BitStatus::Good; 4];

        if self.config.thorough {
            for (io_pin, status) in pins.iter_mut().enumerate() {
                let bitvals = socket.pin_mask(io_pin);
                let agg = self.measure(platform, addr, bitvals);
                if agg.diff & bitvals != 0 {
                    *errors += 1;
                }
                *status = agg.classify(bitvals);
            }
        } else {
            let bitvals = socket.bitvals();
            let agg = self.measure(platform, addr, bitvals);
            if agg.diff & bitvals != 0 {
                *errors += 1;
            }
            for (io_pin, status) in pins.iter_mut().enumerate() {
                *status = agg.classify(socket.pin_mask(io_pin));
            }
        }
        pins
    }

    fn test_dip<P: Platform + ?Sized>(&self, platform: &mut P, errors: &mut u32) -> DipReport {
        let address = to_address(DIP_BANK, 0, self.addrbits);

        let rows = if self.config.thorough {
            DIP_SOCKETS
                .iter()
                .map(|socket| DipResult {
                    socket: *socket,
                    pins: self.test_socket(platform, socket, address, errors),
                })
                .collect()
        } else {
            // All 32 bits in one measurement
            let agg = self.measure(platform, address, 0xFFFF_FFFF);
            if agg.diff != 0 {
                *errors += 1;
            }
            DIP_SOCKETS
                .iter()
                .map(|socket| {
                    let mut pins = [BitStatus::Good; 4];
                    for (io_pin, status) in pins.iter_mut().enumerate() {
                        *status = agg.classify(socket.pin_mask(io_pin));
                    }
                    DipResult {
                        socket: *socket,
                        pins,
                    }
                })
                .collect()
        };

        DipReport { address, rows }
    }

    /// Test every socket
    pub fn run<P: Platform + ?Sized>(&self, platform: &mut P) -> DataLineReport {
        log::info!(
            "Data line test ({} passes{})",
            self.config.data_passes(),
            if self.config.thorough { ", per pin" } else { "" }
        );

        let mut errors = 0;
        let mut rows = Vec::with_capacity(ZIP_SOCKETS.len());

        for socket in ZIP_SOCKETS.iter() {
            let address = to_address(socket.bank, 0, self.addrbits);
            let pins = if self.config.dip && socket.bank == DIP_BANK {
                None
            } else {
                Some(self.test_socket(platform, socket, address, &mut errors))
            };
            if let Some(pins) = pins {
                log::debug!(
                    "{} {}.{}: {} {} {} {}",
                    socket.label,
                    socket.bank,
                    socket.nibble,
                    pins[0],
                    pins[1],
                    pins[2],
                    pins[3]
                );
            }
            rows.push(DataLineResult {
                socket: *socket,
                address,
                pins,
            });
        }

        let dip = if self.config.dip {
            Some(self.test_dip(platform, &mut errors))
        } else {
            None
        };

        log::info!("Data line test complete: {} errors", errors);
        DataLineReport { rows, dip, errors }
    }
}

#[cfg(test)]
mod tests;
