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

//! Result rendering
//!
//! Plain-text tables laid out like the board: two sockets per line, left
//! column first. Each table is a `Display` wrapper so callers can print it
//! or collect it into a string. [`to_json`] serializes any report instead.

use crate::core::addrline::AddressLineReport;
use crate::core::cell::CellReport;
use crate::core::dataline::{DataLineReport, DipReport};
use crate::core::diagnostic::{MapReport, RunReport};
use crate::core::error::Result;
use crate::core::platform::AccessMode;
use crate::core::probe::ProbeReport;
use crate::core::socket::{SocketEntry, SocketPosition, DIP_SOCKETS, ZIP_SOCKETS};
use crate::core::status::{CellStatus, WireStatus};
use crate::core::translate::{to_address, AddrBits, WireMapEntry};
use serde::Serialize;
use std::fmt;

const SOCKET_L1: &str = "Socket   ADDR    IO1  IO2  IO3  IO4 ";
const SOCKET_L2: &str = "-------- ------- ---- ---- ---- ----";
const A9A0: &str = " A9 A8 A7 A6 A5 A4 A3 A2 A1 A0";
const DASHES: &str = " -- -- -- -- -- -- -- -- -- --";

/// Serialize a report as pretty-printed JSON
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// End a socket cell: right column ends the line
fn end_socket(f: &mut fmt::Formatter<'_>, socket: &SocketEntry, gap: &str) -> fmt::Result {
    if socket.position == SocketPosition::Right {
        writeln!(f)
    } else {
        write!(f, "{}", gap)
    }
}

fn dip_header(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "\n      ")?;
    for socket in DIP_SOCKETS.iter() {
        write!(f, "{:<6}", socket.label)?;
    }
    write!(f, "\n      ")?;
    for socket in DIP_SOCKETS.iter() {
        write!(f, "{}.{:<4}", socket.bank, socket.nibble)?;
    }
    write!(f, "\n     ")?;
    for _ in DIP_SOCKETS.iter() {
        write!(f, " -----")?;
    }
    writeln!(f)
}

/// Data line results
pub struct DataLineTable<'a>(pub &'a DataLineReport);

impl fmt::Display for DataLineTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data line test")?;
        writeln!(f, "  {}  {}", SOCKET_L1, SOCKET_L1)?;
        writeln!(f, "  {}  {}", SOCKET_L2, SOCKET_L2)?;
        for row in &self.0.rows {
            let s = &row.socket;
            write!(f, "  {} {}.{} {:07x}", s.label, s.bank, s.nibble, row.address + s.nibble as u32 / 2)?;
            match row.pins {
                Some(pins) => {
                    for status in pins {
                        write!(f, " {:<4}", status.symbol())?;
                    }
                }
                None => write!(f, " ---- ---- ---- ----")?,
            }
            end_socket(f, s, "")?;
        }
        if let Some(dip) = &self.0.dip {
            write!(f, "{}", DipDataTable(dip))?;
        }
        Ok(())
    }
}

/// Data line results for DIP parts, one row per IO pin
pub struct DipDataTable<'a>(pub &'a DipReport);

impl fmt::Display for DipDataTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dip_header(f)?;
        for io_pin in 0..4 {
            write!(f, "  IO{} ", io_pin + 1)?;
            for row in &self.0.rows {
                write!(f, "{:<6}", row.pins[io_pin].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Data bit driven by every socket pin
pub struct DataLineMap {
    pub addrbits: AddrBits,
    pub dip: bool,
}

impl fmt::Display for DataLineMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data line map")?;
        writeln!(f, "  {}  {}", SOCKET_L1, SOCKET_L1)?;
        writeln!(f, "  {}  {}", SOCKET_L2, SOCKET_L2)?;
        for s in ZIP_SOCKETS.iter() {
            let addr = to_address(s.bank, 0, self.addrbits);
            write!(f, "  {} {}.{} {:07x}", s.label, s.bank, s.nibble, addr + s.nibble as u32 / 2)?;
            for pin in s.pins {
                write!(f, "  {:2} ", pin)?;
            }
            end_socket(f, s, "")?;
        }
        if self.dip {
            dip_header(f)?;
            for io_pin in 0..4 {
                write!(f, "  IO{} ", io_pin + 1)?;
                for s in DIP_SOCKETS.iter() {
                    write!(f, "{:<6}", s.pins[io_pin])?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Address line results
pub struct AddressLineTable<'a> {
    pub report: &'a AddressLineReport,
    /// Show raw mismatch counts instead of statuses
    pub debug: bool,
    pub dip: bool,
}

impl AddressLineTable<'_> {
    fn cell(&self, f: &mut fmt::Formatter<'_>, bank: usize, wire: usize, nibble: usize) -> fmt::Result {
        let count = self.report.badcount.get(bank, wire, nibble);
        if self.debug {
            write!(f, " {:2}", count.min(99))
        } else {
            write!(f, " {:<2}", self.report.status(bank, wire, nibble).symbol())
        }
    }
}

impl fmt::Display for AddressLineTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cas = self.report.cas_bits as usize;

        writeln!(f, "Address line test")?;
        writeln!(f, "  Socket  {}  Socket  {}", A9A0, A9A0)?;
        writeln!(f, "  --------{}  --------{}", DASHES, DASHES)?;
        for s in ZIP_SOCKETS.iter() {
            write!(f, "  {} {}.{}", s.label, s.bank, s.nibble)?;
            if cas < 10 {
                write!(f, " NA")?;
            }
            for wire in (0..cas).rev() {
                self.cell(f, s.bank, wire, s.nibble)?;
            }
            end_socket(f, s, "")?;
        }

        if self.dip {
            dip_header(f)?;
            for wire in 0..cas {
                write!(f, "  A{} ", wire)?;
                for s in DIP_SOCKETS.iter() {
                    if self.debug {
                        write!(f, " {:5}", self.report.badcount.get(s.bank, wire, s.nibble))?;
                    } else {
                        let label = match self.report.status(s.bank, wire, s.nibble) {
                            WireStatus::Good => "Good",
                            WireStatus::Suspect => "?",
                            WireStatus::Bad => "!",
                        };
                        write!(f, " {:<5}", label)?;
                    }
                }
                writeln!(f)?;
            }
        }

        if let Some(module_type) = self.report.module_type {
            writeln!(f, "  Detected modules: {}", module_type)?;
        }
        if self.report.overruns > 0 {
            writeln!(
                f,
                "  Warning: {} sections exceeded the refresh interval",
                self.report.overruns
            )?;
        }
        Ok(())
    }
}

/// Physical address that drives each single wire bit of bank 0
pub struct AddressLineMap<'a> {
    pub addrbits: AddrBits,
    pub entries: &'a [WireMapEntry],
}

impl fmt::Display for AddressLineMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.addrbits.get();
        let cas = self.addrbits.cas_bits();
        let uscore = "_____________";

        writeln!(f, "Address line map")?;
        writeln!(f, "  Bank 0  {}RAS{} {}CAS{}", uscore, uscore, uscore, uscore)?;
        writeln!(f, "  Address{}{}", A9A0, A9A0)?;
        writeln!(f, "  -------{}{}", DASHES, DASHES)?;
        for entry in self.entries {
            write!(f, "  {:07x} ", entry.address)?;
            for abit in (1..=bits).rev() {
                if abit == bits && cas == 9 {
                    write!(f, "NA")?;
                }
                if abit == cas {
                    write!(f, " ")?;
                    if cas == 9 {
                        write!(f, "NA")?;
                    }
                }
                write!(f, "{:3}", (entry.mask >> (abit - 1)) & 1)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Memory cell results
pub struct CellTable<'a> {
    pub report: &'a CellReport,
    pub dip: bool,
}

impl fmt::Display for CellTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory cell test")?;
        writeln!(f, "  Socket   Result   Socket   Result")?;
        writeln!(f, "  -------- ------   -------- ------")?;
        for s in ZIP_SOCKETS.iter() {
            let label = match self.report.status(s.bank, s.nibble) {
                CellStatus::Good => "Good",
                CellStatus::Bad => "!",
            };
            write!(f, "  {} {}.{} {:<4}", s.label, s.bank, s.nibble, label)?;
            end_socket(f, s, "   ")?;
        }
        if self.dip {
            dip_header(f)?;
            write!(f, "     ")?;
            for s in DIP_SOCKETS.iter() {
                let label = match self.report.status(s.bank, s.nibble) {
                    CellStatus::Good => "Good",
                    CellStatus::Bad => "BAD",
                };
                write!(f, " {:<5}", label)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Capability probe summary
pub struct ProbeSummary<'a>(pub &'a ProbeReport);

impl fmt::Display for ProbeSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "Access capability probe")?;
        for t in &p.timings {
            let name = match t.mode {
                AccessMode::None => "None",
                AccessMode::Burst => "Burst",
                AccessMode::Page => "Page",
                AccessMode::Both => "Both",
            };
            writeln!(f, "  {:<6}{:>10} ticks", name, t.ticks)?;
        }
        writeln!(
            f,
            "  Burst capable: {}  Page capable: {}",
            if p.burst_capable { "yes" } else { "no" },
            if p.page_capable { "yes" } else { "no" }
        )?;
        if let Some(sc) = &p.static_column {
            for (bank, modules) in sc.iter().enumerate() {
                write!(f, "  Bank {} static column:", bank)?;
                for ok in modules.iter().rev() {
                    write!(f, " {}", if *ok { "Y" } else { "N" })?;
                }
                writeln!(f)?;
            }
        }
        writeln!(f, "  Detected: {}", p.module_type)?;
        writeln!(f, "  Configured: {}", p.configured)?;
        if let Some(e) = &p.error {
            writeln!(f, "  Probe aborted: {}", e)?;
        }
        Ok(())
    }
}

/// Complete run in the order the tests ran
pub struct RunSummary<'a> {
    pub report: &'a RunReport,
    pub debug: bool,
    pub dip: bool,
}

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.report;
        writeln!(f, "Memory config: {}", r.memory)?;
        writeln!(f, "Memory refresh: {}", r.memory.refresh)?;

        if let Some(probe) = &r.probe {
            write!(f, "\n{}", ProbeSummary(probe))?;
        }
        if let Some(data) = &r.data {
            write!(f, "\n{}", DataLineTable(data))?;
        }
        if let Some(address) = &r.address {
            let table = AddressLineTable {
                report: address,
                debug: self.debug,
                dip: self.dip,
            };
            write!(f, "\n{}", table)?;
        }
        if let Some(cell) = &r.cell {
            write!(f, "\n{}", CellTable { report: cell, dip: self.dip })?;
        }
        if let Some(e) = &r.cell_error {
            writeln!(f, "\nMemory cell test\n  {}", e)?;
        }
        writeln!(f, "\n{} errors", r.error_count())
    }
}

/// Map mode output
pub struct MapSummary<'a> {
    pub report: &'a MapReport,
    pub dip: bool,
}

impl fmt::Display for MapSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.report.memory.addrbits;
        writeln!(f, "Memory config: {}", self.report.memory)?;
        write!(f, "\n{}", DataLineMap { addrbits: bits, dip: self.dip })?;
        write!(
            f,
            "\n{}",
            AddressLineMap {
                addrbits: bits,
                entries: &self.report.address_map,
            }
        )
    }
}
