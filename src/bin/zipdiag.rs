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

use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use zipdiag::core::config::DiagConfig;
use zipdiag::core::diagnostic::{Diagnostic, TestSelection};
use zipdiag::core::error::Result;
use zipdiag::core::platform::ModeBits;
use zipdiag::core::report::{to_json, MapSummary, RunSummary};
use zipdiag::core::sim::{FaultPlan, SimBoard};
use zipdiag::core::translate::{self, BANK_COUNT, NIBBLES};

/// Memory module fault isolation
#[derive(Parser)]
#[command(name = "zipdiag")]
#[command(about = "Locate faulty DRAM modules, data lines and address lines", long_about = None)]
struct Args {
    /// Address line test
    #[arg(long)]
    addr: bool,

    /// Data line test
    #[arg(long)]
    data: bool,

    /// Memory cell test
    #[arg(long)]
    cell: bool,

    /// Probe burst, page and static column support
    #[arg(long)]
    probe: bool,

    /// Thorough mode: more passes, walks and patterns
    #[arg(long)]
    long: bool,

    /// Bank 0 is populated with DIP parts
    #[arg(long)]
    dip: bool,

    /// Run even if a debugging monitor is active or the controller is unknown
    #[arg(long)]
    force: bool,

    /// More output; repeat for trace level
    #[arg(short = 'd', long, action = clap::ArgAction::Count)]
    debug: u8,

    /// TOML file with counts, thresholds and strategies
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show data and address line maps instead of testing
    #[arg(long)]
    map: bool,

    /// Generate address strobes for a logic analyser
    #[arg(long)]
    strobe: bool,

    /// Check the address conversion tables and exit
    #[arg(long)]
    selftest: bool,

    /// Emulated module density (18 = 256Kx4, 20 = 1Mx4)
    #[arg(long, default_value = "20", value_parser = parse_addrbits)]
    addrbits: u32,

    /// Emulate a data bit stuck low (bank:bit)
    #[arg(long, value_parser = parse_data_fault)]
    stuck0: Vec<(usize, u8)>,

    /// Emulate a data bit stuck high (bank:bit)
    #[arg(long, value_parser = parse_data_fault)]
    stuck1: Vec<(usize, u8)>,

    /// Emulate a floating data bit (bank:bit)
    #[arg(long = "float", value_parser = parse_data_fault)]
    floating: Vec<(usize, u8)>,

    /// Emulate a stuck address wire (bank:wire:0|1); wire 9 needs 1Mx4 parts
    #[arg(long, value_parser = parse_wire_fault)]
    wire: Vec<(usize, u8, bool)>,

    /// Emulate a bad memory cell (bank:nibble)
    #[arg(long = "cell-fault", value_parser = parse_cell_fault)]
    cell_fault: Vec<(usize, usize)>,
}

fn parse_fields(s: &str, count: usize) -> std::result::Result<Vec<u32>, String> {
    let fields: Vec<&str> = s.split(':').collect();
    if fields.len() != count {
        return Err(format!("expected {} fields separated by ':'", count));
    }
    fields
        .iter()
        .map(|f| f.trim().parse::<u32>().map_err(|e| format!("'{}': {}", f, e)))
        .collect()
}

fn parse_bank(value: u32) -> std::result::Result<usize, String> {
    if (value as usize) < BANK_COUNT {
        Ok(value as usize)
    } else {
        Err(format!("bank {} out of range (0-{})", value, BANK_COUNT - 1))
    }
}

fn parse_addrbits(s: &str) -> std::result::Result<u32, String> {
    let bits: u32 = s.parse().map_err(|e| format!("{}", e))?;
    translate::AddrBits::new(bits)
        .map(|b| b.get())
        .map_err(|e| e.to_string())
}

fn parse_data_fault(s: &str) -> std::result::Result<(usize, u8), String> {
    let f = parse_fields(s, 2)?;
    if f[1] >= 32 {
        return Err(format!("data bit {} out of range (0-31)", f[1]));
    }
    Ok((parse_bank(f[0])?, f[1] as u8))
}

fn parse_wire_fault(s: &str) -> std::result::Result<(usize, u8, bool), String> {
    let f = parse_fields(s, 3)?;
    if f[1] >= 10 {
        return Err(format!("address wire {} out of range (0-9)", f[1]));
    }
    if f[2] > 1 {
        return Err(format!("wire level must be 0 or 1, got {}", f[2]));
    }
    Ok((parse_bank(f[0])?, f[1] as u8, f[2] == 1))
}

fn parse_cell_fault(s: &str) -> std::result::Result<(usize, usize), String> {
    let f = parse_fields(s, 2)?;
    if f[1] as usize >= NIBBLES {
        return Err(format!("nibble {} out of range (0-7)", f[1]));
    }
    Ok((parse_bank(f[0])?, f[1] as usize))
}

impl Args {
    fn fault_plan(&self) -> FaultPlan {
        let mut plan = FaultPlan::new();
        for &(bank, bit) in &self.stuck0 {
            plan = plan.stuck0(bank, bit);
        }
        for &(bank, bit) in &self.stuck1 {
            plan = plan.stuck1(bank, bit);
        }
        for &(bank, bit) in &self.floating {
            plan = plan.floating(bank, bit);
        }
        for &(bank, wire, value) in &self.wire {
            plan = plan.wire(bank, wire, value);
        }
        for &(bank, nibble) in &self.cell_fault {
            plan = plan.bad_cell(bank, nibble);
        }
        plan
    }

    fn board(&self) -> Result<SimBoard> {
        let mut control = ModeBits::RAMWIDTH | ModeBits::BURST;
        if self.addrbits == 20 {
            control |= ModeBits::RAMSIZE;
        }
        let plan = self.fault_plan();
        plan.check(translate::AddrBits::new(self.addrbits)?)?;
        Ok(SimBoard::new(control).with_faults(plan))
    }

    fn diag_config(&self) -> Result<DiagConfig> {
        let mut config = match &self.config {
            Some(path) => DiagConfig::load(path)?,
            None => DiagConfig::default(),
        };
        config.thorough |= self.long;
        config.dip |= self.dip;
        Ok(config)
    }

    fn selection(&self) -> TestSelection {
        TestSelection {
            data: self.data,
            address: self.addr,
            cell: self.cell,
            probe: self.probe,
        }
    }
}

/// Exit status when the diagnostic could not run at all
const EXIT_FATAL: u8 = 255;

/// Error counts share the exit status with [`EXIT_FATAL`], so they stop
/// one short of it
fn exit_status(errors: u32) -> u8 {
    errors.min(EXIT_FATAL as u32 - 1) as u8
}

/// Returns the number of errors found
fn run(args: &Args) -> Result<u32> {
    if args.selftest {
        let mismatches = translate::selftest();
        if mismatches.is_empty() {
            println!("Address conversion self-test passed");
        }
        return Ok(mismatches.len() as u32);
    }

    let config = args.diag_config()?;
    let dip = config.dip;
    let board = args.board()?;
    if !board.faults().is_empty() {
        info!("Emulating faults: {:?}", board.faults());
    }
    let mut diag = Diagnostic::new(board, config).with_force(args.force);

    if args.strobe {
        let reads = diag.strobe()?;
        info!("{} strobe reads issued", reads);
        return Ok(0);
    }

    if args.map {
        let map = diag.map()?;
        if args.json {
            println!("{}", to_json(&map)?);
        } else {
            print!("{}", MapSummary { report: &map, dip });
        }
        return Ok(0);
    }

    let show_progress = !args.json;
    let mut last_bank = None;
    let report = diag.run(args.selection(), |p| {
        if !show_progress {
            return;
        }
        if last_bank.is_some_and(|b| b != p.bank) {
            print!(" ");
        }
        last_bank = Some(p.bank);
        print!(".");
        let _ = std::io::stdout().flush();
    })?;
    if show_progress && last_bank.is_some() {
        println!();
    }

    if args.json {
        println!("{}", to_json(&report)?);
    } else {
        print!(
            "{}",
            RunSummary {
                report: &report,
                debug: args.debug > 0,
                dip,
            }
        );
    }
    Ok(report.error_count())
}

fn main() -> ExitCode {
    // Load .env file if present; only complain about real errors
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let args = Args::parse();

    let level = match args.debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!("zipdiag v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(errors) => ExitCode::from(exit_status(errors)),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
