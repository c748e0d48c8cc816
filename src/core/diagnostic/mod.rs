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

//! Diagnostic run orchestration
//!
//! Ties the testers together the way the command-line tool runs them:
//! preflight first, then the capability probe (when asked for), the data
//! line test, the address line test and finally the cell sweep.

use super::addrline::{AddressLineFaultIsolator, AddressLineReport};
use super::cell::{CellPatternTester, CellProgress, CellReport};
use super::config::DiagConfig;
use super::dataline::{DataLineFaultDetector, DataLineReport};
use super::error::{DiagError, Result};
use super::platform::{preflight, CpuInfo, MemoryConfig, Platform};
use super::probe::{CapabilityProbe, ProbeReport};
use super::strobe::generate_strobes;
use super::translate::{address_line_map, WireMapEntry};
use serde::Serialize;

/// Which tests to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSelection {
    pub data: bool,
    pub address: bool,
    pub cell: bool,
    pub probe: bool,
}

impl TestSelection {
    /// Data, address and cell tests
    pub fn all() -> Self {
        Self {
            data: true,
            address: true,
            cell: true,
            probe: false,
        }
    }

    /// Fall back to the three fault tests when none was picked
    pub fn or_default(self) -> Self {
        if self.data || self.address || self.cell {
            self
        } else {
            Self {
                probe: self.probe,
                ..Self::all()
            }
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub memory: MemoryConfig,
    pub cpu: CpuInfo,
    pub probe: Option<ProbeReport>,
    pub data: Option<DataLineReport>,
    pub address: Option<AddressLineReport>,
    pub cell: Option<CellReport>,
    /// Set when the cell test could not start
    pub cell_error: Option<String>,
}

impl RunReport {
    /// Sum of the error counts of every test that ran
    pub fn error_count(&self) -> u32 {
        self.data.as_ref().map_or(0, |r| r.errors)
            + self.address.as_ref().map_or(0, |r| r.errors)
            + self.cell.as_ref().map_or(0, |r| r.errors)
    }
}

/// Map mode output: pin assignments are static, only addresses depend on
/// the installed modules
#[derive(Debug, Clone, Serialize)]
pub struct MapReport {
    pub memory: MemoryConfig,
    pub address_map: Vec<WireMapEntry>,
}

/// Diagnostic session over one platform
///
/// # Example
///
/// ```
/// use zipdiag::core::config::DiagConfig;
/// use zipdiag::core::diagnostic::{Diagnostic, TestSelection};
/// use zipdiag::core::sim::{FaultPlan, SimBoard};
///
/// let board = SimBoard::default().with_faults(FaultPlan::new().stuck0(1, 13));
/// let mut config = DiagConfig::default();
/// config.data.passes = 16;
///
/// let mut diag = Diagnostic::new(board, config);
/// let selection = TestSelection { data: true, ..Default::default() };
/// let report = diag.run(selection, |_| {}).unwrap();
/// assert_eq!(report.error_count(), 1);
/// ```
pub struct Diagnostic<P: Platform> {
    /// Machine under test
    platform: P,
    /// Counts, thresholds and strategies
    config: DiagConfig,
    /// Skip the monitor and controller version checks
    force: bool,
}

impl<P: Platform> Diagnostic<P> {
    pub fn new(platform: P, config: DiagConfig) -> Self {
        Self {
            platform,
            config,
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn config(&self) -> &DiagConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    /// Validate the configuration, run preflight and decode the memory
    /// configuration
    fn prepare(&mut self) -> Result<MemoryConfig> {
        self.config.validate().inspect_err(|e| {
            log::error!("{}", e);
        })?;
        preflight(&mut self.platform, self.force).inspect_err(|e| {
            log::error!("{}", e);
        })?;

        let memory = MemoryConfig::read(&mut self.platform);
        log::info!("Memory config: {}", memory);
        log::info!("Memory refresh: {}", memory.refresh);
        Ok(memory)
    }

    /// Run the selected tests
    ///
    /// # Arguments
    ///
    /// * `selection` - Tests to run; see [`TestSelection::or_default`]
    /// * `progress` - Called during the cell sweep
    ///
    /// # Returns
    ///
    /// The results of every test that ran. A cell test that cannot allocate
    /// its buffer is recorded in [`RunReport::cell_error`] and does not stop
    /// the run.
    ///
    /// # Errors
    ///
    /// Returns `DiagError::Config` for out-of-range settings and the
    /// preflight error if the environment is unsafe; no memory has been
    /// touched in either case.
    pub fn run<F>(&mut self, selection: TestSelection, progress: F) -> Result<RunReport>
    where
        F: FnMut(CellProgress),
    {
        let memory = self.prepare()?;
        let bits = memory.addrbits;
        let selection = selection.or_default();

        let mut report = RunReport {
            memory,
            cpu: self.platform.cpu(),
            probe: None,
            data: None,
            address: None,
            cell: None,
            cell_error: None,
        };

        if selection.probe {
            report.probe = Some(CapabilityProbe::new(&self.config, bits).run(&mut self.platform));
        }

        if selection.data {
            let detector = DataLineFaultDetector::new(&self.config, bits);
            report.data = Some(detector.run(&mut self.platform));
        }

        if selection.address {
            let isolator = AddressLineFaultIsolator::new(&self.config, bits);
            let mut address = isolator.run(&mut self.platform);
            address.module_type = report.probe.as_ref().map(|p| p.module_type);
            report.address = Some(address);
        }

        if selection.cell {
            let tester = CellPatternTester::new(&self.config, bits);
            match tester.run(&mut self.platform, progress) {
                Ok(cell) => report.cell = Some(cell),
                Err(e @ DiagError::AllocationFailed { .. }) => {
                    report.cell_error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("{} errors", report.error_count());
        Ok(report)
    }

    /// Generate address strobes for a logic analyser
    ///
    /// # Returns
    ///
    /// Number of reads issued.
    pub fn strobe(&mut self) -> Result<usize> {
        let memory = self.prepare()?;
        Ok(generate_strobes(&mut self.platform, memory.addrbits))
    }

    /// Collect the address line map for the installed modules
    pub fn map(&mut self) -> Result<MapReport> {
        let memory = self.prepare()?;
        Ok(MapReport {
            address_map: address_line_map(memory.addrbits),
            memory,
        })
    }
}

#[cfg(test)]
mod tests;
