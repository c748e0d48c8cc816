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

//! Diagnostic configuration
//!
//! Every constant the testers depend on was tuned on real boards and differs
//! between board revisions, so none of them are hard-coded in the testers.
//! `DiagConfig::default()` reproduces the stock values; a TOML file can
//! override any subset.
//!
//! # Example
//!
//! ```
//! use zipdiag::core::config::{DiagConfig, DisturbStrategy};
//!
//! let config = DiagConfig::from_toml_str(
//!     r#"
//!     thorough = true
//!
//!     [data]
//!     disturb = { kind = "cross_bank_complement" }
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.data_passes(), 2048);
//! assert_eq!(config.data.disturb, DisturbStrategy::CrossBankComplement);
//! assert_eq!(config.cell.block_size, 4096);
//! ```

use crate::core::error::{DiagError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chip RAM word used to drive the bus away from the value under test
pub const DEFAULT_DISTURB_ADDRESS: u32 = 0x0001_0000;

/// How the data-line test defeats bus capacitance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisturbStrategy {
    /// Drive `!value` then `0` through a fixed chip RAM word, and read it back
    /// between the target write and the target read
    FixedAddress { address: u32 },
    /// Write `!value` to the same wire mask in the next bank
    CrossBankComplement,
}

impl Default for DisturbStrategy {
    fn default() -> Self {
        DisturbStrategy::FixedAddress {
            address: DEFAULT_DISTURB_ADDRESS,
        }
    }
}

/// How the data-line test keeps the data cache out of the measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// Leave the cache on and flush the line after every write
    LineFlush,
    /// Turn the data cache off for the whole measurement
    #[default]
    DisableCache,
}

/// Data-line test settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLineConfig {
    pub passes: u32,
    pub passes_thorough: u32,
    pub disturb: DisturbStrategy,
    pub cache: CacheStrategy,
}

impl Default for DataLineConfig {
    fn default() -> Self {
        Self {
            passes: 512,
            passes_thorough: 2048,
            disturb: DisturbStrategy::default(),
            cache: CacheStrategy::default(),
        }
    }
}

/// Address-line test settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressLineConfig {
    /// Background walks; even walks use all-zero, odd walks all-one
    pub walk_count: u32,
    pub walk_count_thorough: u32,
    pub bad_threshold: u16,
    pub bad_threshold_thorough: u16,
}

impl Default for AddressLineConfig {
    fn default() -> Self {
        Self {
            walk_count: 2,
            walk_count_thorough: 16,
            bad_threshold: 16,
            bad_threshold_thorough: 256,
        }
    }
}

/// Memory cell test settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Bytes saved, patterned and restored per critical section
    pub block_size: usize,
    /// Number of rotating patterns used (1-13)
    pub patterns: usize,
    pub patterns_thorough: usize,
    /// Progress is reported and early exit checked once per stride
    pub progress_stride: u32,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            block_size: 4096,
            patterns: 3,
            patterns_thorough: 13,
            progress_stride: 0x4_0000,
        }
    }
}

/// Capability probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Bytes read per timed measurement
    pub size: usize,
    /// A mode must beat plain access by more than this to count
    pub threshold_percent: u32,
    /// Reads allowed for the access-mode register to show a written value
    pub register_poll_limit: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            size: 0x1_0000,
            threshold_percent: 4,
            register_poll_limit: 1000,
        }
    }
}

/// Complete diagnostic configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    /// Use the thorough column of every count and threshold
    pub thorough: bool,
    /// Bank 0 is populated with DIP parts
    pub dip: bool,
    pub data: DataLineConfig,
    pub address: AddressLineConfig,
    pub cell: CellConfig,
    pub probe: ProbeConfig,
}

impl DiagConfig {
    /// Parse and validate a TOML document
    ///
    /// Missing keys keep their default values.
    ///
    /// # Errors
    ///
    /// Returns `DiagError::Config` on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DiagConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns `DiagError::Io` if the file cannot be read, otherwise as
    /// [`DiagConfig::from_toml_str`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.data.passes == 0 || self.data.passes_thorough == 0 {
            return Err(DiagError::Config("data passes must be nonzero".into()));
        }
        if let DisturbStrategy::FixedAddress { address } = self.data.disturb {
            if address & 3 != 0 || address >= 0x0020_0000 {
                return Err(DiagError::Config(format!(
                    "disturb address 0x{:08X} must be a longword in chip RAM",
                    address
                )));
            }
        }
        if self.address.walk_count == 0 || self.address.walk_count_thorough == 0 {
            return Err(DiagError::Config("walk count must be nonzero".into()));
        }
        let block = self.cell.block_size;
        if block == 0 || !block.is_power_of_two() || block > 0x10_0000 {
            return Err(DiagError::Config(format!(
                "cell block size {} must be a power of two up to 1MB",
                block
            )));
        }
        for n in [self.cell.patterns, self.cell.patterns_thorough] {
            if !(1..=13).contains(&n) {
                return Err(DiagError::Config(format!(
                    "cell pattern count {} out of range (1-13)",
                    n
                )));
            }
        }
        if self.cell.progress_stride == 0 || self.cell.progress_stride as usize % block != 0 {
            return Err(DiagError::Config(
                "progress stride must be a nonzero multiple of the block size".into(),
            ));
        }
        if self.probe.size < 64 || self.probe.size % 4 != 0 {
            return Err(DiagError::Config(
                "probe size must be at least 64 bytes and longword aligned".into(),
            ));
        }
        Ok(())
    }

    pub fn data_passes(&self) -> u32 {
        if self.thorough {
            self.data.passes_thorough
        } else {
            self.data.passes
        }
    }

    pub fn walk_count(&self) -> u32 {
        if self.thorough {
            self.address.walk_count_thorough
        } else {
            self.address.walk_count
        }
    }

    pub fn bad_threshold(&self) -> u16 {
        if self.thorough {
            self.address.bad_threshold_thorough
        } else {
            self.address.bad_threshold
        }
    }

    pub fn cell_patterns(&self) -> usize {
        if self.thorough {
            self.cell.patterns_thorough
        } else {
            self.cell.patterns
        }
    }
}
