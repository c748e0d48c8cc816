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

//! Environment checks run before any memory is touched
//!
//! A failure here aborts the whole run. Only controller registers and the
//! platform's own bookkeeping are consulted; no test memory is read or
//! written.

use super::Platform;
use crate::core::error::{DiagError, Result};
use std::ops::RangeInclusive;

/// Controller revisions whose register layout is understood
pub const SUPPORTED_VERSIONS: RangeInclusive<u8> = 0x04..=0x0D;

/// Debugging monitors that trap the raw accesses the tests make
pub const KNOWN_CONFLICTS: [&str; 2] = ["Enforcer", "MuForce"];

/// End of chip RAM; the diagnostic must live below it
pub const CHIP_RAM_END: u32 = 0x0020_0000;

/// Verify the memory controller revision
pub fn check_controller<P: Platform + ?Sized>(platform: &mut P) -> Result<u8> {
    let version = platform.controller_version();
    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(DiagError::UnsupportedController { version });
    }
    log::debug!("Memory controller version ${:02x}", version);
    Ok(version)
}

/// Refuse to run alongside a monitor that would trap test accesses
pub fn check_conflicts<P: Platform + ?Sized>(platform: &P) -> Result<()> {
    for tool in platform.running_tools() {
        let lower = tool.to_ascii_lowercase();
        if let Some(name) = KNOWN_CONFLICTS
            .iter()
            .find(|c| lower.contains(&c.to_ascii_lowercase()))
        {
            return Err(DiagError::ConflictingTool((*name).to_string()));
        }
    }
    Ok(())
}

/// Require stack, code and read-only data to be in chip RAM
///
/// Every offending section is reported, not just the first.
pub fn check_residency<P: Platform + ?Sized>(platform: &P) -> Result<()> {
    let offenders: Vec<String> = platform
        .resident_sections()
        .into_iter()
        .filter(|&(_, addr)| addr >= CHIP_RAM_END)
        .map(|(name, addr)| format!("{}=0x{:07x}", name, addr))
        .collect();

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(DiagError::UnsafeResidency(offenders))
    }
}

/// Run all environment checks
///
/// `force` skips the monitor and controller checks but never the residency
/// check: code running from the memory under test would corrupt itself.
pub fn preflight<P: Platform + ?Sized>(platform: &mut P, force: bool) -> Result<()> {
    if force {
        log::warn!("Skipping monitor and controller checks");
    } else {
        check_conflicts(platform)?;
        check_controller(platform)?;
    }
    check_residency(platform)
}
