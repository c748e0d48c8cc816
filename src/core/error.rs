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

/// Diagnostic error types
use thiserror::Error;

/// Result type for diagnostic operations
pub type Result<T> = std::result::Result<T, DiagError>;

/// Main error type for the diagnostic
///
/// Measurement faults (stuck or floating bits, bad cells) are never errors;
/// they are the output of the tests. Only environment problems, scratch
/// allocation failures and register handshake timeouts end up here.
#[derive(Error, Debug)]
pub enum DiagError {
    #[error("Unrecognized memory controller version ${version:02x} (expected $04-$0d)")]
    UnsupportedController { version: u8 },

    #[error("{0} is present; disable it first")]
    ConflictingTool(String),

    #[error("Not resident in chip memory: {}", .0.join(", "))]
    UnsafeResidency(Vec<String>),

    #[error("Invalid address width: {0} bits (expected 18 or 20)")]
    InvalidAddrBits(u32),

    #[error("Invalid bank index: {bank} (valid range: 0-{max})")]
    InvalidBank { bank: usize, max: usize },

    #[error("Cannot allocate {bytes} bytes of chip memory for test buffer")]
    AllocationFailed { bytes: usize },

    #[error("Access-mode register did not settle: wrote 0x{expected:02X}, read 0x{observed:02X} after {polls} polls")]
    RegisterTimeout {
        expected: u8,
        observed: u8,
        polls: u32,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

impl From<toml::de::Error> for DiagError {
    fn from(e: toml::de::Error) -> Self {
        DiagError::Config(e.to_string())
    }
}
