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

//! Diagnostic components
//!
//! This module contains the fault isolation engine and its supporting pieces:
//! - Address translation between wire masks and CPU addresses
//! - Socket tables and status classification
//! - Data line, address line and memory cell testers
//! - Capability probe and address strobe generator
//! - Platform interface with an emulated board
//! - Run orchestration and reporting

pub mod addrline;
pub mod cell;
pub mod config;
pub mod dataline;
pub mod diagnostic;
pub mod error;
pub mod platform;
pub mod probe;
pub mod report;
pub mod sim;
pub mod socket;
pub mod status;
pub mod strobe;
pub mod translate;

// Re-export commonly used types
pub use config::DiagConfig;
pub use diagnostic::{Diagnostic, RunReport, TestSelection};
pub use error::{DiagError, Result};
pub use platform::Platform;
pub use sim::{FaultPlan, SimBoard};
