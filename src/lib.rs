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

//! DRAM module fault isolation library
//!
//! This library locates faults on a memory board built from x4 DRAM modules
//! arranged in four controller banks: data lines stuck or floating, address
//! lines shorted or open, and failing memory cells, each pinned to a socket.
//!
//! # Example
//!
//! ```
//! use zipdiag::core::config::DiagConfig;
//! use zipdiag::core::dataline::DataLineFaultDetector;
//! use zipdiag::core::sim::{FaultPlan, SimBoard};
//! use zipdiag::core::status::BitStatus;
//!
//! let mut board = SimBoard::default().with_faults(FaultPlan::new().stuck1(2, 9));
//! let mut config = DiagConfig::default();
//! config.data.passes = 16;
//!
//! let report = DataLineFaultDetector::new(&config, board.addrbits()).run(&mut board);
//! assert_eq!(report.status(2, 2).unwrap()[1], BitStatus::Stuck1);
//! ```

pub mod core;
