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

//! Preflight tests

use super::*;
use crate::core::platform::preflight::{check_controller, check_residency};

#[test]
fn test_preflight_passes() {
    let mut p = RecordingPlatform::new();
    assert!(preflight(&mut p, false).is_ok());
    assert_eq!(p.memory_accesses, 0);
}

#[test]
fn test_controller_versions() {
    let mut p = RecordingPlatform::new();
    for version in [0x04, 0x07, 0x0D] {
        p.version = version;
        assert_eq!(check_controller(&mut p).unwrap(), version);
    }
    for version in [0x00, 0x03, 0x0E, 0xFF] {
        p.version = version;
        assert!(matches!(
            check_controller(&mut p),
            Err(DiagError::UnsupportedController { .. })
        ));
    }
}

#[test]
fn test_conflicting_tool() {
    let mut p = RecordingPlatform::new();
    p.tools = vec!["« MuForce »".to_string()];
    match preflight(&mut p, false) {
        Err(DiagError::ConflictingTool(name)) => assert_eq!(name, "MuForce"),
        other => panic!("unexpected {:?}", other),
    }
    // force skips the check
    assert!(preflight(&mut p, true).is_ok());
}

#[test]
fn test_residency_reports_all() {
    let mut p = RecordingPlatform::new();
    p.sections = vec![("sp", 0x07C0_1000), ("pc", 0x0001_0000), ("rodata", 0x0020_0000)];
    match check_residency(&p) {
        Err(DiagError::UnsafeResidency(list)) => {
            assert_eq!(list.len(), 2);
            assert!(list[0].starts_with("sp="));
            assert!(list[1].starts_with("rodata="));
        }
        other => panic!("unexpected {:?}", other),
    }
    // force never skips residency
    assert!(preflight(&mut p, true).is_err());
    assert_eq!(p.memory_accesses, 0);
}
