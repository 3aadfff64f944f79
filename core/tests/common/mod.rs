// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - Device and configuration fixtures
//! - Assertion helpers over the contact cache
//! - Temporary directory management with auto-cleanup

mod assertions;
mod fixtures;
mod temp_dir;

#[allow(unused_imports)]
pub use assertions::{assert_cached_ids, assert_names, drain_messages};
#[allow(unused_imports)]
pub use fixtures::{open_app, open_app_with_config, sample_device, test_config, with_phone};
#[allow(unused_imports)]
pub use temp_dir::setup_temp_dirs;
