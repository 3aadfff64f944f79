// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end workflow tests for the contactsync-core crate.
//!
//! These tests drive the public API over an in-memory device store and
//! validate multi-step sync scenarios, persistence across restarts, and
//! session behavior.

mod full_sync;
mod incremental_sync;
mod persistence;
mod session;
