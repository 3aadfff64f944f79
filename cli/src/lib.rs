// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line front end for contactsync.

mod arg;
mod cli;
mod cmd_list;
mod cmd_reset;
mod cmd_show;
mod cmd_status;
mod cmd_sync;
mod config;
mod contact_formatter;
mod table;

pub use crate::cli::{Cli, Commands, run};
