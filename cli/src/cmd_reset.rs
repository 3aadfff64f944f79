// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use contactsync_core::ContactSync;

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdReset;

impl CmdReset {
    pub const NAME: &str = "reset";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Clear the contact cache and forget the last sync, the next sync will be a full one")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        CmdReset
    }

    pub async fn run(self, app: &ContactSync) -> Result<(), Box<dyn Error>> {
        tracing::debug!("resetting cache...");
        app.reset().await?;
        println!("{}", "Contact cache cleared".green());
        Ok(())
    }
}
