// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use contactsync_core::ContactSync;

use crate::arg::{CommonArgs, OutputFormat};
use crate::contact_formatter::ContactFormatter;

#[derive(Debug, Clone)]
pub struct CmdList {
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl Default for CmdList {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Table,
            verbose: false,
        }
    }
}

impl CmdList {
    pub const NAME: &str = "list";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("ls")
            .about("List cached contacts")
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            output_format: CommonArgs::get_output_format(matches),
            verbose: CommonArgs::get_verbose(matches),
        }
    }

    pub async fn run(self, app: &ContactSync) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "listing contacts...");
        let contacts = app.list_contacts().await?;
        if contacts.is_empty() && self.output_format == OutputFormat::Table {
            println!("No contacts cached, run `sync` first");
            return Ok(());
        }

        let formatter = ContactFormatter::new(self.verbose).with_output_format(self.output_format);
        print!("{}", formatter.format(&contacts));
        Ok(())
    }
}
