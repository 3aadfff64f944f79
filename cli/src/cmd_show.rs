// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use contactsync_core::ContactSync;

#[derive(Debug, Clone)]
pub struct CmdShow {
    pub id: String,
}

impl CmdShow {
    pub const NAME: &str = "show";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Show a cached contact with all its details")
            .arg(arg!(<ID> "The contact id"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let id = matches
            .get_one::<String>("ID")
            .ok_or("Missing contact id")?
            .clone();
        Ok(Self { id })
    }

    pub async fn run(self, app: &ContactSync) -> Result<(), Box<dyn Error>> {
        tracing::debug!(id = %self.id, "showing contact...");
        let contact = app
            .get_contact(&self.id)
            .await?
            .ok_or_else(|| format!("Contact not found: {}", self.id))?;

        println!("{}", serde_json::to_string_pretty(&contact)?);
        Ok(())
    }
}
