// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use colored::Colorize;
use contactsync_core::{ContactSync, SyncStatus};
use jiff::{Timestamp, tz::TimeZone};

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdStatus;

impl CmdStatus {
    pub const NAME: &str = "status";

    pub fn command() -> Command {
        Command::new(Self::NAME).about("Show the number of cached contacts and the last sync time")
    }

    pub fn from(_matches: &ArgMatches) -> Self {
        CmdStatus
    }

    pub async fn run(self, app: &ContactSync) -> Result<(), Box<dyn Error>> {
        tracing::debug!("reading sync status...");
        let status = app.status().await?;
        print_status(&status, &TimeZone::system());
        Ok(())
    }
}

pub fn print_status(status: &SyncStatus, tz: &TimeZone) {
    println!("{} {}", "Cached contacts:".bold(), status.cached);
    println!("{} {}", "Last sync:".bold(), format_last_sync(status.last_sync, tz));
}

pub fn format_last_sync(last_sync: Option<Timestamp>, tz: &TimeZone) -> String {
    match last_sync {
        Some(ts) => ts
            .to_zoned(tz.clone())
            .strftime("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        let cmd = Command::new("test").subcommand(CmdStatus::command());
        let matches = cmd.try_get_matches_from(["test", "status"]).unwrap();
        let _ = CmdStatus::from(&matches);
    }

    #[test]
    fn test_format_last_sync() {
        let ts = Timestamp::from_millisecond(1_700_000_000_000).unwrap();
        assert_eq!(
            format_last_sync(Some(ts), &TimeZone::UTC),
            "2023-11-14 22:13:20"
        );
        assert_eq!(format_last_sync(None, &TimeZone::UTC), "never");
    }
}
