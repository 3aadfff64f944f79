// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use colored::Colorize;
use contactsync_core::{ContactSync, StatusMessage};
use jiff::tz::TimeZone;
use tokio::sync::broadcast::error::TryRecvError;

use crate::cmd_status::print_status;

#[derive(Debug, Default, Clone, Copy)]
pub struct CmdSync {
    pub force: bool,
}

impl CmdSync {
    pub const NAME: &str = "sync";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Sync the contact cache with the device")
            .long_about(
                "\
Sync the contact cache with the device. The first sync reads every contact, later syncs only \
read contacts changed since the last successful one.",
            )
            .arg(arg!(-f --force "Re-read every contact and replace the cache"))
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            force: matches.get_flag("force"),
        }
    }

    pub async fn run(self, app: &ContactSync) -> Result<(), Box<dyn Error>> {
        tracing::debug!(force = self.force, "syncing contacts...");
        let session = app.session();
        let mut messages = session.status_messages();

        if !session.check_permission() {
            session.close().await;
            return Err("Permission to read contacts is not granted".into());
        }

        session.load_contacts(self.force).await;
        session.close().await;

        let mut failed = false;
        loop {
            match messages.try_recv() {
                Ok(message) => {
                    failed |= is_failure(message);
                    print_message(message);
                }
                Err(TryRecvError::Lagged(n)) => tracing::warn!(n, "missed status messages"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        println!();
        print_status(&app.status().await?, &TimeZone::system());

        if failed {
            return Err("Sync did not complete, see the log for details".into());
        }
        Ok(())
    }
}

fn is_failure(message: StatusMessage) -> bool {
    matches!(
        message,
        StatusMessage::SyncFailed | StatusMessage::ChangesSyncFailed
    )
}

fn print_message(message: StatusMessage) {
    match message {
        StatusMessage::Syncing => println!("{}", message.text().dimmed()),
        _ if is_failure(message) => println!("{}", message.text().red()),
        _ => println!("{}", message.text().green()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sync() {
        let cmd = Command::new("test").subcommand(CmdSync::command());
        let matches = cmd.try_get_matches_from(["test", "sync", "-f"]).unwrap();
        let sub_matches = matches.subcommand_matches("sync").unwrap();
        assert!(CmdSync::from(sub_matches).force);
    }

    #[test]
    fn test_failure_messages() {
        assert!(is_failure(StatusMessage::SyncFailed));
        assert!(is_failure(StatusMessage::ChangesSyncFailed));
        assert!(!is_failure(StatusMessage::Synced));
        assert!(!is_failure(StatusMessage::Syncing));
    }
}
