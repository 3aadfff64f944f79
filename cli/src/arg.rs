// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use clap::{Arg, ArgMatches, arg, value_parser};

/// The output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy)]
pub struct CommonArgs;

impl CommonArgs {
    pub fn output_format() -> Arg {
        arg!(--"output-format" <FORMAT> "Output format")
            .value_parser(value_parser!(OutputFormat))
            .default_value("table")
    }

    pub fn get_output_format(matches: &ArgMatches) -> OutputFormat {
        matches
            .get_one("output-format")
            .copied()
            .unwrap_or(OutputFormat::Table)
    }

    pub fn verbose() -> Arg {
        arg!(-v --verbose "Show more detailed information")
    }

    pub fn get_verbose(matches: &ArgMatches) -> bool {
        matches.get_flag("verbose")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn parse(args: &[&str]) -> ArgMatches {
        Command::new("test")
            .arg(CommonArgs::output_format())
            .arg(CommonArgs::verbose())
            .try_get_matches_from(args)
            .unwrap()
    }

    #[test]
    fn test_output_format_defaults_to_table() {
        let matches = parse(&["test"]);
        assert_eq!(CommonArgs::get_output_format(&matches), OutputFormat::Table);
        assert!(!CommonArgs::get_verbose(&matches));
    }

    #[test]
    fn test_output_format_json() {
        let matches = parse(&["test", "--output-format", "json", "-v"]);
        assert_eq!(CommonArgs::get_output_format(&matches), OutputFormat::Json);
        assert!(CommonArgs::get_verbose(&matches));
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let result = Command::new("test")
            .arg(CommonArgs::output_format())
            .try_get_matches_from(["test", "--output-format", "yaml"]);
        assert!(result.is_err());
    }
}
