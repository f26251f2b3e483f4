// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scplay")]
#[command(about = "Stream music from your SoundCloud feed or likes")]
pub(crate) struct Cli {
    /// Reset the configuration file to its defaults before running
    #[arg(long, short = 'r', global = true)]
    pub(crate) reset_config: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Start the player
    Start {
        /// Minimum track length to filter the feed on, in minutes
        #[arg(long, short = 'm')]
        min_track_length: Option<u64>,
    },

    /// Download every liked track not already in the local library
    Download {
        /// Directory to download to, instead of the configured library
        #[arg(long)]
        dest: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_takes_an_optional_minimum_length() {
        let cli = Cli::try_parse_from(["scplay", "start", "-m", "10"]).unwrap();
        assert!(matches!(cli.command, Command::Start { min_track_length: Some(10) }));

        let cli = Cli::try_parse_from(["scplay", "start"]).unwrap();
        assert!(matches!(cli.command, Command::Start { min_track_length: None }));
    }

    #[test]
    fn reset_config_is_accepted_anywhere() {
        assert!(Cli::try_parse_from(["scplay", "-r", "start"]).unwrap().reset_config);
        assert!(Cli::try_parse_from(["scplay", "download", "--reset-config"]).unwrap().reset_config);
    }

    #[test]
    fn a_subcommand_is_required() {
        assert!(Cli::try_parse_from(["scplay"]).is_err());
    }

    #[test]
    fn download_destination_override() {
        let cli = Cli::try_parse_from(["scplay", "download", "--dest", "/tmp/music"]).unwrap();
        assert!(matches!(cli.command, Command::Download { dest: Some(ref d) } if d == &PathBuf::from("/tmp/music")));
    }
}
