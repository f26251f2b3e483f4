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

//! Application configuration.
//!
//! This module manages the application configuration file, including the
//! first-run prompt for the SoundCloud OAuth token.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_NAME: &str = "scplay";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) version: u32,
    pub(crate) oauth_token: Option<String>,
    pub(crate) min_track_length_minutes: u64,
    pub(crate) volume: u32,
    pub(crate) local_library: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            oauth_token: None,
            min_track_length_minutes: 30,
            volume: 70,
            local_library: None,
        }
    }
}

impl AppConfig {
    /// Shortest feed track to keep, in seconds. `override_minutes` comes from
    /// the command line and wins over the stored value.
    pub(crate) fn min_track_length_secs(&self, override_minutes: Option<u64>) -> u64 {
        override_minutes
            .unwrap_or(self.min_track_length_minutes)
            .saturating_mul(60)
    }
}

pub(crate) fn load_config() -> AppConfig {
    confy::load(CONFIG_NAME, None).unwrap_or_default()
}

pub(crate) fn save_config(cfg: &AppConfig) -> Result<(), confy::ConfyError> {
    confy::store(CONFIG_NAME, None, cfg)
}

/// Replaces the stored configuration with the defaults.
pub(crate) fn reset_config() -> Result<AppConfig> {
    let cfg = AppConfig::default();
    save_config(&cfg).context("Failed to reset configuration")?;
    tracing::info!("configuration reset");
    Ok(cfg)
}

/// Directory holding the configuration file, also used for log files.
pub(crate) fn config_dir() -> Result<PathBuf> {
    let path = confy::get_configuration_file_path(CONFIG_NAME, None)
        .context("Failed to locate configuration directory")?;
    path.parent()
        .map(|p| p.to_path_buf())
        .context("Configuration file has no parent directory")
}

/// Returns the stored OAuth token, asking for it on stdin and saving it if
/// there is none yet.
pub(crate) fn oauth_token(cfg: &mut AppConfig) -> Result<String> {
    if let Some(token) = cfg.oauth_token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    let stdin = io::stdin();
    let token = prompt(
        &mut stdin.lock(),
        &mut io::stdout(),
        "Please enter your SoundCloud oauth token. You can find it in your browser's session storage: ",
    )?;

    cfg.oauth_token = Some(token.clone());
    save_config(cfg).context("Failed to save configuration")?;
    Ok(token)
}

/// Directory the `download` command writes to: the override if given,
/// otherwise the configured library, prompting for one on first use.
pub(crate) fn local_library(cfg: &mut AppConfig, dest: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dest) = dest {
        return Ok(dest);
    }
    if let Some(library) = &cfg.local_library {
        return Ok(library.clone());
    }

    let stdin = io::stdin();
    let library = PathBuf::from(prompt(
        &mut stdin.lock(),
        &mut io::stdout(),
        "Please enter the directory to download your liked tracks to: ",
    )?);

    cfg.local_library = Some(library.clone());
    save_config(cfg).context("Failed to save configuration")?;
    Ok(library)
}

fn prompt(input: &mut impl BufRead, output: &mut impl Write, message: &str) -> Result<String> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read from stdin")?;

    let answer = line.trim();
    if answer.is_empty() {
        bail!("No value entered");
    }
    Ok(answer.to_string())
}
