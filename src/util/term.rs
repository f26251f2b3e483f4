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

//! Terminal background colour control.
//!
//! Uses the OSC 11 and OSC 111 escape sequences, which most modern terminal
//! emulators (XTerm, Alacritty, Kitty, iTerm2) understand. Terminals that do
//! not simply ignore them.

use std::io::{self, Write};

use ratatui::style::Color;

use crate::theme::Theme;

/// Paints the terminal background while alive and restores the user's own
/// background when dropped, including when unwinding from a panic.
pub(crate) struct BackgroundGuard {
    active: bool,
}

impl BackgroundGuard {
    pub(crate) fn set(colour: Color) -> Self {
        let active = match Theme::to_hex(colour) {
            Some(hex) => write_sequence(&format!("\x1b]11;{}\x07", hex)).is_ok(),
            None => false,
        };
        Self { active }
    }
}

impl Drop for BackgroundGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = write_sequence("\x1b]111\x07");
        }
    }
}

fn write_sequence(sequence: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(sequence.as_bytes())?;
    stdout.flush()
}
