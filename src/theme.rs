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

//! Visual styling and color configuration for the TUI.
//!
//! This module defines the application's color palette and the conversion of
//! palette colours into the hexadecimal form terminal emulators accept.

use ratatui::style::Color;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Theme {
    pub(crate) background_colour: Color,
    pub(crate) accent_colour: Color,
    pub(crate) border_colour: Color,
    pub(crate) gauge_track_colour: Color,

    pub(crate) track_fg: Color,
    pub(crate) current_track_fg: Color,
    pub(crate) liked_fg: Color,
    pub(crate) source_fg: Color,
    pub(crate) status_fg: Color,
    pub(crate) error_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    pub(crate) const fn default_theme() -> Self {
        Self {
            background_colour: Color::Rgb(25, 20, 20),
            accent_colour: Color::Rgb(255, 85, 0),
            border_colour: Color::Rgb(102, 102, 102),
            gauge_track_colour: Color::Rgb(50, 40, 40),

            track_fg: Color::Rgb(162, 161, 166),
            current_track_fg: Color::Rgb(255, 255, 255),
            liked_fg: Color::Rgb(100, 149, 237),
            source_fg: Color::Rgb(255, 165, 0),
            status_fg: Color::Rgb(162, 161, 166),
            error_fg: Color::Rgb(230, 80, 80),
        }
    }

    /// Converts an RGB colour into a CSS-style hexadecimal string, `None` for
    /// named and indexed colours which have no fixed value.
    pub(crate) fn to_hex(colour: Color) -> Option<String> {
        match colour {
            Color::Rgb(r, g, b) => Some(format!("#{:02x}{:02x}{:02x}", r, g, b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_only_for_rgb() {
        assert_eq!(Theme::to_hex(Color::Rgb(255, 85, 0)).as_deref(), Some("#ff5500"));
        assert_eq!(Theme::to_hex(Color::Red), None);
    }
}
