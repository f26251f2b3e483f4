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

//! Unicode symbols for the TUI.
//!
//! Text-style variants (Variation Selector-15, `\u{FE0E}`) force terminals to
//! draw monochrome glyphs that respect the theme colours instead of emoji.

pub(crate) const ICON_PLAY: &str = "\u{25B6}";
pub(crate) const ICON_PAUSE: &str = "\u{23F8}\u{FE0E}";
pub(crate) const ICON_STOP: &str = "\u{23F9}\u{FE0E}";
pub(crate) const ICON_LOADING: &str = "\u{23F3}\u{FE0E}";
pub(crate) const ICON_LOADING_PAUSED: &str = "\u{23F3}\u{FE0E}\u{23F8}\u{FE0E}";
pub(crate) const ICON_FAILED: &str = "\u{26A0}\u{FE0E}";

pub(crate) const ICON_VOLUME: &str = "\u{1F509}\u{FE0E}";

pub(crate) const ICON_CURRENT: &str = "\u{25B8}";
pub(crate) const LIKED: &str = "\u{2764}\u{FE0E}";
