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

//! User interface rendering logic.
//!
//! This module handles the translation of the [`App`] state into visual
//! widgets using the `ratatui` framework.
//!
//! # Rendering Pipeline
//!
//! The primary entry point is the [`draw`] function, which is called after
//! every application event, including the periodic tick, so the progress bar
//! advances smoothly between playback status updates.

mod icons;
mod player;
mod playlist;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Style, Stylize},
    widgets::{Block, Paragraph},
};

use crate::{
    App,
    render::{player::draw_player, playlist::draw_playlist},
};

const KEY_HELP: &str =
    "space play/pause  \u{2190}/\u{2192} prev/next  ,/. seek  0-9 jump  s shuffle  a sort  t source  m more  r refresh  q quit";

/// Renders the user interface to the terminal frame.
///
/// The screen is split into the playlist window, the player and a one-line
/// status bar that shows the last message or, without one, the key bindings.
pub(crate) fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    f.render_widget(
        Block::default().style(Style::default().bg(app.theme.background_colour)),
        area,
    );

    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(area);

    draw_playlist(f, outer[0], app.sessions.active(), &app.liked_ids, &app.theme);

    draw_player(f, outer[1], app);

    let status = match &app.status_message {
        Some(message) => Paragraph::new(format!(" {}", message)).fg(app.theme.error_fg),
        None => Paragraph::new(format!(" {}", KEY_HELP)).fg(app.theme.status_fg),
    };
    f.render_widget(status, outer[2]);
}
