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

//! Render the playlist window.
//!
//! Shows the tracks either side of the current one in the active source, with
//! the source name and buffered track count as the header.

use std::collections::HashSet;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
};

use crate::{
    model::{TrackId, playlist::PlaylistSession},
    render::icons::{ICON_CURRENT, LIKED},
    theme::Theme,
};

/// Tracks shown either side of the current one.
const WINDOW_RADIUS: usize = 2;

pub(crate) fn draw_playlist(
    f: &mut Frame,
    area: Rect,
    session: Option<&PlaylistSession>,
    liked_ids: &HashSet<TrackId>,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(theme.border_colour))
        .padding(Padding::horizontal(1));

    let Some(session) = session else {
        f.render_widget(Paragraph::new("Loading...").block(header_block), chunks[0]);
        return;
    };

    let mut header_text = format!("{}: {} tracks", session.kind().title(), session.len());
    if !session.is_exhausted() {
        header_text.push('+');
    }
    let header = Paragraph::new(header_text).fg(theme.source_fg).block(header_block);
    f.render_widget(header, chunks[0]);

    let current = session.index();

    let items: Vec<ListItem> = session
        .window(WINDOW_RADIUS)
        .into_iter()
        .map(|(index, track)| {
            let is_current = Some(index) == current;

            let (marker, style) = if is_current {
                (
                    ICON_CURRENT,
                    Style::default()
                        .fg(theme.current_track_fg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" ", Style::default().fg(theme.track_fg))
            };

            let mut spans = vec![
                Span::raw(format!(" {} ", marker)).fg(theme.accent_colour),
                Span::styled(format!("{:>4}. ", index + 1), style),
                Span::styled(track.to_string(), style),
            ];
            if liked_ids.contains(&track.id) {
                spans.push(Span::raw(format!(" {} Liked", LIKED)).fg(theme.liked_fg));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    f.render_widget(List::new(items), chunks[1]);
}
