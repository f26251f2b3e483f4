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

//! Render the music player interface.
//!
//! This module renders the now playing line, the elapsed and total times,
//! the volume and the progress bar, all from the last [`PlaybackStatus`]
//! published by the reconciler.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Padding, Paragraph},
};

use crate::{
    App,
    playback::{PlaybackPhase, PlaybackStatus},
    render::icons::{ICON_FAILED, ICON_LOADING, ICON_LOADING_PAUSED, ICON_PAUSE, ICON_PLAY, ICON_STOP, ICON_VOLUME, LIKED},
    util,
};

/// Renders the main player widget including track info and progress.
pub(crate) fn draw_player(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::TOP | Borders::BOTTOM)
        .border_style(Style::default().fg(app.theme.border_colour))
        .padding(Padding::horizontal(1));

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner_area);

    let info_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(24)])
        .split(chunks[0]);

    let Some(status) = &app.playback else {
        f.render_widget(Paragraph::new(format!(" {} Nothing playing", ICON_STOP)), info_chunks[0]);
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut track_line = vec![Span::styled(format!(" {} ", state_icon(status)), bold).fg(Color::White)];
    match &status.track {
        Some(track) => {
            track_line.push(Span::styled(track.title.as_str(), bold).fg(app.theme.accent_colour));
            track_line.push(Span::raw(" by "));
            track_line.push(Span::styled(track.artist.as_str(), bold).fg(app.theme.accent_colour));
            if app.liked_ids.contains(&track.id) {
                track_line.push(Span::raw(" "));
                track_line.push(Span::raw(LIKED).fg(app.theme.liked_fg));
            }
        }
        None => track_line.push(Span::raw("Nothing playing")),
    }
    f.render_widget(Paragraph::new(Line::from(track_line)), info_chunks[0]);

    let position = status.position_at(Instant::now());
    let length = status.length_ms.unwrap_or(0);

    let time_line = Line::from(vec![
        Span::styled(util::format::format_time(position), bold).fg(app.theme.accent_colour),
        Span::styled(" / ", bold).fg(Color::White),
        Span::styled(util::format::format_time(length), bold).fg(app.theme.accent_colour),
    ]);
    f.render_widget(Paragraph::new(time_line).alignment(Alignment::Right), info_chunks[1]);

    let volume = status
        .volume
        .map_or_else(|| "--".to_string(), |v| format!("{}%", v));
    let volume_line = Paragraph::new(format!("{} {}", ICON_VOLUME, volume))
        .alignment(Alignment::Right)
        .fg(Color::White);
    f.render_widget(volume_line, chunks[1]);

    let ratio = if length > 0 {
        (position as f64 / length as f64).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let position_gauge = Gauge::default()
        .gauge_style(
            Style::default()
                .fg(app.theme.accent_colour)
                .bg(app.theme.gauge_track_colour),
        )
        .ratio(ratio)
        .label("")
        .use_unicode(true);

    f.render_widget(position_gauge, chunks[2]);
}

/// The icon for the playback phase. A stream that is still loading also shows
/// whether it will start paused.
fn state_icon(status: &PlaybackStatus) -> &'static str {
    match status.phase {
        PlaybackPhase::Idle => ICON_STOP,
        PlaybackPhase::Loading if !status.desired_playing => ICON_LOADING_PAUSED,
        PlaybackPhase::Loading => ICON_LOADING,
        PlaybackPhase::Playing => ICON_PLAY,
        PlaybackPhase::Paused => ICON_PAUSE,
        PlaybackPhase::Failed => ICON_FAILED,
    }
}
