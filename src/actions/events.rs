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

//! Application event distribution and orchestration.
//!
//! This module defines the central event-handling logic for the application,
//! bridging the gap between user input (keyboard), the playback reconciler,
//! and the UI rendering pipeline.
//!
//! # Architecture
//!
//! The system follows a reactive event-loop pattern:
//!
//! 1. **Capture**: Events are received via the [`AppEvent`] enum through a
//!    channel fed by the key reader, the tick thread and the reconciler.
//! 2. **Process**: The [`process_events`] function updates the [`App`] state
//!    and turns key presses into [`AppCommand`]s.
//! 3. **Render**: After each event is processed, the UI is re-drawn using the
//!    `ratatui` terminal.

use std::{io::Stdout, time::Instant};

use anyhow::{Result, bail};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, prelude::CrosstermBackend};

use crate::{
    App,
    actions::commands::{AppCommand, VOLUME_DELTA, handle_command},
    model::TrackId,
    playback::PlaybackStatus,
    render::draw,
};

#[derive(Debug)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    Playback(PlaybackStatus),
    TrackFinished(TrackId),

    Tick,

    ExitApplication,

    Error(String),
    FatalError(String),
}

/// Runs the main application loop, handling events and rendering the UI in the
/// terminal.
///
/// This function loops until a 'quit' event is received or the event channel
/// is closed.
///
/// # Errors
///
/// Returns an error if drawing fails or a background worker reports a fatal
/// error.
pub(crate) fn process_events(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while let Ok(event) = app.event_rx.recv() {
        match event {
            AppEvent::ExitApplication => break,

            AppEvent::Key(key) => {
                if let Some(command) = key_command(key) {
                    handle_command(app, command)?;
                }
            }

            AppEvent::Playback(status) => app.playback = Some(status),
            AppEvent::TrackFinished(track_id) => {
                let outcome = match app.sessions.active_mut() {
                    Some(session) => app.controller.track_finished(session, track_id),
                    None => {
                        tracing::info!(track_id, "no active source to advance in, stopping");
                        app.controller.stop();
                        Ok(())
                    }
                };
                if let Err(e) = outcome {
                    app.set_status(e.to_string());
                }
            }

            AppEvent::Error(message) => {
                tracing::warn!(%message, "background error");
                app.set_status(message);
            }
            AppEvent::FatalError(message) => {
                tracing::error!(%message, "fatal error");
                bail!(message);
            }

            AppEvent::Tick => app.expire_status(Instant::now()),
        }

        // Render after every event processed
        terminal.draw(|f| draw(f, app))?;
    }

    Ok(())
}

/// Maps a key press to the command it triggers, if any.
///
/// Digits seek to that many tenths of the track, so `0` restarts it and `5`
/// jumps to the middle.
pub(crate) fn key_command(key: KeyEvent) -> Option<AppCommand> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let command = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => AppCommand::Quit,
        (KeyCode::Char('q'), _) => AppCommand::Quit,

        (KeyCode::Char(' '), _) => AppCommand::TogglePlay,
        (KeyCode::Right, _) => AppCommand::Next,
        (KeyCode::Left, _) => AppCommand::Previous,
        (KeyCode::Up, _) => AppCommand::AdjustVolume(VOLUME_DELTA),
        (KeyCode::Down, _) => AppCommand::AdjustVolume(-VOLUME_DELTA),
        (KeyCode::Char(','), _) => AppCommand::SeekBackward,
        (KeyCode::Char('.'), _) => AppCommand::SeekForward,
        (KeyCode::Char(c), _) if c.is_ascii_digit() => {
            let tenths = c.to_digit(10)?;
            AppCommand::SeekFraction(f64::from(tenths) / 10.0)
        }

        (KeyCode::Char('s'), _) => AppCommand::Shuffle,
        (KeyCode::Char('a'), _) => AppCommand::SortAlphabetically,
        (KeyCode::Char('t'), _) => AppCommand::ToggleSource,
        (KeyCode::Char('m'), _) => AppCommand::LoadMore,
        (KeyCode::Char('r'), _) => AppCommand::Refresh,

        _ => return None,
    };

    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn transport_keys() {
        assert_eq!(key_command(press(KeyCode::Char(' '))), Some(AppCommand::TogglePlay));
        assert_eq!(key_command(press(KeyCode::Right)), Some(AppCommand::Next));
        assert_eq!(key_command(press(KeyCode::Left)), Some(AppCommand::Previous));
        assert_eq!(key_command(press(KeyCode::Char('.'))), Some(AppCommand::SeekForward));
        assert_eq!(key_command(press(KeyCode::Char(','))), Some(AppCommand::SeekBackward));
        assert_eq!(key_command(press(KeyCode::Char('r'))), Some(AppCommand::Refresh));
    }

    #[test]
    fn volume_keys_step_by_five() {
        assert_eq!(key_command(press(KeyCode::Up)), Some(AppCommand::AdjustVolume(5)));
        assert_eq!(key_command(press(KeyCode::Down)), Some(AppCommand::AdjustVolume(-5)));
    }

    #[test]
    fn digits_seek_by_tenths() {
        assert_eq!(key_command(press(KeyCode::Char('0'))), Some(AppCommand::SeekFraction(0.0)));
        assert_eq!(key_command(press(KeyCode::Char('5'))), Some(AppCommand::SeekFraction(0.5)));
        assert_eq!(key_command(press(KeyCode::Char('9'))), Some(AppCommand::SeekFraction(0.9)));
    }

    #[test]
    fn playlist_keys() {
        assert_eq!(key_command(press(KeyCode::Char('s'))), Some(AppCommand::Shuffle));
        assert_eq!(key_command(press(KeyCode::Char('a'))), Some(AppCommand::SortAlphabetically));
        assert_eq!(key_command(press(KeyCode::Char('t'))), Some(AppCommand::ToggleSource));
        assert_eq!(key_command(press(KeyCode::Char('m'))), Some(AppCommand::LoadMore));
    }

    #[test]
    fn quit_and_unbound_keys() {
        assert_eq!(key_command(press(KeyCode::Char('q'))), Some(AppCommand::Quit));
        assert_eq!(
            key_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppCommand::Quit)
        );
        assert_eq!(key_command(press(KeyCode::Char('x'))), None);
        assert_eq!(key_command(press(KeyCode::Enter)), None);
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;

        assert_eq!(key_command(key), None);
    }
}
