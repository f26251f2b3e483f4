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

//! User-level application commands.
//!
//! Key presses are first translated into an [`AppCommand`] and then executed
//! here against the application state. Commands run on the UI thread; the
//! only blocking work they may do is growing a playlist, everything else is
//! handed to the playback reconciler as an intent.

use std::time::Duration;

use anyhow::Result;

use crate::{
    App,
    actions::events::AppEvent,
    error::PlayerResult,
    model::playlist::{EXPANSION_BATCH, PlaylistSession},
    playback::PlaybackController,
};

pub(crate) const VOLUME_DELTA: i32 = 5;

pub(crate) const SEEK_DELTA: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum AppCommand {
    TogglePlay,
    Next,
    Previous,
    Shuffle,
    SortAlphabetically,
    ToggleSource,
    LoadMore,
    AdjustVolume(i32),
    SeekBackward,
    SeekForward,
    SeekFraction(f64),
    Refresh,
    Quit,
}

/// Executes a single command.
///
/// Playlist failures (an empty source, a failed page fetch) are not fatal;
/// they end up in the status line and the application keeps running.
///
/// # Errors
///
/// Returns an error only if the application event channel is closed.
pub(crate) fn handle_command(app: &mut App, command: AppCommand) -> Result<()> {
    tracing::debug!(?command, "handling command");

    let outcome = match command {
        AppCommand::Quit => {
            app.event_tx.send(AppEvent::ExitApplication)?;
            Ok(())
        }

        AppCommand::TogglePlay => {
            app.controller.toggle_play();
            Ok(())
        }
        AppCommand::AdjustVolume(delta) => {
            app.controller.adjust_volume(delta);
            Ok(())
        }
        AppCommand::SeekBackward => {
            app.controller.seek_relative(SEEK_DELTA, false);
            Ok(())
        }
        AppCommand::SeekForward => {
            app.controller.seek_relative(SEEK_DELTA, true);
            Ok(())
        }
        AppCommand::SeekFraction(fraction) => {
            app.controller.seek_to_fraction(fraction);
            Ok(())
        }
        AppCommand::Refresh => {
            app.set_status("Refreshing stream");
            app.controller.refresh();
            Ok(())
        }

        AppCommand::Next => with_active_session(app, |controller, session| controller.next(session)),
        AppCommand::Previous => with_active_session(app, |controller, session| controller.previous(session)),
        AppCommand::Shuffle => with_active_session(app, |_, session| {
            session.shuffle_keeping_current();
            Ok(())
        }),
        AppCommand::SortAlphabetically => with_active_session(app, |_, session| {
            session.sort_alphabetically();
            Ok(())
        }),
        AppCommand::LoadMore => with_active_session(app, |_, session| {
            let before = session.len();
            session.load_more(EXPANSION_BATCH)?;
            tracing::info!(source = ?session.kind(), added = session.len() - before, "loaded more tracks");
            Ok(())
        }),

        AppCommand::ToggleSource => toggle_source(app),
    };

    if let Err(e) = outcome {
        app.set_status(e.to_string());
    }

    if let Some(warning) = app.sessions.active_mut().and_then(|s| s.take_warning()) {
        app.set_status(warning.to_string());
    }

    Ok(())
}

/// Switches to the other source, opening it first if this is the first time,
/// and resumes playback at that source's own index.
fn toggle_source(app: &mut App) -> PlayerResult<()> {
    let kind = app.sessions.active_kind().other();

    if app.sessions.get(kind).is_none() {
        let session = app.open_session(kind)?;
        app.sessions.insert(session);
    }

    app.sessions.activate(kind);
    tracing::info!(source = ?kind, "switched source");

    with_active_session(app, |controller, session| {
        let index = session.index().unwrap_or(0);
        controller.change_track(session, index)
    })
}

fn with_active_session<F>(app: &mut App, f: F) -> PlayerResult<()>
where
    F: FnOnce(&PlaybackController, &mut PlaylistSession) -> PlayerResult<()>,
{
    match app.sessions.active_mut() {
        Some(session) => f(&app.controller, session),
        None => Ok(()),
    }
}
