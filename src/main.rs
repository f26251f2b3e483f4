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

//! # SoundCloud Player TUI.
//!
//! A terminal player for a SoundCloud feed and likes.
//!
//! This application coordinates a TUI frontend built with `ratatui` and a
//! background playback reconciler driving `libmpv`.
//!
//! It uses an event-driven architecture where:
//!
//! * The **Main Thread** manages the terminal lifecycle, UI rendering and the
//!   playlists, growing them from the SoundCloud API on demand.
//! * The **Playback Reconciler** thread owns the audio engine and keeps it in
//!   line with what the user asked for.
//! * **Event Loops** capture user input and system ticks to drive the UI
//!   state.
//!
//! ## Architecture
//!
//! The application follows a strict setup-run-teardown pattern to ensure the
//! terminal state is preserved even in the event of a crash. Communication
//! between the UI and background threads is handled via `std::sync::mpsc`
//! channels.

mod actions;
mod api;
mod cli;
mod config;
mod download;
mod error;
mod logging;
mod model;
mod playback;
mod player;
mod render;
mod theme;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    collections::HashSet,
    io::{self},
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    actions::events::{AppEvent, process_events},
    api::SoundCloudClient,
    cli::{Cli, Command},
    config::AppConfig,
    error::PlayerResult,
    model::{
        SourceKind, TrackId,
        playlist::{EXPANSION_BATCH, PlaylistSession, Sessions},
    },
    playback::{PlaybackController, PlaybackStatus},
    player::mpv::MpvPlayer,
    theme::Theme,
    util::term::BackgroundGuard,
};

/// Minimum "frame rate" for rendering, so the progress bar moves between
/// playback status updates.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// How long a status line message stays up.
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state.
struct App {
    pub theme: Theme,

    pub event_tx: Sender<AppEvent>,
    pub event_rx: Receiver<AppEvent>,

    pub client: Arc<SoundCloudClient>,
    pub min_track_length_secs: u64,

    pub sessions: Sessions,
    pub controller: PlaybackController,

    pub playback: Option<PlaybackStatus>,
    pub liked_ids: HashSet<TrackId>,

    pub status_message: Option<String>,
    pub status_set_at: Option<Instant>,
}

impl App {
    /// Create a new instance of application state.
    ///
    /// Loads the first page of the feed and the liked track ids, then starts
    /// the playback reconciler. Nothing plays until [`run`] picks a track.
    pub fn new(config: &AppConfig, client: Arc<SoundCloudClient>, min_track_length_secs: u64) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel();

        let feed = open_session(&client, SourceKind::Feed, min_track_length_secs)
            .context("Failed to load the feed")?;

        let liked_ids = client.liked_track_ids().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load liked track ids");
            HashSet::new()
        });

        let volume = config.volume;
        let controller = PlaybackController::start(move || MpvPlayer::new(volume), client.clone(), event_tx.clone());

        Ok(Self {
            theme: Theme::default(),
            event_tx,
            event_rx,
            client,
            min_track_length_secs,
            sessions: Sessions::new(feed),
            controller,
            playback: None,
            liked_ids,
            status_message: None,
            status_set_at: None,
        })
    }

    /// Opens a source and buffers its first batch of tracks.
    pub fn open_session(&self, kind: SourceKind) -> PlayerResult<PlaylistSession> {
        open_session(&self.client, kind, self.min_track_length_secs)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn expire_status(&mut self, now: Instant) {
        if self
            .status_set_at
            .is_some_and(|at| now.duration_since(at) >= STATUS_TIMEOUT)
        {
            self.status_message = None;
            self.status_set_at = None;
        }
    }
}

fn open_session(client: &Arc<SoundCloudClient>, kind: SourceKind, min_track_length_secs: u64) -> PlayerResult<PlaylistSession> {
    let source = match kind {
        SourceKind::Likes => client.likes_source()?,
        SourceKind::Feed => client.feed_source(min_track_length_secs),
    };

    let mut session = PlaylistSession::from_source(source);
    if let Err(e) = session.ensure_loaded(EXPANSION_BATCH) {
        if session.is_empty() {
            return Err(e);
        }
        tracing::warn!(source = ?kind, error = %e, "first page only partly loaded");
    }

    tracing::info!(source = ?kind, tracks = session.len(), "opened source");
    Ok(session)
}

/// The entry point of the application.
///
/// Parses the command line, sets up logging and configuration, then either
/// runs the player or downloads liked tracks.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_dir = config::config_dir()?;
    let _log_guard = logging::init_logging(&config_dir)?;

    let mut config = if cli.reset_config {
        config::reset_config()?
    } else {
        config::load_config()
    };

    let token = config::oauth_token(&mut config)?;
    let client = Arc::new(SoundCloudClient::connect(&token).context("Failed to connect to SoundCloud")?);

    match cli.command {
        Command::Start { min_track_length } => {
            let min_track_length_secs = config.min_track_length_secs(min_track_length);
            start_player(&config, client, min_track_length_secs)
        }
        Command::Download { dest } => download_likes(&mut config, client, dest),
    }
}

fn start_player(config: &AppConfig, client: Arc<SoundCloudClient>, min_track_length_secs: u64) -> Result<()> {
    tracing::info!(min_track_length_secs, "starting player");

    let mut app = App::new(config, client, min_track_length_secs).context("Failed to initalise application")?;

    let mut terminal = setup_terminal()?;
    let background = BackgroundGuard::set(app.theme.background_colour);
    let res = run(&mut terminal, &mut app);
    drop(background);
    restore_terminal(&mut terminal);

    app.controller.shutdown();

    res.context("Application error occurred")
}

fn download_likes(config: &mut AppConfig, client: Arc<SoundCloudClient>, dest: Option<PathBuf>) -> Result<()> {
    let library = config::local_library(config, dest)?;
    let likes = client.likes_source().context("Failed to open likes")?;

    let summary = download::download_likes(likes, &library, client, download::ffmpeg_fetch)?;

    println!(
        "All liked tracks downloaded: {} new, {} already present, {} failed",
        summary.downloaded, summary.skipped, summary.failed
    );
    Ok(())
}

/// Prepares the terminal for the TUI application.
///
/// # Errors
///
/// Returns an error if raw mode cannot be enabled or if the alternate screen
/// cannot be entered.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;

    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This is best-effort and does not return a result, as it is typically
/// called during cleanup.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();
}

/// Starts the input and tick threads, begins playback of the first feed
/// track and enters the main event loop.
///
/// # Errors
///
/// Returns an error if the event processing loop encounters an unrecoverable
/// application error.
fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Spawn a thread to translate raw key events to application events.
    let tx_keys = app.event_tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event::Event::Key(key)) = event::read() {
                if tx_keys.send(AppEvent::Key(key)).is_err() {
                    break;
                }
            }
        }
    });

    let tx_tick = app.event_tx.clone();
    thread::spawn(move || {
        while tx_tick.send(AppEvent::Tick).is_ok() {
            thread::sleep(TICK_INTERVAL);
        }
    });

    let started = match app.sessions.active_mut() {
        Some(session) => app.controller.change_track(session, 0),
        None => Ok(()),
    };
    if let Err(e) = started {
        app.set_status(e.to_string());
    }

    terminal.draw(|f| render::draw(f, app))?;

    // Application event loop, process events until the user quits
    process_events(terminal, app)
}
