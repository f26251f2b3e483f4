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

//! Playback control and state management.
//!
//! This module provides the high-level [`PlaybackController`] interface used
//! by the UI to control playback. Like a command proxy, it does not touch the
//! audio engine itself: every call becomes an [`Intent`] sent to the
//! background [`reconciler`], which is the only code that talks to the
//! engine. State flows back to the UI as [`PlaybackStatus`] snapshots.

pub(crate) mod reconciler;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::Result;

use crate::{
    actions::events::AppEvent,
    api::StreamResolver,
    error::PlayerResult,
    model::{Track, TrackId, playlist::PlaylistSession},
    playback::reconciler::Reconciler,
    player::ExternalPlayerHandle,
};

/// Where the controller is in its load/play cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlaybackPhase {
    Idle,
    Loading,
    Playing,
    Paused,
    Failed,
}

/// A change of desired state, applied by the reconciler on its next pass.
#[derive(Debug)]
pub(crate) enum Intent {
    ChangeTrack(Track),
    SetPlaying(bool),
    TogglePlaying,
    SeekFraction(f64),
    SeekRelative(i64),
    Refresh,
    AdjustVolume(i32),
    /// Drop the current track and go idle.
    Stop,
}

/// Read-only snapshot published by the reconciler after every pass.
#[derive(Clone, Debug)]
pub(crate) struct PlaybackStatus {
    pub(crate) phase: PlaybackPhase,
    pub(crate) track: Option<Track>,
    pub(crate) desired_playing: bool,
    pub(crate) position_ms: u64,
    pub(crate) length_ms: Option<u64>,
    pub(crate) volume: Option<u32>,
    pub(crate) observed_at: Instant,
}

impl PlaybackStatus {
    /// Estimated position at `now`, extrapolated from the last reading while
    /// playing so the UI can refresh faster than the engine is polled.
    pub(crate) fn position_at(&self, now: Instant) -> u64 {
        let position = if self.phase == PlaybackPhase::Playing {
            let elapsed = now.saturating_duration_since(self.observed_at);
            // Never extrapolate across more than one missed reading.
            let elapsed = elapsed.min(reconciler::POLL_INTERVAL * 2);
            self.position_ms + elapsed.as_millis() as u64
        } else {
            self.position_ms
        };

        match self.length_ms {
            Some(length) => position.min(length),
            None => position,
        }
    }
}

pub(crate) struct PlaybackController {
    intent_tx: Sender<Intent>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackController {
    /// Spawns the reconciler thread and returns a controller for it.
    ///
    /// The engine is created by `make_handle` on the reconciler thread
    /// itself. If that fails a fatal error event is broadcast.
    ///
    /// # Arguments
    ///
    /// * `make_handle` - Creates the player engine.
    /// * `resolver` - Turns track ids into stream URLs.
    /// * `event_tx` - Receives status snapshots, track completions and errors.
    pub(crate) fn start<H, F>(
        make_handle: F,
        resolver: Arc<dyn StreamResolver>,
        event_tx: Sender<AppEvent>,
    ) -> Self
    where
        H: ExternalPlayerHandle + 'static,
        F: FnOnce() -> Result<H> + Send + 'static,
    {
        let (intent_tx, intent_rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_shutdown = shutdown.clone();

        let worker = thread::spawn(move || match make_handle() {
            Ok(handle) => Reconciler::new(handle, resolver, event_tx, worker_shutdown).run(intent_rx),
            Err(e) => {
                let _ = event_tx.send(AppEvent::FatalError(format!("Player engine failure: {:?}", e)));
            }
        });

        Self {
            intent_tx,
            shutdown,
            worker: Some(worker),
        }
    }

    /// A controller with no reconciler behind it; intents are left on the
    /// returned receiver.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::Receiver<Intent>) {
        let (intent_tx, intent_rx) = mpsc::channel();
        let controller = Self {
            intent_tx,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
        };
        (controller, intent_rx)
    }

    fn send(&self, intent: Intent) {
        if let Err(e) = self.intent_tx.send(intent) {
            tracing::warn!(intent = ?e.0, "playback reconciler is not running");
        }
    }

    /// Makes `index` current in `session` and starts loading it.
    ///
    /// The session may grow to reach `index`, which can block on the network
    /// for a moment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PlayerError::EmptyPlaylist`] when the session has
    /// no tracks at all.
    pub(crate) fn change_track(&self, session: &mut PlaylistSession, index: usize) -> PlayerResult<()> {
        session.set_index(index)?;
        let track = session.current()?.clone();

        tracing::info!(source = ?session.kind(), index = session.index(), track = %track, "changing track");

        self.send(Intent::ChangeTrack(track));
        Ok(())
    }

    pub(crate) fn next(&self, session: &mut PlaylistSession) -> PlayerResult<()> {
        let index = session.index().map_or(0, |i| i + 1);
        self.change_track(session, index)
    }

    /// Moves back one track, wrapping from the first to the last buffered.
    pub(crate) fn previous(&self, session: &mut PlaylistSession) -> PlayerResult<()> {
        let index = match session.index() {
            Some(i) if i > 0 => i - 1,
            _ => session.len().saturating_sub(1),
        };
        self.change_track(session, index)
    }

    /// Advances after the reconciler reports `finished` as complete, unless
    /// the user already moved elsewhere in the meantime. With nothing in the
    /// session to advance to, playback stops.
    pub(crate) fn track_finished(&self, session: &mut PlaylistSession, finished: TrackId) -> PlayerResult<()> {
        match session.current() {
            Ok(current) if current.id == finished => self.next(session),
            Ok(_) => {
                tracing::debug!(track_id = finished, "ignoring completion of a track no longer current");
                Ok(())
            }
            Err(_) => {
                tracing::info!(source = ?session.kind(), track_id = finished, "nothing to advance to, stopping");
                self.stop();
                Ok(())
            }
        }
    }

    pub(crate) fn stop(&self) {
        self.send(Intent::Stop);
    }

    pub(crate) fn toggle_play(&self) {
        self.send(Intent::TogglePlaying);
    }

    pub(crate) fn play(&self) {
        self.send(Intent::SetPlaying(true));
    }

    pub(crate) fn pause(&self) {
        self.send(Intent::SetPlaying(false));
    }

    /// Seeks to `fraction` of the track. Ignored until the length is known.
    pub(crate) fn seek_to_fraction(&self, fraction: f64) {
        self.send(Intent::SeekFraction(fraction));
    }

    pub(crate) fn seek_relative(&self, delta: Duration, forward: bool) {
        let millis = delta.as_millis().min(i64::MAX as u128) as i64;
        self.send(Intent::SeekRelative(if forward { millis } else { -millis }));
    }

    /// Reloads the current track where it is, for a wedged engine.
    pub(crate) fn refresh(&self) {
        self.send(Intent::Refresh);
    }

    pub(crate) fn adjust_volume(&self, delta: i32) {
        self.send(Intent::AdjustVolume(delta));
    }

    /// Stops the reconciler and waits for it to exit. A network call in
    /// flight is not interrupted, its result is discarded.
    pub(crate) fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("playback reconciler panicked");
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
