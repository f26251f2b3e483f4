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

//! The playback reconciliation loop.
//!
//! The [`Reconciler`] owns the desired playback state and the player handle.
//! Every [`POLL_INTERVAL`] it applies pending [`Intent`]s, reads the engine's
//! actual state, and issues whatever commands bring the two back in line:
//!
//! 1. Reload the stream when the engine holds the wrong track, has drifted
//!    from the desired position (a seek), or has stalled.
//! 2. Ask the foreground to advance when the track is within 0.1% of its end.
//! 3. Otherwise resume or pause to match the desired play state.
//!
//! Blocking work (stream resolution and loading) happens only here, never on
//! the UI thread.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, Sender, TryRecvError},
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    actions::events::AppEvent,
    api::StreamResolver,
    error::PlayerError,
    model::{Track, TrackId},
    playback::{Intent, PlaybackPhase, PlaybackStatus},
    player::ExternalPlayerHandle,
};

pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Largest tolerated gap between the engine's position and the desired one.
pub(crate) const DRIFT_TOLERANCE_MS: u64 = 3_000;

/// Fraction of the track after which it counts as finished. Engines report a
/// zero position around the end of a stream, so exact end detection is not
/// reliable.
pub(crate) const NEAR_END_RATIO: f64 = 0.999;

/// How long a freshly loaded stream may take to report a position.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Consecutive failed loads before playback gives up on a track.
pub(crate) const MAX_LOAD_ATTEMPTS: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReloadCause {
    TrackChanged,
    Refresh,
    Seek,
    Stalled,
}

/// One reading of the engine.
#[derive(Clone, Copy, Debug)]
struct Observation {
    playing: bool,
    position_ms: Option<u64>,
    length_ms: Option<u64>,
}

impl Observation {
    fn near_end(&self) -> bool {
        match (self.position_ms, self.length_ms) {
            (Some(position), Some(length)) if length > 0 => {
                position as f64 / length as f64 > NEAR_END_RATIO
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
struct PlaybackState {
    phase: PlaybackPhase,
    desired_playing: bool,
    desired_position_ms: u64,
    desired_track: Option<Track>,
    active_track_id: Option<TrackId>,
    last_observed_position_ms: Option<u64>,
    last_known_length_ms: Option<u64>,
    volume: Option<u32>,

    /// Reload regardless of what the engine reports.
    forced_reload: Option<ReloadCause>,
    /// The engine has reported a position since the last load.
    settled: bool,
    loaded_at: Option<Instant>,
    advance_requested: bool,
    failed_attempts: u32,
    retry_at: Option<Instant>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            desired_playing: true,
            desired_position_ms: 0,
            desired_track: None,
            active_track_id: None,
            last_observed_position_ms: None,
            last_known_length_ms: None,
            volume: None,
            forced_reload: None,
            settled: false,
            loaded_at: None,
            advance_requested: false,
            failed_attempts: 0,
            retry_at: None,
        }
    }
}

pub(crate) struct Reconciler<H> {
    handle: H,
    resolver: Arc<dyn StreamResolver>,
    event_tx: Sender<AppEvent>,
    shutdown: Arc<AtomicBool>,
    state: PlaybackState,
}

impl<H: ExternalPlayerHandle> Reconciler<H> {
    pub(crate) fn new(
        handle: H,
        resolver: Arc<dyn StreamResolver>,
        event_tx: Sender<AppEvent>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            handle,
            resolver,
            event_tx,
            shutdown,
            state: PlaybackState::default(),
        }
    }

    /// Runs until the shutdown flag is raised or the controller is dropped.
    pub(crate) fn run(mut self, intent_rx: Receiver<Intent>) {
        tracing::debug!("playback reconciler started");

        while !self.shutdown.load(Ordering::Relaxed) {
            loop {
                match intent_rx.try_recv() {
                    Ok(intent) => self.apply(intent),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        tracing::debug!("playback controller gone, stopping");
                        return;
                    }
                }
            }

            self.tick(Instant::now());
            thread::sleep(POLL_INTERVAL);
        }

        tracing::debug!("playback reconciler stopped");
    }

    /// Folds one user intent into the desired state. Nothing here blocks;
    /// the next [`tick`](Self::tick) acts on the result.
    pub(crate) fn apply(&mut self, intent: Intent) {
        let state = &mut self.state;

        match intent {
            Intent::ChangeTrack(track) => {
                tracing::debug!(track_id = track.id, "track change requested");
                state.desired_track = Some(track);
                state.desired_position_ms = 0;
                state.last_observed_position_ms = None;
                state.last_known_length_ms = None;
                state.forced_reload = Some(ReloadCause::TrackChanged);
                state.advance_requested = false;
                state.failed_attempts = 0;
                state.retry_at = None;
                state.phase = PlaybackPhase::Loading;
            }
            Intent::SetPlaying(playing) => state.desired_playing = playing,
            Intent::TogglePlaying => state.desired_playing = !state.desired_playing,
            Intent::SeekFraction(fraction) => {
                if let Some(length) = state.last_known_length_ms.filter(|l| *l > 0) {
                    state.desired_position_ms = (fraction.clamp(0.0, 1.0) * length as f64).round() as u64;
                }
            }
            Intent::SeekRelative(delta_ms) => {
                if let Some(length) = state.last_known_length_ms.filter(|l| *l > 0) {
                    let target = (state.desired_position_ms as i64).saturating_add(delta_ms);
                    state.desired_position_ms = target.clamp(0, length as i64) as u64;
                }
            }
            Intent::Refresh => {
                if state.desired_track.is_some() {
                    if let Some(position) = state.last_observed_position_ms {
                        state.desired_position_ms = position;
                    }
                    state.forced_reload = Some(ReloadCause::Refresh);
                    state.failed_attempts = 0;
                    state.retry_at = None;
                    state.phase = PlaybackPhase::Loading;
                }
            }
            Intent::Stop => {
                tracing::debug!(track_id = ?state.desired_track.as_ref().map(|t| t.id), "playback stopped");
                self.handle.pause();
                self.state = PlaybackState {
                    desired_playing: self.state.desired_playing,
                    volume: self.state.volume,
                    ..PlaybackState::default()
                };
            }
            Intent::AdjustVolume(delta) => {
                self.handle.adjust_volume(delta);
                self.state.volume = self.handle.volume();
            }
        }
    }

    /// One reconciliation pass against the engine.
    pub(crate) fn tick(&mut self, now: Instant) {
        self.handle.pump();

        if matches!(self.state.phase, PlaybackPhase::Idle | PlaybackPhase::Failed) {
            self.publish(now);
            return;
        }

        if self.state.retry_at.is_some_and(|at| now < at) {
            self.publish(now);
            return;
        }

        let observation = Observation {
            playing: self.handle.is_playing(),
            position_ms: self.handle.position_ms(),
            length_ms: self.handle.length_ms(),
        };

        if let Some(cause) = self.stale_cause(&observation, now) {
            self.reload(cause, now);
            self.publish(now);
            return;
        }

        if self.state.advance_requested {
            // Waiting for the foreground to pick the next track.
            self.publish(now);
            return;
        }

        if observation.near_end() {
            if let Some(track_id) = self.state.active_track_id {
                tracing::debug!(track_id, "track finished");
                self.state.advance_requested = true;
                let _ = self.event_tx.send(AppEvent::TrackFinished(track_id));
            }
            self.publish(now);
            return;
        }

        if self.state.desired_playing && !observation.playing {
            self.handle.play();
        } else if !self.state.desired_playing && observation.playing {
            self.handle.pause();
        }

        let state = &mut self.state;
        state.last_observed_position_ms = observation.position_ms;
        if observation.length_ms.is_some() {
            state.last_known_length_ms = observation.length_ms;
        }
        if let Some(position) = observation.position_ms {
            // Already within tolerance of the desired position, so the engine
            // becomes the reference from here on.
            state.desired_position_ms = position;
            state.settled = true;
        }
        state.phase = if state.desired_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        };
        state.volume = self.handle.volume();

        self.publish(now);
    }

    fn stale_cause(&self, observation: &Observation, now: Instant) -> Option<ReloadCause> {
        let state = &self.state;
        let track = state.desired_track.as_ref()?;

        if state.active_track_id != Some(track.id) {
            return Some(ReloadCause::TrackChanged);
        }

        if let Some(cause) = state.forced_reload {
            return Some(cause);
        }

        if state.advance_requested {
            return None;
        }

        match observation.position_ms {
            // Before settling the desired position is still the start offset
            // of the last load (or a seek made since), and the engine may not
            // have honoured it.
            Some(position) => (position.abs_diff(state.desired_position_ms) > DRIFT_TOLERANCE_MS)
                .then_some(ReloadCause::Seek),
            None if state.settled => Some(ReloadCause::Stalled),
            None => state
                .loaded_at
                .is_some_and(|at| now.duration_since(at) > SETTLE_TIMEOUT)
                .then_some(ReloadCause::Stalled),
        }
    }

    /// Resolves a fresh stream URL and loads it at the desired position.
    fn reload(&mut self, cause: ReloadCause, now: Instant) {
        let Some(track) = self.state.desired_track.clone() else {
            return;
        };
        let start_ms = self.state.desired_position_ms;

        tracing::info!(track_id = track.id, ?cause, start_ms, "loading stream");

        let url = match self.resolver.resolve(track.id) {
            Ok(url) => url,
            Err(e) => return self.record_failure(&track, cause, e, now),
        };

        if self.shutdown.load(Ordering::Relaxed) {
            return;
        }

        if let Err(e) = self.handle.load(&url, start_ms) {
            let error = PlayerError::TrackLoad {
                track_id: track.id,
                reason: format!("{:#}", e),
            };
            return self.record_failure(&track, cause, error, now);
        }

        if self.state.desired_playing {
            self.handle.play();
        } else {
            self.handle.pause();
        }

        let state = &mut self.state;
        state.active_track_id = Some(track.id);
        state.forced_reload = None;
        state.settled = false;
        state.loaded_at = Some(now);
        state.last_observed_position_ms = None;
        state.failed_attempts = 0;
        state.retry_at = None;
        state.phase = if state.desired_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        };
    }

    /// Keeps the track in `Loading` and schedules a retry with exponential
    /// back-off, or gives up after [`MAX_LOAD_ATTEMPTS`].
    fn record_failure(&mut self, track: &Track, cause: ReloadCause, error: PlayerError, now: Instant) {
        let state = &mut self.state;
        state.failed_attempts += 1;
        state.forced_reload = Some(cause);

        tracing::warn!(
            track_id = track.id,
            attempt = state.failed_attempts,
            error = %error,
            "stream load failed"
        );

        if state.failed_attempts >= MAX_LOAD_ATTEMPTS {
            state.phase = PlaybackPhase::Failed;
            state.retry_at = None;
            let _ = self.event_tx.send(AppEvent::Error(format!(
                "Giving up on {} after {} attempts: {}",
                track, state.failed_attempts, error
            )));
        } else {
            state.phase = PlaybackPhase::Loading;
            state.retry_at = Some(now + backoff(state.failed_attempts));
            let _ = self.event_tx.send(AppEvent::Error(error.to_string()));
        }
    }

    fn publish(&self, now: Instant) {
        let state = &self.state;
        let status = PlaybackStatus {
            phase: state.phase,
            track: state.desired_track.clone(),
            desired_playing: state.desired_playing,
            position_ms: state
                .last_observed_position_ms
                .unwrap_or(state.desired_position_ms),
            length_ms: state.last_known_length_ms,
            volume: state.volume,
            observed_at: now,
        };
        let _ = self.event_tx.send(AppEvent::Playback(status));
    }
}

/// Delay before retry number `attempt` (starting at one): the poll interval,
/// doubling each time, capped at [`MAX_BACKOFF`].
fn backoff(attempt: u32) -> Duration {
    POLL_INTERVAL
        .saturating_mul(1 << attempt.saturating_sub(1).min(16))
        .min(MAX_BACKOFF)
}
