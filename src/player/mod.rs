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

//! Audio engine abstraction.
//!
//! This module defines [`ExternalPlayerHandle`], the narrow interface the
//! playback reconciler uses to drive a native playback engine, and provides
//! the MPV-backed implementation in [`mpv`].
//!
//! The engine is treated as untrusted: commands are fire-and-forget and its
//! state is re-read by polling rather than taken from its own events.

pub(crate) mod mpv;

use anyhow::Result;

pub(crate) trait ExternalPlayerHandle {
    /// Replaces whatever is loaded with `url`, starting `start_ms` in.
    fn load(&mut self, url: &str, start_ms: u64) -> Result<()>;

    fn play(&mut self);

    fn pause(&mut self);

    /// Current position, `None` while nothing is playing or buffering.
    fn position_ms(&mut self) -> Option<u64>;

    /// Length of the loaded media, `None` until known.
    fn length_ms(&mut self) -> Option<u64>;

    fn is_playing(&mut self) -> bool;

    fn adjust_volume(&mut self, delta: i32);

    fn volume(&mut self) -> Option<u32>;

    /// Gives the engine a chance to process its own event queue. Called once
    /// at the start of every reconciliation tick.
    fn pump(&mut self) {}
}
