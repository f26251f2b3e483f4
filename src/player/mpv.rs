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

//! MPV-backed implementation of [`ExternalPlayerHandle`].
//!
//! `libmpv` handles HLS streaming, decoding and audio output. The handle is
//! created on, and only ever used from, the playback reconciler thread.

use anyhow::{Context, Result};

use crate::player::ExternalPlayerHandle;

const MAX_VOLUME: i32 = 100;

pub(crate) struct MpvPlayer {
    handler: mpv::MpvHandler,
}

impl MpvPlayer {
    /// Creates an audio-only MPV context at the given volume.
    ///
    /// # Errors
    ///
    /// Returns an error if the MPV context fails to initialise.
    pub(crate) fn new(volume: u32) -> Result<Self> {
        let mut handler = (|| {
            let mut builder = mpv::MpvHandlerBuilder::new().context("Failed to create MPV builder")?;
            builder
                .set_option("vo", "null")
                .context("Failed to set no video output")?;
            // Hold the last frame so the end position stays readable.
            builder
                .set_option("keep-open", "yes")
                .context("Failed to set keep-open")?;
            builder.build().context("Failed to build MPV handler")
        })()?;

        handler
            .set_property("volume", volume as f64)
            .context("Failed to set initial volume")?;

        Ok(Self { handler })
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.handler.get_property::<bool>(name).ok()
    }

    fn millis(&self, name: &str) -> Option<u64> {
        self.handler
            .get_property::<f64>(name)
            .ok()
            .filter(|seconds| *seconds >= 0.0)
            .map(|seconds| (seconds * 1000.0).round() as u64)
    }
}

impl ExternalPlayerHandle for MpvPlayer {
    fn load(&mut self, url: &str, start_ms: u64) -> Result<()> {
        // The start option applies to the next file loaded.
        let start = format!("{:.3}", start_ms as f64 / 1000.0);
        self.handler
            .set_property("start", start.as_str())
            .context("Failed to set start position")?;
        self.handler
            .command(&["loadfile", url, "replace"])
            .context("Failed to load stream")?;
        Ok(())
    }

    fn play(&mut self) {
        if let Err(e) = self.handler.set_property("pause", false) {
            tracing::warn!(error = ?e, "mpv refused to resume");
        }
    }

    fn pause(&mut self) {
        if let Err(e) = self.handler.set_property("pause", true) {
            tracing::warn!(error = ?e, "mpv refused to pause");
        }
    }

    fn position_ms(&mut self) -> Option<u64> {
        self.millis("time-pos")
    }

    fn length_ms(&mut self) -> Option<u64> {
        self.millis("duration").filter(|ms| *ms > 0)
    }

    fn is_playing(&mut self) -> bool {
        let paused = self.flag("pause").unwrap_or(true);
        let idle = self.flag("idle-active").unwrap_or(true);
        !paused && !idle
    }

    fn adjust_volume(&mut self, delta: i32) {
        let current = self.volume().unwrap_or(0) as i32;
        let volume = (current + delta).clamp(0, MAX_VOLUME) as f64;
        if let Err(e) = self.handler.set_property("volume", volume) {
            tracing::warn!(error = ?e, "mpv refused volume change");
        }
    }

    fn volume(&mut self) -> Option<u32> {
        self.handler
            .get_property::<f64>("volume")
            .ok()
            .map(|v| v.round().max(0.0) as u32)
    }

    fn pump(&mut self) {
        // Drain without blocking, the reconciler sets its own pace.
        while let Some(event) = self.handler.wait_event(0.0) {
            if let mpv::Event::EndFile(Ok(reason)) = event {
                if matches!(reason, mpv::EndFileReason::MPV_END_FILE_REASON_ERROR) {
                    tracing::warn!("mpv stopped on a playback error");
                }
            }
        }
    }
}
