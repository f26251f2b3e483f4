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

//! Error types shared by the remote API, playlist and playback layers.
//!
//! Application glue (start-up, configuration, the event loop) works with
//! [`anyhow::Result`]; everything below it reports a [`PlayerError`] so callers
//! can decide whether a failure is fatal, transient, or just a warning.

use thiserror::Error;

use crate::model::TrackId;

#[derive(Debug, Error)]
pub(crate) enum PlayerError {
    /// A listing request failed: transport error, non-2xx status, or a body
    /// that was not a valid page.
    #[error("failed to fetch {endpoint} ({}): {reason}", status_text(.status))]
    RemoteFetch {
        endpoint: String,
        status: Option<u16>,
        reason: String,
    },

    /// No stream URL could be obtained for a track.
    #[error("cannot resolve a stream for track {track_id}: {reason}")]
    Resolution { track_id: TrackId, reason: String },

    /// The current track was requested before anything was buffered.
    #[error("playlist is empty")]
    EmptyPlaylist,

    /// The player engine refused to load a stream.
    #[error("player failed to load track {track_id}: {reason}")]
    TrackLoad { track_id: TrackId, reason: String },
}

fn status_text(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

pub(crate) type PlayerResult<T> = std::result::Result<T, PlayerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_fetch_message_includes_endpoint_and_status() {
        let err = PlayerError::RemoteFetch {
            endpoint: "stream".to_string(),
            status: Some(401),
            reason: "unauthorised".to_string(),
        };
        assert_eq!(err.to_string(), "failed to fetch stream (HTTP 401): unauthorised");

        let err = PlayerError::RemoteFetch {
            endpoint: "me".to_string(),
            status: None,
            reason: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "failed to fetch me (no response): connection reset");
    }
}
