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

//! Wire shapes of the SoundCloud v2 API responses we consume.
//!
//! Only the fields the player reads are declared, everything else in the
//! payloads is ignored by serde.

use serde::Deserialize;

use crate::model::{Track, TrackId};

/// One page of a cursor-paginated listing.
#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub(crate) collection: Vec<T>,
    #[serde(default)]
    pub(crate) next_href: Option<String>,
}

/// An entry of the likes or stream listings. Entries that wrap something
/// other than a track (playlists, reposted sets) have no `track` field.
#[derive(Debug, Deserialize)]
pub(crate) struct CollectionItem {
    #[serde(default)]
    pub(crate) track: Option<RemoteTrack>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteTrack {
    pub(crate) id: TrackId,
    pub(crate) title: String,
    /// Milliseconds.
    #[serde(default)]
    pub(crate) duration: u64,
    pub(crate) user: RemoteUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteUser {
    pub(crate) username: String,
}

impl From<RemoteTrack> for Track {
    fn from(remote: RemoteTrack) -> Self {
        Track::new(remote.id, remote.title, remote.user.username)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Me {
    pub(crate) id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackDetails {
    pub(crate) media: Media,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Media {
    #[serde(default)]
    pub(crate) transcodings: Vec<Transcoding>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Transcoding {
    pub(crate) url: String,
    pub(crate) preset: String,
    pub(crate) format: TranscodingFormat,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranscodingFormat {
    pub(crate) protocol: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamLocation {
    pub(crate) url: String,
}
