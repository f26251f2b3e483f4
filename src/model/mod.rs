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

//! Domain models and core data structures.
//!
//! This module defines the central entities of the application: the playable
//! [`Track`] and the [`SourceKind`] a playlist is built from.

pub(crate) mod playlist;

use std::{
    fmt,
    hash::{Hash, Hasher},
};

pub(crate) type TrackId = u64;

/// A playable remote track.
///
/// Identity is the SoundCloud track id alone. Titles and usernames can be
/// edited upstream between two page fetches, and such a track is still the
/// same track.
#[derive(Debug, Clone)]
pub(crate) struct Track {
    pub(crate) id: TrackId,
    pub(crate) title: String,
    pub(crate) artist: String,
}

impl Track {
    pub(crate) fn new(id: TrackId, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// The two playlist origins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SourceKind {
    Likes,
    Feed,
}

impl SourceKind {
    pub(crate) fn other(self) -> Self {
        match self {
            SourceKind::Likes => SourceKind::Feed,
            SourceKind::Feed => SourceKind::Likes,
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            SourceKind::Likes => "Likes",
            SourceKind::Feed => "Feed",
        }
    }
}
