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

//! Per-source playlist state.
//!
//! A [`PlaylistSession`] buffers tracks pulled from a track source, tracks
//! the index of the current track, and grows on demand as the user moves
//! towards the end of what has been loaded so far.

use rand::{rng, seq::SliceRandom};

use crate::{
    api::source::TrackSource,
    error::{PlayerError, PlayerResult},
    model::{SourceKind, Track},
};

/// Number of tracks kept buffered past the current index.
pub(crate) const LOOKAHEAD_WINDOW: usize = 3;

/// Number of tracks pulled by an explicit "load more".
pub(crate) const EXPANSION_BATCH: usize = 20;

type TrackFeed = Box<dyn Iterator<Item = PlayerResult<Track>>>;

pub(crate) struct PlaylistSession {
    kind: SourceKind,
    source: TrackFeed,
    exhausted: bool,
    tracks: Vec<Track>,
    index: Option<usize>,
    warning: Option<PlayerError>,
}

impl PlaylistSession {
    pub(crate) fn new<I>(kind: SourceKind, source: I) -> Self
    where
        I: Iterator<Item = PlayerResult<Track>> + 'static,
    {
        Self {
            kind,
            source: Box::new(source),
            exhausted: false,
            tracks: Vec::new(),
            index: None,
            warning: None,
        }
    }

    pub(crate) fn from_source(source: TrackSource) -> Self {
        Self::new(source.kind(), source)
    }

    pub(crate) fn kind(&self) -> SourceKind {
        self.kind
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The current index, `None` until the first track has been buffered.
    pub(crate) fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Pulls from the source until at least `min_count` tracks are buffered
    /// or the source runs dry. Running dry is not an error.
    ///
    /// # Errors
    ///
    /// A failed fetch is returned after marking the source exhausted. Tracks
    /// buffered before the failure are kept.
    pub(crate) fn ensure_loaded(&mut self, min_count: usize) -> PlayerResult<usize> {
        let before = self.tracks.len();

        while self.tracks.len() < min_count && !self.exhausted {
            match self.source.next() {
                Some(Ok(track)) => self.tracks.push(track),
                Some(Err(e)) => {
                    self.exhausted = true;
                    self.index_first_track();
                    tracing::warn!(source = ?self.kind, error = %e, "track source failed");
                    return Err(e);
                }
                None => {
                    tracing::debug!(source = ?self.kind, total = self.tracks.len(), "track source exhausted");
                    self.exhausted = true;
                }
            }
        }

        self.index_first_track();

        if self.tracks.len() > before {
            tracing::debug!(source = ?self.kind, added = self.tracks.len() - before, "playlist expanded");
        }

        Ok(self.tracks.len())
    }

    pub(crate) fn load_more(&mut self, count: usize) -> PlayerResult<usize> {
        self.ensure_loaded(self.tracks.len() + count)
    }

    /// Makes `index` current, buffering up to [`LOOKAHEAD_WINDOW`] tracks
    /// beyond it first. An index past the end of an exhausted source wraps
    /// around to the start.
    ///
    /// A failed expansion does not prevent the move; it is kept for
    /// [`take_warning`](Self::take_warning).
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::EmptyPlaylist`] if nothing could be buffered.
    pub(crate) fn set_index(&mut self, index: usize) -> PlayerResult<usize> {
        let wanted = index.saturating_add(LOOKAHEAD_WINDOW);
        if wanted > self.tracks.len() {
            if let Err(e) = self.ensure_loaded(wanted) {
                self.warning = Some(e);
            }
        }

        if self.tracks.is_empty() {
            return Err(PlayerError::EmptyPlaylist);
        }

        let index = index % self.tracks.len();
        self.index = Some(index);
        Ok(index)
    }

    pub(crate) fn current(&self) -> PlayerResult<&Track> {
        self.index
            .and_then(|i| self.tracks.get(i))
            .ok_or(PlayerError::EmptyPlaylist)
    }

    /// Randomises the playlist with the current track moved to the front.
    pub(crate) fn shuffle_keeping_current(&mut self) {
        let Some(index) = self.index else {
            return;
        };

        let current = self.tracks.remove(index);
        self.tracks.shuffle(&mut rng());
        self.tracks.insert(0, current);
        self.index = Some(0);
    }

    /// Sorts by artist then title, ignoring case, and follows the current
    /// track to its new position.
    pub(crate) fn sort_alphabetically(&mut self) {
        let Some(current_id) = self.current().ok().map(|t| t.id) else {
            return;
        };

        self.tracks
            .sort_by_key(|t| (t.artist.to_lowercase(), t.title.to_lowercase()));

        self.index = self.tracks.iter().position(|t| t.id == current_id);
        debug_assert!(self.index.is_some(), "sorting lost the current track");
    }

    /// Up to `2 * radius + 1` tracks centred on the current one, wrapping
    /// around the ends, paired with their indices.
    pub(crate) fn window(&self, radius: usize) -> Vec<(usize, &Track)> {
        let Some(index) = self.index else {
            return vec![];
        };

        let len = self.tracks.len();
        let count = (2 * radius + 1).min(len);
        let start = (index + len - radius % len) % len;

        (0..count)
            .map(|offset| {
                let i = (start + offset) % len;
                (i, &self.tracks[i])
            })
            .collect()
    }

    /// The last expansion failure raised while moving the index, if any.
    pub(crate) fn take_warning(&mut self) -> Option<PlayerError> {
        self.warning.take()
    }

    fn index_first_track(&mut self) {
        if self.index.is_none() && !self.tracks.is_empty() {
            self.index = Some(0);
        }
    }
}

/// The playlist of each source, opened on first use, and which one is active.
///
/// Each session keeps its own index, so switching back to a source resumes
/// where it was left.
pub(crate) struct Sessions {
    likes: Option<PlaylistSession>,
    feed: Option<PlaylistSession>,
    active: SourceKind,
}

impl Sessions {
    pub(crate) fn new(initial: PlaylistSession) -> Self {
        let active = initial.kind();
        let mut sessions = Self {
            likes: None,
            feed: None,
            active,
        };
        sessions.insert(initial);
        sessions
    }

    pub(crate) fn active_kind(&self) -> SourceKind {
        self.active
    }

    pub(crate) fn active(&self) -> Option<&PlaylistSession> {
        self.get(self.active)
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut PlaylistSession> {
        match self.active {
            SourceKind::Likes => self.likes.as_mut(),
            SourceKind::Feed => self.feed.as_mut(),
        }
    }

    pub(crate) fn get(&self, kind: SourceKind) -> Option<&PlaylistSession> {
        match kind {
            SourceKind::Likes => self.likes.as_ref(),
            SourceKind::Feed => self.feed.as_ref(),
        }
    }

    /// Stores `session`, replacing any previous session of the same kind.
    pub(crate) fn insert(&mut self, session: PlaylistSession) {
        match session.kind() {
            SourceKind::Likes => self.likes = Some(session),
            SourceKind::Feed => self.feed = Some(session),
        }
    }

    /// Makes `kind` active. Returns `false`, leaving the active source
    /// unchanged, when that source has not been opened yet.
    pub(crate) fn activate(&mut self, kind: SourceKind) -> bool {
        if self.get(kind).is_none() {
            return false;
        }
        self.active = kind;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::HashSet, rc::Rc};

    use super::*;

    fn track(id: u64, artist: &str, title: &str) -> Track {
        Track::new(id, title, artist)
    }

    fn numbered(n: u64) -> Vec<Track> {
        (1..=n).map(|i| track(i, &format!("artist {}", i), "song")).collect()
    }

    fn session(tracks: Vec<Track>) -> PlaylistSession {
        PlaylistSession::new(SourceKind::Feed, tracks.into_iter().map(Ok))
    }

    fn ids(session: &PlaylistSession) -> Vec<u64> {
        session.tracks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn nothing_is_pulled_until_asked() {
        let pulled = Rc::new(Cell::new(0));
        let counter = pulled.clone();
        let source = numbered(10).into_iter().map(move |t| {
            counter.set(counter.get() + 1);
            Ok(t)
        });

        let mut session = PlaylistSession::new(SourceKind::Likes, source);
        assert_eq!(pulled.get(), 0);
        assert!(matches!(session.current(), Err(PlayerError::EmptyPlaylist)));

        assert_eq!(session.ensure_loaded(4).unwrap(), 4);
        assert_eq!(pulled.get(), 4);
        assert_eq!(session.index(), Some(0));

        // Already satisfied, no further pulls.
        session.ensure_loaded(2).unwrap();
        assert_eq!(pulled.get(), 4);
    }

    #[test]
    fn short_source_is_not_an_error() {
        let mut session = session(numbered(3));

        assert_eq!(session.ensure_loaded(20).unwrap(), 3);
        assert!(session.is_exhausted());
    }

    #[test]
    fn set_index_buffers_the_lookahead() {
        let mut session = session(numbered(50));

        assert_eq!(session.set_index(10).unwrap(), 10);
        assert_eq!(session.len(), 10 + LOOKAHEAD_WINDOW);
        assert_eq!(session.current().unwrap().id, 11);
    }

    #[test]
    fn set_index_past_the_end_of_an_exhausted_source_wraps() {
        let mut session = session(numbered(3));

        assert_eq!(session.set_index(3).unwrap(), 0);
        assert_eq!(session.set_index(5).unwrap(), 2);
    }

    #[test]
    fn set_index_on_an_empty_source_fails() {
        let mut session = session(vec![]);

        assert!(matches!(session.set_index(0), Err(PlayerError::EmptyPlaylist)));
        assert!(session.current().is_err());
    }

    #[test]
    fn fetch_failure_keeps_buffered_tracks_and_becomes_a_warning() {
        let source = vec![
            Ok(track(1, "a", "one")),
            Err(PlayerError::RemoteFetch {
                endpoint: "stream".to_string(),
                status: Some(500),
                reason: "boom".to_string(),
            }),
            Ok(track(2, "b", "never")),
        ];
        let mut session = PlaylistSession::new(SourceKind::Feed, source.into_iter());

        assert_eq!(session.set_index(1).unwrap(), 0);
        assert_eq!(ids(&session), vec![1]);
        assert!(session.is_exhausted());
        assert!(matches!(session.take_warning(), Some(PlayerError::RemoteFetch { .. })));
        assert!(session.take_warning().is_none());
    }

    #[test]
    fn sort_follows_the_current_track() {
        let mut session = session(vec![track(2, "B", "x"), track(1, "A", "x"), track(3, "C", "x")]);
        session.set_index(2).unwrap();

        session.sort_alphabetically();

        assert_eq!(ids(&session), vec![1, 2, 3]);
        assert_eq!(session.index(), Some(2));
        assert_eq!(session.current().unwrap().id, 3);
    }

    #[test]
    fn sort_ignores_case_and_orders_by_title_within_artist() {
        let mut session = session(vec![
            track(1, "beta", "Zed"),
            track(2, "Alpha", "b"),
            track(3, "alpha", "A"),
            track(4, "Beta", "apple"),
        ]);
        session.set_index(1).unwrap();

        session.sort_alphabetically();

        assert_eq!(ids(&session), vec![3, 2, 4, 1]);
        assert_eq!(session.current().unwrap().id, 2);
    }

    #[test]
    fn shuffle_pins_the_current_track_first() {
        let mut session = session(numbered(30));
        session.set_index(17).unwrap();
        let before: HashSet<u64> = ids(&session).into_iter().collect();
        let current = session.current().unwrap().id;

        session.shuffle_keeping_current();

        assert_eq!(session.index(), Some(0));
        assert_eq!(session.tracks[0].id, current);
        assert_eq!(session.len(), before.len());
        assert_eq!(ids(&session).into_iter().collect::<HashSet<_>>(), before);
    }

    #[test]
    fn reorders_on_an_empty_session_do_nothing() {
        let mut session = session(vec![]);

        session.shuffle_keeping_current();
        session.sort_alphabetically();

        assert!(session.is_empty());
        assert_eq!(session.index(), None);
    }

    #[test]
    fn window_wraps_around_the_current_track() {
        let mut session = session(numbered(6));
        session.ensure_loaded(6).unwrap();

        let window: Vec<usize> = session.window(2).into_iter().map(|(i, _)| i).collect();
        assert_eq!(window, vec![4, 5, 0, 1, 2]);
    }

    #[test]
    fn window_never_repeats_tracks_on_a_short_playlist() {
        let mut session = session(numbered(2));
        session.set_index(1).unwrap();

        let window: Vec<usize> = session.window(2).into_iter().map(|(i, _)| i).collect();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn sessions_keep_their_own_index() {
        let mut feed = session(numbered(10));
        feed.set_index(4).unwrap();
        let mut sessions = Sessions::new(feed);

        assert!(!sessions.activate(SourceKind::Likes));
        assert_eq!(sessions.active_kind(), SourceKind::Feed);

        let mut likes = PlaylistSession::new(SourceKind::Likes, numbered(5).into_iter().map(Ok));
        likes.set_index(1).unwrap();
        sessions.insert(likes);

        assert!(sessions.activate(SourceKind::Likes));
        assert_eq!(sessions.active().unwrap().index(), Some(1));

        assert!(sessions.activate(SourceKind::Feed));
        assert_eq!(sessions.active_mut().unwrap().index(), Some(4));
    }
}
