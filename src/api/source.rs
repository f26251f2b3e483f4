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

//! Track sequences for the "likes" and "feed" playlists.
//!
//! A [`TrackSource`] pulls raw listing entries from a
//! [`RemoteCollectionPager`] and yields only playable tracks. Entries that
//! are filtered out are skipped transparently, which may cost further page
//! requests within a single call to `next`.

use std::{collections::HashSet, iter::FusedIterator, sync::Arc};

use crate::{
    api::{
        pager::{PageFetcher, RemoteCollectionPager},
        schema::CollectionItem,
    },
    error::PlayerResult,
    model::{SourceKind, Track, TrackId},
};

const FEED_ENDPOINT: &str = "stream";
const FEED_ACTIVITY_TYPES: &str = "TrackPost,TrackRepost,PlaylistPost";

/// Extra filtering applied to the activity feed, where long mixes are mixed
/// in with short uploads and the same track shows up once per repost.
struct FeedFilter {
    min_duration_ms: u64,
    seen: HashSet<TrackId>,
}

impl FeedFilter {
    fn accept(&mut self, track_id: TrackId, duration_ms: u64) -> bool {
        duration_ms >= self.min_duration_ms && self.seen.insert(track_id)
    }
}

pub(crate) struct TrackSource {
    kind: SourceKind,
    pager: RemoteCollectionPager<CollectionItem>,
    feed_filter: Option<FeedFilter>,
}

impl TrackSource {
    /// Tracks liked by the user with the given id, newest first.
    pub(crate) fn likes(fetcher: Arc<dyn PageFetcher>, user_id: u64) -> Self {
        let endpoint = format!("users/{}/likes", user_id);
        Self {
            kind: SourceKind::Likes,
            pager: RemoteCollectionPager::open(fetcher, &endpoint, &[]),
            feed_filter: None,
        }
    }

    /// The user's activity stream, keeping only tracks at least
    /// `min_length_secs` long and each track at most once.
    pub(crate) fn feed(fetcher: Arc<dyn PageFetcher>, min_length_secs: u64) -> Self {
        Self {
            kind: SourceKind::Feed,
            pager: RemoteCollectionPager::open(
                fetcher,
                FEED_ENDPOINT,
                &[("activityTypes", FEED_ACTIVITY_TYPES)],
            ),
            feed_filter: Some(FeedFilter {
                min_duration_ms: min_length_secs.saturating_mul(1000),
                seen: HashSet::new(),
            }),
        }
    }

    pub(crate) fn kind(&self) -> SourceKind {
        self.kind
    }
}

impl Iterator for TrackSource {
    type Item = PlayerResult<Track>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = match self.pager.next()? {
                Ok(item) => item,
                Err(e) => return Some(Err(e)),
            };

            let Some(remote) = item.track else {
                continue;
            };

            if let Some(filter) = self.feed_filter.as_mut() {
                if !filter.accept(remote.id, remote.duration) {
                    tracing::trace!(
                        endpoint = self.pager.endpoint(),
                        track_id = remote.id,
                        "skipping feed entry"
                    );
                    continue;
                }
            }

            return Some(Ok(remote.into()));
        }
    }
}

impl FusedIterator for TrackSource {}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{api::pager::testing::ScriptedFetcher, error::PlayerError};

    const FEED_FIRST: &str = "stream?activityTypes=TrackPost,TrackRepost,PlaylistPost";

    fn entry(id: u64, duration_ms: u64) -> Value {
        json!({
            "type": "track-repost",
            "track": {"id": id, "title": format!("t{}", id), "duration": duration_ms, "user": {"username": "u"}}
        })
    }

    fn ids(source: TrackSource) -> Vec<u64> {
        source.map(|t| t.unwrap().id).collect()
    }

    fn feed(fetcher: ScriptedFetcher, min_secs: u64) -> TrackSource {
        TrackSource::feed(Arc::new(fetcher), min_secs)
    }

    #[test]
    fn feed_yields_a_repeated_track_only_once() {
        let fetcher = ScriptedFetcher::default()
            .page(FEED_FIRST, json!({"collection": [entry(1, 5000), entry(2, 5000)], "next_href": "https://x/2"}))
            .page("https://x/2", json!({"collection": [entry(1, 5000), entry(3, 5000)]}));

        assert_eq!(ids(feed(fetcher, 5)), vec![1, 2, 3]);
    }

    #[test]
    fn feed_duration_filter_keeps_the_boundary() {
        let fetcher = ScriptedFetcher::default().page(
            FEED_FIRST,
            json!({"collection": [entry(1, 1_799_999), entry(2, 1_800_000), entry(3, 3_600_000)]}),
        );

        assert_eq!(ids(feed(fetcher, 1800)), vec![2, 3]);
    }

    #[test]
    fn entries_without_a_track_are_dropped() {
        let fetcher = ScriptedFetcher::default().page(
            FEED_FIRST,
            json!({"collection": [{"type": "playlist", "playlist": {"id": 5}}, entry(6, 10_000)]}),
        );

        assert_eq!(ids(feed(fetcher, 0)), vec![6]);
    }

    #[test]
    fn filtered_pages_are_skipped_within_one_pull() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page(FEED_FIRST, json!({"collection": [entry(1, 10)], "next_href": "https://x/2"}))
                .page("https://x/2", json!({"collection": [entry(2, 10)], "next_href": "https://x/3"}))
                .page("https://x/3", json!({"collection": [entry(3, 60_000)]})),
        );
        let mut source = TrackSource::feed(fetcher.clone(), 60);

        assert_eq!(source.next().unwrap().unwrap().id, 3);
        assert_eq!(fetcher.request_count(), 3);
        assert!(source.next().is_none());
    }

    #[test]
    fn likes_keep_duplicates_and_short_tracks() {
        let fetcher = ScriptedFetcher::default().page(
            "users/42/likes",
            json!({"collection": [entry(1, 10), entry(1, 10), {"playlist": {}}]}),
        );
        let source = TrackSource::likes(Arc::new(fetcher), 42);

        assert_eq!(source.kind(), SourceKind::Likes);
        assert_eq!(ids(source), vec![1, 1]);
    }

    #[test]
    fn fetch_errors_pass_through_then_end() {
        let fetcher = ScriptedFetcher::default()
            .page("users/1/likes", json!({"collection": [entry(1, 10)], "next_href": "https://x/2"}))
            .failing("https://x/2", 500);
        let mut source = TrackSource::likes(Arc::new(fetcher), 1);

        assert_eq!(source.next().unwrap().unwrap().id, 1);
        assert!(matches!(source.next(), Some(Err(PlayerError::RemoteFetch { .. }))));
        assert!(source.next().is_none());
    }
}
