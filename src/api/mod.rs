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

//! SoundCloud v2 API client.
//!
//! This module provides the authenticated [`SoundCloudClient`] used by the
//! rest of the application. It owns the HTTP session (OAuth header, browser
//! user agent and the scraped `client_id`), serves listing pages to
//! [`RemoteCollectionPager`]s, and resolves tracks to stream URLs.
//!
//! # Organization
//!
//! * [`pager`]: lazy iteration over cursor-paginated listings.
//! * [`source`]: the filtered "likes" and "feed" track sequences.
//! * [`schema`]: serde shapes of the responses.
//! * [`client_id`]: `client_id` discovery from the web player bundle.

mod client_id;
pub(crate) mod pager;
pub(crate) mod schema;
pub(crate) mod source;

use std::{
    collections::HashSet,
    sync::{Arc, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::{
    api::{
        pager::{PageFetcher, RemoteCollectionPager},
        schema::{Me, StreamLocation, TrackDetails, Transcoding},
        source::TrackSource,
    },
    error::{PlayerError, PlayerResult},
    model::TrackId,
};

const API_BASE: &str = "https://api-v2.soundcloud.com/";

/// Upper bound on any single request, so shutting down never waits long on a
/// stream resolution in flight.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0";

/// Resolves a track to a currently valid stream URL.
///
/// Stream URLs are signed and expire, so callers resolve again whenever they
/// need to (re)load a track rather than caching the result.
pub(crate) trait StreamResolver: Send + Sync {
    fn resolve(&self, track_id: TrackId) -> PlayerResult<String>;
}

pub(crate) struct SoundCloudClient {
    http: Client,
    base_url: String,
    client_id: String,
    user_id: OnceLock<u64>,
}

impl SoundCloudClient {
    /// Builds an authenticated session and bootstraps the `client_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value, or if the
    /// `client_id` cannot be scraped from the web player.
    pub(crate) fn connect(oauth_token: &str) -> Result<Self> {
        let bootstrap = http_client(HeaderMap::new(), REQUEST_TIMEOUT)?;
        let client_id = client_id::fetch_client_id(&bootstrap)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("OAuth {}", oauth_token.trim()))
            .context("OAuth token contains invalid characters")?;
        headers.insert(AUTHORIZATION, auth);

        let http = http_client(headers, REQUEST_TIMEOUT)?;

        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            client_id,
            user_id: OnceLock::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request with the session `client_id` attached and returns the
    /// body of a successful response.
    fn send(&self, endpoint: &str, request: RequestBuilder) -> PlayerResult<String> {
        let fetch_error = |status: Option<u16>, reason: String| PlayerError::RemoteFetch {
            endpoint: endpoint.to_string(),
            status,
            reason,
        };

        let response = request
            .query(&[("client_id", self.client_id.as_str())])
            .send()
            .map_err(|e| fetch_error(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(
                Some(status.as_u16()),
                status.canonical_reason().unwrap_or("request failed").to_string(),
            ));
        }

        response
            .text()
            .map_err(|e| fetch_error(Some(status.as_u16()), e.to_string()))
    }

    /// GETs `path` relative to the API base and decodes the JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> PlayerResult<T> {
        let body = self.send(path, self.http.get(self.url(path)).query(params))?;
        serde_json::from_str(&body).map_err(|e| PlayerError::RemoteFetch {
            endpoint: path.to_string(),
            status: Some(200),
            reason: format!("malformed body: {}", e),
        })
    }

    /// The authenticated user's id, fetched on first use.
    pub(crate) fn user_id(&self) -> PlayerResult<u64> {
        if let Some(id) = self.user_id.get() {
            return Ok(*id);
        }

        let me: Me = self.get_json("me", &[])?;
        tracing::debug!(user_id = me.id, "resolved current user");
        Ok(*self.user_id.get_or_init(|| me.id))
    }

    /// Every track id the user has liked, used for display badges.
    pub(crate) fn liked_track_ids(self: &Arc<Self>) -> PlayerResult<HashSet<TrackId>> {
        let fetcher: Arc<dyn PageFetcher> = self.clone();
        RemoteCollectionPager::<TrackId>::open(fetcher, "me/track_likes/ids", &[]).collect()
    }

    pub(crate) fn likes_source(self: &Arc<Self>) -> PlayerResult<TrackSource> {
        let user_id = self.user_id()?;
        Ok(TrackSource::likes(self.clone(), user_id))
    }

    pub(crate) fn feed_source(self: &Arc<Self>, min_length_secs: u64) -> TrackSource {
        TrackSource::feed(self.clone(), min_length_secs)
    }
}

impl PageFetcher for SoundCloudClient {
    fn fetch_first(&self, path: &str, params: &[(String, String)]) -> PlayerResult<String> {
        self.send(path, self.http.get(self.url(path)).query(params))
    }

    fn fetch_next(&self, href: &str) -> PlayerResult<String> {
        self.send(href, self.http.get(href))
    }
}

impl StreamResolver for SoundCloudClient {
    fn resolve(&self, track_id: TrackId) -> PlayerResult<String> {
        let resolution_error = |reason: String| PlayerError::Resolution { track_id, reason };

        let details: TrackDetails = self
            .get_json(&format!("tracks/{}", track_id), &[])
            .map_err(|e| resolution_error(e.to_string()))?;

        let transcoding = pick_transcoding(&details.media.transcodings)
            .ok_or_else(|| resolution_error("no usable transcoding found".to_string()))?;

        let body = self
            .send(&transcoding.url, self.http.get(&transcoding.url))
            .map_err(|e| resolution_error(e.to_string()))?;
        let location: StreamLocation =
            serde_json::from_str(&body).map_err(|e| resolution_error(e.to_string()))?;

        tracing::debug!(track_id, preset = %transcoding.preset, "resolved stream");

        Ok(location.url)
    }
}

fn http_client(headers: HeaderMap, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// The first MP3 rendition delivered over HLS.
fn pick_transcoding(transcodings: &[Transcoding]) -> Option<&Transcoding> {
    transcodings
        .iter()
        .find(|t| t.preset.contains("mp3") && t.format.protocol == "hls")
}

#[cfg(test)]
mod tests {
    use std::{net::TcpListener, thread, time::Instant};

    use super::*;
    use crate::api::schema::Media;

    #[test]
    fn unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        thread::spawn(move || {
            // Accept and hold connections without ever answering.
            let _held: Vec<_> = listener.incoming().take(4).collect();
            thread::sleep(Duration::from_secs(30));
        });

        let client = SoundCloudClient {
            http: http_client(HeaderMap::new(), Duration::from_millis(300)).unwrap(),
            base_url: format!("http://{}/", address),
            client_id: "id".to_string(),
            user_id: OnceLock::new(),
        };

        let started = Instant::now();
        let result = client.get_json::<Me>("me", &[]);

        assert!(matches!(result, Err(PlayerError::RemoteFetch { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn picks_the_first_hls_mp3_transcoding() {
        let media: Media = serde_json::from_value(serde_json::json!({
            "transcodings": [
                {"url": "https://a/progressive", "preset": "mp3_1_0", "format": {"protocol": "progressive"}},
                {"url": "https://a/opus", "preset": "opus_0_0", "format": {"protocol": "hls"}},
                {"url": "https://a/hls-mp3", "preset": "mp3_0_0", "format": {"protocol": "hls"}},
                {"url": "https://a/hls-mp3-b", "preset": "mp3_1_0", "format": {"protocol": "hls"}}
            ]
        }))
        .unwrap();

        let chosen = pick_transcoding(&media.transcodings).unwrap();
        assert_eq!(chosen.url, "https://a/hls-mp3");
    }

    #[test]
    fn no_transcoding_when_only_other_codecs_exist() {
        let media: Media = serde_json::from_value(serde_json::json!({
            "transcodings": [
                {"url": "https://a/opus", "preset": "opus_0_0", "format": {"protocol": "hls"}}
            ]
        }))
        .unwrap();

        assert!(pick_transcoding(&media.transcodings).is_none());
    }
}
