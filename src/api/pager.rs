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

//! Lazy iteration over cursor-paginated listings.
//!
//! A [`RemoteCollectionPager`] issues the first request only when the first
//! item is pulled, and every following request uses nothing but the
//! `next_href` continuation returned by the server. The sequence ends when a
//! page has no continuation, or on the first failed request.

use std::{collections::VecDeque, iter::FusedIterator, marker::PhantomData, sync::Arc};

use serde::de::DeserializeOwned;

use crate::{
    api::schema::Page,
    error::{PlayerError, PlayerResult},
};

/// Performs the HTTP requests behind a pager and returns raw response bodies.
///
/// Implementations map transport failures and non-2xx statuses to
/// [`PlayerError::RemoteFetch`].
pub(crate) trait PageFetcher: Send + Sync {
    fn fetch_first(&self, path: &str, params: &[(String, String)]) -> PlayerResult<String>;

    fn fetch_next(&self, href: &str) -> PlayerResult<String>;
}

enum Cursor {
    Start,
    Next(String),
    End,
}

pub(crate) struct RemoteCollectionPager<T> {
    fetcher: Arc<dyn PageFetcher>,
    endpoint: String,
    params: Vec<(String, String)>,
    cursor: Cursor,
    buffered: VecDeque<T>,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> RemoteCollectionPager<T> {
    /// Prepares a listing of `endpoint`. No request is made until the first
    /// call to `next`.
    pub(crate) fn open(fetcher: Arc<dyn PageFetcher>, endpoint: &str, params: &[(&str, &str)]) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cursor: Cursor::Start,
            buffered: VecDeque::new(),
            _item: PhantomData,
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn decode(&self, body: &str) -> PlayerResult<Page<T>> {
        serde_json::from_str(body).map_err(|e| PlayerError::RemoteFetch {
            endpoint: self.endpoint.clone(),
            status: Some(200),
            reason: format!("malformed page: {}", e),
        })
    }
}

impl<T: DeserializeOwned> Iterator for RemoteCollectionPager<T> {
    type Item = PlayerResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffered.pop_front() {
                return Some(Ok(item));
            }

            // Each cursor is consumed exactly once, a failed request leaves the
            // pager at the end.
            let body = match std::mem::replace(&mut self.cursor, Cursor::End) {
                Cursor::End => return None,
                Cursor::Start => {
                    tracing::debug!(endpoint = %self.endpoint, "fetching first page");
                    self.fetcher.fetch_first(&self.endpoint, &self.params)
                }
                Cursor::Next(href) => {
                    tracing::debug!(endpoint = %self.endpoint, "fetching next page");
                    self.fetcher.fetch_next(&href)
                }
            };

            match body.and_then(|body| self.decode(&body)) {
                Ok(page) => {
                    self.buffered.extend(page.collection);
                    if let Some(href) = page.next_href.filter(|href| !href.is_empty()) {
                        self.cursor = Cursor::Next(href);
                    }
                }
                Err(e) => {
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "listing aborted");
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<T: DeserializeOwned> FusedIterator for RemoteCollectionPager<T> {}

#[cfg(test)]
pub(crate) mod testing {
    use std::{collections::HashMap, sync::Mutex};

    use super::*;

    /// Serves canned pages keyed by path (first request) or href (follow-ups)
    /// and records every request it receives.
    #[derive(Default)]
    pub(crate) struct ScriptedFetcher {
        pages: HashMap<String, Result<String, u16>>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        pub(crate) fn page(mut self, key: &str, body: serde_json::Value) -> Self {
            self.pages.insert(key.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn raw(mut self, key: &str, body: &str) -> Self {
            self.pages.insert(key.to_string(), Ok(body.to_string()));
            self
        }

        pub(crate) fn failing(mut self, key: &str, status: u16) -> Self {
            self.pages.insert(key.to_string(), Err(status));
            self
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn serve(&self, key: &str) -> PlayerResult<String> {
            self.requests.lock().unwrap().push(key.to_string());
            match self.pages.get(key) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(PlayerError::RemoteFetch {
                    endpoint: key.to_string(),
                    status: Some(*status),
                    reason: "scripted failure".to_string(),
                }),
                None => Err(PlayerError::RemoteFetch {
                    endpoint: key.to_string(),
                    status: Some(404),
                    reason: "no such page".to_string(),
                }),
            }
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn fetch_first(&self, path: &str, params: &[(String, String)]) -> PlayerResult<String> {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            if query.is_empty() {
                self.serve(path)
            } else {
                self.serve(&format!("{}?{}", path, query.join("&")))
            }
        }

        fn fetch_next(&self, href: &str) -> PlayerResult<String> {
            self.serve(href)
        }
    }
}
