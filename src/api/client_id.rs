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

//! Discovery of the public web `client_id`.
//!
//! The v2 API rejects requests without a `client_id` query parameter. The web
//! player embeds one in its asset bundle, so it is scraped from the last
//! asset script referenced by the home page.

use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use reqwest::blocking::Client;

const HOME_PAGE: &str = "https://soundcloud.com";

static ASSET_SCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src="(https://a-v2\.sndcdn\.com/assets/[^.]+\.js)""#).expect("valid asset regex")
});

static CLIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"client_id:"([^"]+)""#).expect("valid client id regex"));

/// Fetches the home page and its newest asset bundle and extracts the
/// `client_id` from it.
pub(crate) fn fetch_client_id(http: &Client) -> Result<String> {
    let html = http
        .get(HOME_PAGE)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .context("Failed to load the SoundCloud home page")?;

    let script_url = last_asset_script(&html)
        .ok_or_else(|| anyhow!("Could not generate client ID - no asset scripts found"))?;

    let script = http
        .get(script_url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .with_context(|| format!("Failed to load asset script '{}'", script_url))?;

    let client_id = find_client_id(&script)
        .ok_or_else(|| anyhow!("Could not find client_id in script '{}'", script_url))?;

    tracing::info!(script = script_url, "obtained client id");

    Ok(client_id.to_string())
}

fn last_asset_script(html: &str) -> Option<&str> {
    ASSET_SCRIPT
        .captures_iter(html)
        .last()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn find_client_id(script: &str) -> Option<&str> {
    CLIENT_ID
        .captures(script)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_last_asset_script() {
        let html = r#"
            <script crossorigin src="https://a-v2.sndcdn.com/assets/0-aaaa.js"></script>
            <script crossorigin src="https://example.com/other.js"></script>
            <script crossorigin src="https://a-v2.sndcdn.com/assets/49-bbbb.js"></script>
        "#;

        assert_eq!(last_asset_script(html), Some("https://a-v2.sndcdn.com/assets/49-bbbb.js"));
        assert_eq!(last_asset_script("<html></html>"), None);
    }

    #[test]
    fn extracts_client_id_from_bundle() {
        let js = r#"n.a={env:"production",client_id:"AbC123xyz",api_host:"api-v2"}"#;

        assert_eq!(find_client_id(js), Some("AbC123xyz"));
        assert_eq!(find_client_id("var x = 1;"), None);
    }
}
