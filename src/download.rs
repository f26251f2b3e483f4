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

//! Offline copies of liked tracks.
//!
//! Every liked track whose id is not already present in the local library is
//! downloaded with `ffmpeg` into that library. Downloaded files are named
//! `<artist>_<title>_<id>.mp3`; the trailing id is how a later run recognises
//! a track it already has, whatever directory the file has since been moved
//! to within the library.
//!
//! Downloads run on a fixed pool of worker threads fed from a channel.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::{
        Arc, LazyLock, Mutex,
        mpsc::{self, Receiver},
    },
    thread,
};

use anyhow::{Context, Result, bail};
use regex::Regex;
use walkdir::WalkDir;

use crate::{
    api::StreamResolver,
    error::PlayerResult,
    model::{Track, TrackId},
};

const WORKER_COUNT: usize = 5;

static TRACK_ID_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([0-9]+)\.mp3$").expect("valid track id pattern"));

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").expect("valid separator pattern"));

/// Copies a stream URL to a local file.
pub(crate) type Fetch = fn(url: &str, output: &Path) -> Result<()>;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DownloadSummary {
    pub(crate) downloaded: usize,
    pub(crate) failed: usize,
    pub(crate) skipped: usize,
}

/// Ids of every track already in the library, taken from `_<id>.mp3` file
/// name suffixes anywhere below `root`.
pub(crate) fn scan_library(root: &Path) -> HashSet<TrackId> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_owned();
            let captures = TRACK_ID_SUFFIX.captures(&name)?;
            captures[1].parse().ok()
        })
        .collect()
}

/// Lower-cases `s` and collapses every run of non-word characters into a
/// single underscore.
pub(crate) fn sanitise(s: &str) -> String {
    NON_WORD
        .replace_all(&s.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

/// Library file name for `track`. The artist is left out when the title
/// already contains it, as it often does for reposted mixes.
pub(crate) fn file_name(track: &Track) -> String {
    let title = sanitise(&track.title);
    let artist = sanitise(&track.artist);

    if artist.is_empty() || title.contains(&artist) {
        format!("{}_{}.mp3", title, track.id)
    } else {
        format!("{}_{}_{}.mp3", artist, title, track.id)
    }
}

/// Downloads every track from `likes` that is not already in `library`.
///
/// Tracks are queued as they are paged in, so downloads start before the
/// whole likes collection has been listed.
///
/// # Errors
///
/// Returns an error if the library directory cannot be created. A failure to
/// list the likes stops queueing but lets queued downloads finish, and is
/// then returned. Individual download failures are only counted.
pub(crate) fn download_likes<I>(
    likes: I,
    library: &Path,
    resolver: Arc<dyn StreamResolver>,
    fetch: Fetch,
) -> Result<DownloadSummary>
where
    I: Iterator<Item = PlayerResult<Track>>,
{
    fs::create_dir_all(library).with_context(|| format!("Failed to create {}", library.display()))?;

    let existing = scan_library(library);
    tracing::info!(library = %library.display(), existing = existing.len(), "scanned local library");

    let (job_tx, job_rx) = mpsc::channel::<Track>();
    let job_rx = Arc::new(Mutex::new(job_rx));

    let workers: Vec<_> = (0..WORKER_COUNT)
        .map(|_| {
            let job_rx = job_rx.clone();
            let resolver = resolver.clone();
            let library = library.to_path_buf();
            thread::spawn(move || run_worker(&job_rx, resolver.as_ref(), &library, fetch))
        })
        .collect();

    let mut summary = DownloadSummary::default();
    let mut listing_error = None;

    for track in likes {
        match track {
            Ok(track) if existing.contains(&track.id) => summary.skipped += 1,
            Ok(track) => {
                if job_tx.send(track).is_err() {
                    break;
                }
            }
            Err(e) => {
                listing_error = Some(e);
                break;
            }
        }
    }

    // Closing the channel lets the workers drain the queue and exit.
    drop(job_tx);

    for worker in workers {
        let (downloaded, failed) = worker.join().unwrap_or((0, 1));
        summary.downloaded += downloaded;
        summary.failed += failed;
    }

    tracing::info!(?summary, "download finished");

    match listing_error {
        Some(e) => Err(e).context("Failed to list liked tracks"),
        None => Ok(summary),
    }
}

/// Takes jobs until the queue is closed. Returns (downloaded, failed).
fn run_worker(jobs: &Mutex<Receiver<Track>>, resolver: &dyn StreamResolver, library: &Path, fetch: Fetch) -> (usize, usize) {
    let mut downloaded = 0;
    let mut failed = 0;

    loop {
        let job = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(track) = job else {
            break;
        };

        match download_track(&track, resolver, library, fetch) {
            Ok(path) => {
                println!("Downloaded {}", path.display());
                downloaded += 1;
            }
            Err(e) => {
                tracing::warn!(track_id = track.id, error = ?e, "download failed");
                eprintln!("Failed to download {}: {:#}", track, e);
                failed += 1;
            }
        }
    }

    (downloaded, failed)
}

fn download_track(track: &Track, resolver: &dyn StreamResolver, library: &Path, fetch: Fetch) -> Result<PathBuf> {
    let url = resolver.resolve(track.id)?;

    // Written under a name the library scan does not recognise, then moved
    // into place, so an interrupted download is retried on the next run.
    let partial = library.join(format!(".scplay-{}.partial.mp3", track.id));
    let output = library.join(file_name(track));

    if let Err(e) = fetch(&url, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, &output).with_context(|| format!("Failed to move download to {}", output.display()))?;
    Ok(output)
}

/// Stream copy of `url` into `output` using the `ffmpeg` binary.
pub(crate) fn ffmpeg_fetch(url: &str, output: &Path) -> Result<()> {
    let result = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-i", url, "-c", "copy"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .context("Failed to run ffmpeg, is it installed?")?;

    if !result.status.success() {
        bail!(
            "ffmpeg exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;

    struct EchoResolver;

    impl StreamResolver for EchoResolver {
        fn resolve(&self, track_id: TrackId) -> PlayerResult<String> {
            if track_id == 13 {
                return Err(PlayerError::Resolution {
                    track_id,
                    reason: "no usable transcoding found".to_string(),
                });
            }
            Ok(format!("https://cdn/{}", track_id))
        }
    }

    fn write_url(url: &str, output: &Path) -> Result<()> {
        fs::write(output, url)?;
        Ok(())
    }

    fn broken_fetch(_url: &str, output: &Path) -> Result<()> {
        fs::write(output, "half a file")?;
        bail!("connection reset")
    }

    #[test]
    fn scan_finds_id_suffixes_in_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("old")).unwrap();
        fs::write(dir.path().join("artist_song_123.mp3"), "").unwrap();
        fs::write(dir.path().join("old").join("mix_456.mp3"), "").unwrap();
        fs::write(dir.path().join("notes_789.txt"), "").unwrap();
        fs::write(dir.path().join("no_id.mp3"), "").unwrap();
        fs::write(dir.path().join(".scplay-5.partial.mp3"), "").unwrap();

        assert_eq!(scan_library(dir.path()), HashSet::from([123, 456]));
    }

    #[test]
    fn sanitise_collapses_punctuation() {
        assert_eq!(sanitise("DJ Foo - Live @ The Bar!"), "dj_foo_live_the_bar");
        assert_eq!(sanitise("  --  "), "");
    }

    #[test]
    fn file_name_drops_an_artist_repeated_in_the_title() {
        assert_eq!(file_name(&Track::new(7, "Boiler Room: Bicep", "Bicep")), "boiler_room_bicep_7.mp3");
        assert_eq!(file_name(&Track::new(8, "Glue", "Bicep")), "bicep_glue_8.mp3");
    }

    #[test]
    fn file_names_are_recognised_by_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let track = Track::new(99, "Song (Extended Mix)", "Someone");
        fs::write(dir.path().join(file_name(&track)), "").unwrap();

        assert!(scan_library(dir.path()).contains(&99));
    }

    #[test]
    fn only_missing_tracks_are_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a_one_1.mp3"), "").unwrap();

        let likes = vec![
            Ok(Track::new(1, "one", "a")),
            Ok(Track::new(2, "two", "b")),
            Ok(Track::new(3, "three", "c")),
        ];

        let summary = download_likes(likes.into_iter(), dir.path(), Arc::new(EchoResolver), write_url).unwrap();

        assert_eq!(
            summary,
            DownloadSummary {
                downloaded: 2,
                failed: 0,
                skipped: 1
            }
        );
        assert_eq!(fs::read_to_string(dir.path().join("b_two_2.mp3")).unwrap(), "https://cdn/2");
        assert_eq!(scan_library(dir.path()), HashSet::from([1, 2, 3]));
    }

    #[test]
    fn failures_are_counted_and_leave_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let likes = vec![Ok(Track::new(13, "unlucky", "x")), Ok(Track::new(14, "fine", "y"))];

        let summary = download_likes(likes.into_iter(), dir.path(), Arc::new(EchoResolver), broken_fetch).unwrap();

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn listing_failure_is_reported_after_queued_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let likes = vec![
            Ok(Track::new(1, "one", "a")),
            Err(PlayerError::RemoteFetch {
                endpoint: "users/1/likes".to_string(),
                status: Some(503),
                reason: "Service Unavailable".to_string(),
            }),
        ];

        let result = download_likes(likes.into_iter(), dir.path(), Arc::new(EchoResolver), write_url);

        assert!(result.is_err());
        assert!(dir.path().join("a_one_1.mp3").exists());
    }
}
