use crate::types::GrabError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use timecode::Timecode;
use url::Url;

/// Longest directory name we will derive from a video title.
const MAX_TITLE_LEN: usize = 80;

/// Turn a video title into a safe directory name: no path separators,
/// no control characters, no surrounding whitespace, bounded length.
/// Falls back to "video" when nothing usable remains.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = sanitize_filename::sanitize(title);
    let cleaned: String = cleaned
        .chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_TITLE_LEN)
        .collect();
    // Leading dots would produce hidden directories.
    let cleaned = cleaned.trim_matches(|c| c == '_' || c == '.');
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Extract the start hint from a `t=` (or `start=`) query parameter.
/// Absent hints are `None`; a present but malformed hint is an error.
pub fn start_hint_from_url(url: &Url) -> Result<Option<Timecode>, GrabError> {
    let hint = url
        .query_pairs()
        .find(|(key, _)| key == "t")
        .or_else(|| url.query_pairs().find(|(key, _)| key == "start"));
    match hint {
        Some((_, value)) => value.parse().map(Some).map_err(GrabError::from),
        None => Ok(None),
    }
}

/// Resolve the start of the burst: explicit value first, then the URL
/// hint, then zero.
pub fn resolve_start(url: &Url, explicit: Option<Timecode>) -> Result<Timecode, GrabError> {
    match explicit {
        Some(start) => Ok(start),
        None => Ok(start_hint_from_url(url)?.unwrap_or(Timecode::ZERO)),
    }
}

/// Stable, URL-derived stem for the downloaded video file, so an
/// explicitly reused output directory never mixes up sources.
pub fn video_stem(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    let hash = hex::encode(&hasher.finalize()[..8]);
    format!("source-{hash}")
}

/// Allocates frame filenames within one run. The first frame landing in
/// an integer second gets `<prefix><HH-MM-SS>.png`; later frames in the
/// same second get `.1`, `.2`, ... in capture order, so nothing is
/// silently overwritten.
#[derive(Default)]
pub struct FrameNamer {
    seen: HashMap<String, u32>,
}

impl FrameNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, prefix: &str, at: Timecode) -> String {
        let slug = at.hms_slug();
        let n = self
            .seen
            .entry(slug.clone())
            .and_modify(|n| *n += 1)
            .or_insert(0);
        match *n {
            0 => format!("{prefix}{slug}.png"),
            n => format!("{prefix}{slug}.{n}.png"),
        }
    }
}
