//! Caption track selection and WebVTT transcript extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One downloadable rendition of a caption track, as listed by yt-dlp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionFormat {
    /// File extension (vtt, srv3, json3, ...).
    #[serde(default)]
    pub ext: Option<String>,
    /// Download URL.
    #[serde(default)]
    pub url: String,
}

/// Caption tracks keyed by language code.
pub type CaptionTracks = BTreeMap<String, Vec<CaptionFormat>>;

/// The caption track chosen for a video.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionChoice {
    pub language: String,
    pub url: String,
    /// True when the track comes from automatic captions.
    pub automatic: bool,
}

/// Choose a caption track.
///
/// Manually authored subtitles win over automatic captions whenever any exist.
/// Within the chosen set, the first of `preferred` languages that is present
/// is used (an exact code first, then a regional variant such as `en-GB` for
/// `en`); failing that, the alphabetically first language. The `vtt` rendition
/// is taken when offered, otherwise the first listed one.
pub fn select_track(
    subtitles: &CaptionTracks,
    automatic: &CaptionTracks,
    preferred: &[String],
) -> Option<CaptionChoice> {
    let (tracks, is_automatic) = if has_usable_track(subtitles) {
        (subtitles, false)
    } else {
        (automatic, true)
    };

    let language = pick_language(tracks, preferred)?;
    let formats = tracks.get(language)?;
    let format = formats
        .iter()
        .filter(|f| !f.url.is_empty())
        .find(|f| f.ext.as_deref().is_some_and(|e| e.eq_ignore_ascii_case("vtt")))
        .or_else(|| formats.iter().find(|f| !f.url.is_empty()))?;

    Some(CaptionChoice {
        language: language.clone(),
        url: format.url.clone(),
        automatic: is_automatic,
    })
}

fn has_usable_track(tracks: &CaptionTracks) -> bool {
    tracks
        .values()
        .any(|formats| formats.iter().any(|f| !f.url.is_empty()))
}

fn pick_language<'a>(tracks: &'a CaptionTracks, preferred: &[String]) -> Option<&'a String> {
    let usable = |lang: &&String| {
        tracks
            .get(*lang)
            .is_some_and(|formats| formats.iter().any(|f| !f.url.is_empty()))
    };

    for wanted in preferred {
        if let Some(exact) = tracks.keys().filter(usable).find(|l| l.eq_ignore_ascii_case(wanted)) {
            return Some(exact);
        }
        let prefix = format!("{}-", wanted.to_lowercase());
        if let Some(regional) = tracks
            .keys()
            .filter(usable)
            .find(|l| l.to_lowercase().starts_with(&prefix))
        {
            return Some(regional);
        }
    }

    // BTreeMap keys iterate in sorted order
    tracks.keys().find(usable)
}

/// Whether a caption payload is WebVTT, judged by its first few characters.
pub fn is_webvtt(payload: &str) -> bool {
    let head: String = payload.chars().take(10).collect();
    head.contains("WEBVTT")
}

/// Flatten a WebVTT payload into plain text.
///
/// Blank lines, cue timing lines (`-->`) and the `WEBVTT` header line are
/// dropped; every other line is trimmed and the lines are joined with single
/// spaces in their original order.
pub fn extract_transcript(payload: &str) -> String {
    payload
        .lines()
        .filter(|line| {
            !line.trim().is_empty()
                && !line.contains("-->")
                && !line.to_lowercase().starts_with("webvtt")
        })
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}
