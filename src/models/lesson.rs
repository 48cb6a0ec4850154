use serde::{Deserialize, Serialize};
use url::Url;

use super::{Checkpoint, VideoId};
use crate::utils::errors::PlayerError;

/// `videoType` value marking a lesson hosted by the embedded third-party player.
pub const EMBEDDED_VIDEO_TYPE: &str = "YOUTUBE";

const EMBEDDED_ID_LEN: usize = 11;

/// Lesson record as served by the lesson endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: VideoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub video_type: Option<String>,
    #[serde(default)]
    pub duration: f64,
    /// Some endpoints embed the checkpoint list; the session always uses the
    /// dedicated checkpoint fetch.
    #[serde(default)]
    pub quizzes: Vec<Checkpoint>,
}

/// Where the playable media lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// A directly playable media URL.
    Direct { url: Url },
    /// A video id understood by the embedded third-party player.
    Embedded { video_id: String },
}

/// Last known position for the current learner and video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePoint {
    #[serde(default)]
    pub current_time: f64,
    #[serde(default)]
    pub completed: bool,
}

impl Lesson {
    /// Resolve the lesson's media source. Relative direct URLs (locally stored
    /// uploads) are joined onto `base`.
    pub fn media_source(&self, base: Option<&Url>) -> Result<MediaSource, PlayerError> {
        MediaSource::resolve(self.video_type.as_deref(), &self.url, base)
    }
}

impl MediaSource {
    pub fn resolve(
        video_type: Option<&str>,
        url: &str,
        base: Option<&Url>,
    ) -> Result<Self, PlayerError> {
        let is_embedded =
            video_type.is_some_and(|t| t.eq_ignore_ascii_case(EMBEDDED_VIDEO_TYPE));

        if is_embedded {
            let video_id = extract_embedded_id(url).ok_or_else(|| {
                PlayerError::InvalidSource(format!("not an embedded video id: {}", url))
            })?;
            return Ok(MediaSource::Embedded { video_id });
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = base.ok_or_else(|| {
                    PlayerError::InvalidSource(format!("relative media url without base: {}", url))
                })?;
                base.join(url)
                    .map_err(|e| PlayerError::InvalidSource(format!("{}: {}", url, e)))?
            }
            Err(e) => return Err(PlayerError::InvalidSource(format!("{}: {}", url, e))),
        };

        Ok(MediaSource::Direct { url: parsed })
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, MediaSource::Embedded { .. })
    }
}

fn looks_like_embedded_id(candidate: &str) -> bool {
    candidate.len() == EMBEDDED_ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Accepts a bare id or the usual watch / short-link / embed / shorts URLs.
pub fn extract_embedded_id(input: &str) -> Option<String> {
    let input = input.trim();
    if looks_like_embedded_id(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") | Some("shorts") | Some("live") | Some("v") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    looks_like_embedded_id(&candidate).then_some(candidate)
}
