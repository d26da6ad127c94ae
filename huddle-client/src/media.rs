use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a media stream: one logical source such as a camera or a
/// shared screen.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub String);

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Classification of an inbound stream: the first distinct stream a peer
/// announces is its camera feed, every later one is a shared screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Screen,
}

/// Immutable snapshot of a local track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: TrackId,
    pub kind: TrackKind,
    /// Whether the source is currently producing media. A disabled audio
    /// track means the user is muted.
    pub enabled: bool,
}

impl LocalTrack {
    pub fn audio(id: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            kind: TrackKind::Audio,
            enabled: true,
        }
    }

    pub fn video(id: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            kind: TrackKind::Video,
            enabled: true,
        }
    }
}

/// Immutable snapshot of a local media stream. The session owns the
/// canonical copy; engines only ever see clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    pub id: StreamId,
    pub tracks: Vec<LocalTrack>,
}

impl LocalStream {
    pub fn new(id: impl Into<StreamId>, tracks: Vec<LocalTrack>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn audio_muted(&self) -> bool {
        self.tracks
            .iter()
            .any(|track| track.kind == TrackKind::Audio && !track.enabled)
    }
}
