// ── Camera frame domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which camera feed a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VideoKind {
    /// Unannotated thermal camera frames.
    Raw,
    /// Frames annotated by the fire detector.
    Detection,
}

impl VideoKind {
    /// Folder segment of `/video/latest/{folder}`.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Raw => "thermal",
            Self::Detection => "fire",
        }
    }
}

/// Latest stored image of one camera feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFrame {
    pub kind: VideoKind,
    pub url: String,
    pub name: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub size_bytes: Option<u32>,
}
