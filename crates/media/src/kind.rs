use std::{fmt, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    trp_channels::MediaRef,
};

use crate::{Error, Result};

/// Media family a command operates on. Picks both the action set and the
/// accepted input extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    pub const ALL: [Self; 3] = [Self::Video, Self::Audio, Self::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }

    /// Accepted input extensions, lower-case with the leading dot.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Video => &[".mp4", ".mov", ".webm", ".avi"],
            Self::Audio => &[".mp3", ".wav"],
            Self::Image => &[".jpg", ".jpeg", ".png", ".bmp", ".gif"],
        }
    }

    /// Container every output of this kind is written as, whatever the input.
    pub fn output_extension(self) -> &'static str {
        match self {
            Self::Video => ".mp4",
            Self::Audio => ".mp3",
            Self::Image => ".png",
        }
    }

    /// Check the file's extension against this kind. Filename suffix only,
    /// no content sniffing.
    pub fn check_extension(self, media: &MediaRef) -> Result<String> {
        let allowed = self.accepted_extensions();
        match media.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => Ok(ext),
            _ => Err(Error::invalid_input(format!(
                "Invalid file type for {self}. Please upload a valid {self} file ({}).",
                allowed.join(", ")
            ))),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Unknown media kind `{s}`. Use one of: video, audio, image."
                ))
            })
    }
}
