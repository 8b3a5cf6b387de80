//! Output metadata via ffprobe, for the note attached to a result.

use std::{path::Path, process::Stdio};

use {serde::Deserialize, tokio::process::Command, tracing::debug};

/// Size and, for visual media, pixel dimensions of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    pub size_bytes: u64,
    pub dimensions: Option<(u32, u32)>,
}

impl MediaInfo {
    /// `2.41 MB · 1280x720`, or just the size for audio.
    pub fn summary(&self) -> String {
        let mb = self.size_bytes as f64 / (1024.0 * 1024.0);
        match self.dimensions {
            Some((w, h)) => format!("{mb:.2} MB · {w}x{h}"),
            None => format!("{mb:.2} MB"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_dimensions(json: &[u8]) -> Option<(u32, u32)> {
    let parsed: ProbeOutput = serde_json::from_slice(json).ok()?;
    parsed
        .streams
        .into_iter()
        .find_map(|s| Some((s.width?, s.height?)))
        .filter(|&(w, h)| w > 0 && h > 0)
}

/// Best-effort metadata. Returns `None` if the file is unreadable; a missing
/// or failing ffprobe only drops the dimensions.
pub async fn probe(ffprobe: Option<&Path>, path: &Path) -> Option<MediaInfo> {
    let size_bytes = tokio::fs::metadata(path).await.ok()?.len();
    let dimensions = match ffprobe {
        Some(tool) => dimensions(tool, path).await,
        None => None,
    };
    Some(MediaInfo {
        size_bytes,
        dimensions,
    })
}

async fn dimensions(tool: &Path, path: &Path) -> Option<(u32, u32)> {
    let out = Command::new(tool)
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await;
    match out {
        Ok(out) if out.status.success() => parse_dimensions(&out.stdout),
        Ok(out) => {
            debug!(status = %out.status, "ffprobe failed");
            None
        },
        Err(e) => {
            debug!(error = %e, "ffprobe unavailable");
            None
        },
    }
}
