//! Streaming attachment download with a hard byte cap.

use std::path::Path;

use {futures::StreamExt, tokio::io::AsyncWriteExt, tracing::debug};

use crate::error::{Error, Result};

/// Stream `url` into `dest`. Stops and fails as soon as more than
/// `max_bytes` arrive; the caller removes whatever was written.
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    max_bytes: u64,
) -> Result<u64> {
    let response = client.get(url).send().await?.error_for_status()?;
    if response.content_length().is_some_and(|len| len > max_bytes) {
        return Err(Error::TooLarge { limit: max_bytes });
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(Error::TooLarge { limit: max_bytes });
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    debug!(path = %dest.display(), written, "attachment downloaded");
    Ok(written)
}
