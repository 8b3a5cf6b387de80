//! Ephemeral scratch storage for job inputs and outputs.
//!
//! Every path is a fresh UUIDv4 name inside one scratch directory, so
//! concurrent jobs never contend for a file. Nothing here locks.

use std::{
    io,
    path::{Path, PathBuf},
};

use {
    tracing::{debug, warn},
    trp_channels::{CommandContext, MediaRef},
    uuid::Uuid,
};

use crate::{Error, Result, kind::MediaKind};

/// A downloaded input owned by exactly one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub kind: MediaKind,
    /// Original extension, lower-case with the leading dot.
    pub extension: String,
}

/// The scratch directory.
#[derive(Debug, Clone)]
pub struct StagingStore {
    root: PathBuf,
}

impl StagingStore {
    /// Open the scratch directory, creating it if absent.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        debug!(path = %root.display(), "scratch directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fresh_path(&self, extension: &str) -> PathBuf {
        self.root.join(format!("{}{extension}", Uuid::new_v4()))
    }

    /// Reserve a fresh path with the kind's output container extension.
    /// Nothing is created on disk.
    pub fn allocate_output(&self, kind: MediaKind) -> PathBuf {
        self.fresh_path(kind.output_extension())
    }

    /// Download `media` to a fresh path, keeping its extension.
    ///
    /// On failure the partial file is removed before returning.
    pub async fn stage(
        &self,
        ctx: &dyn CommandContext,
        media: &MediaRef,
        kind: MediaKind,
        max_bytes: u64,
    ) -> Result<StagedFile> {
        let extension = kind.check_extension(media)?;
        let path = self.fresh_path(&extension);
        match ctx.download(media, &path, max_bytes).await {
            Ok(written) => {
                debug!(path = %path.display(), written, "staged input");
                Ok(StagedFile {
                    path,
                    kind,
                    extension,
                })
            },
            Err(e) => {
                release(&[&path]);
                Err(Error::staging(
                    format!("failed to download {}", media.filename),
                    e,
                ))
            },
        }
    }

    /// Start a scope that owns every path it hands out and deletes them
    /// when it ends.
    pub fn scope(&self) -> JobScratch<'_> {
        JobScratch {
            store: self,
            paths: Vec::new(),
        }
    }
}

/// Delete every given path that exists. Errors are logged and swallowed;
/// missing files are not errors, so releasing twice is harmless.
pub fn release<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "released scratch file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {},
            Err(e) => warn!(path = %path.display(), error = %e, "failed to release scratch file"),
        }
    }
}

/// Paths acquired by one job. Released on [`JobScratch::release`] or drop,
/// whichever comes first.
#[derive(Debug)]
pub struct JobScratch<'a> {
    store: &'a StagingStore,
    paths: Vec<PathBuf>,
}

impl JobScratch<'_> {
    /// Stage `media` and track its path.
    pub async fn stage(
        &mut self,
        ctx: &dyn CommandContext,
        media: &MediaRef,
        kind: MediaKind,
        max_bytes: u64,
    ) -> Result<StagedFile> {
        let staged = self.store.stage(ctx, media, kind, max_bytes).await?;
        self.paths.push(staged.path.clone());
        Ok(staged)
    }

    /// Reserve and track an output path.
    pub fn allocate_output(&mut self, kind: MediaKind) -> PathBuf {
        let path = self.store.allocate_output(kind);
        self.paths.push(path.clone());
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn release(mut self) {
        release(&std::mem::take(&mut self.paths));
    }
}

impl Drop for JobScratch<'_> {
    fn drop(&mut self) {
        if !self.paths.is_empty() {
            release(&std::mem::take(&mut self.paths));
        }
    }
}
