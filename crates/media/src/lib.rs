//! Media edit pipeline: locate the target file, stage it, run one ffmpeg
//! preset on it, reply with the result and clean up.

pub mod catalog;
pub mod edit;
pub mod error;
pub mod kind;
pub mod locator;
pub mod probe;
pub mod runner;
pub mod staging;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    catalog::{ActionSpec, Param, PreparedAction},
    edit::{EditRequest, EditService},
    error::{Error, Result},
    kind::MediaKind,
    runner::{JobOutcome, JobResult, JobRunner, JobState},
    staging::{StagedFile, StagingStore},
};
