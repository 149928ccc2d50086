//! Errors raised while generating job scripts
//!
//! Three families of failure exist: configuration errors (detected before generation starts),
//! graph construction errors (always a logic defect in a processor) and I/O or rendering errors
//! (fatal for the dataset being generated). None of them are retried.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::job::artifact::ArtifactKey;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("artifact {key} already has a producer ({job}), refusing to register {duplicate}")]
    DuplicateProducer { key: ArtifactKey, job: String, duplicate: String },
    #[error("no job produces artifact {0}")]
    MissingProducer(ArtifactKey),
    #[error("job name {0} is used more than once")]
    DuplicateJob(String),
    #[error("can't order jobs, unresolved dependencies: {0:?}")]
    UnorderedJobs(Vec<String>),
    #[error("can't write {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("can't render {template} template: {source}")]
    Render { template: &'static str, source: tinytemplate::error::Error },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
