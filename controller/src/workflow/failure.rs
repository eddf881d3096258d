use std::path::PathBuf;
use tcucore::{CodecError, HeaderError, Mismatch};

/// Workflow failures that map onto the controller's documented exit codes.
#[derive(thiserror::Error, Debug)]
pub enum Failure {
    #[error("header file {0} not found")]
    HeaderNotFound(PathBuf),
    #[error("header file {path}: {source}")]
    HeaderInvalid {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
    #[error("invalid TCU parameters: {0}")]
    Parameters(#[from] CodecError),
    #[error("device session failed: {0:#}")]
    Session(anyhow::Error),
    #[error("{} register(s) read back differently than written", .0.len())]
    Mismatch(Vec<Mismatch>),
}

impl Failure {
    pub fn exit_code(&self) -> u8 {
        match self {
            Failure::HeaderNotFound(_) => 64,
            Failure::HeaderInvalid { .. } | Failure::Parameters(_) => 65,
            Failure::Session(_) => 66,
            Failure::Mismatch(_) => 67,
        }
    }
}
