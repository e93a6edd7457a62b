use super::codec::CodecError;
use crate::core::descriptor::codec::ResiduePairDescriptor;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No index manifest found at '{0}'")]
    NotFound(PathBuf),

    #[error("Invalid index manifest '{path}': {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize index manifest: {0}")]
    ManifestSerialize(#[from] toml::ser::Error),

    #[error("Inconsistent index manifest: {0}")]
    Manifest(String),

    #[error("Corrupt bucket for descriptor {descriptor} at '{path}': {source}")]
    Codec {
        descriptor: ResiduePairDescriptor,
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    #[error("Index was built with {setting} = {stored}, but {requested} was requested")]
    SettingsMismatch {
        setting: &'static str,
        stored: String,
        requested: String,
    },

    #[error("Unsupported index format version {0}")]
    UnsupportedVersion(u32),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> IndexError {
        let path = path.into();
        move |source| IndexError::Io { path, source }
    }
}
