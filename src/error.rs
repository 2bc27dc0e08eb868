use std::{io, path::PathBuf};

use thiserror::Error;

/// Form-body Error
#[derive(Debug, Error)]
pub enum Error {
    /// IO Error while reading the input source
    #[error(transparent)]
    Stream(#[from] io::Error),

    /// Files too many
    #[error("uploaded files are too many, limit to `{0}`")]
    MaxFiles(usize),

    /// File too large
    #[error("file `{filename}` is too large, limit to `{limit}`")]
    MaxFileSize {
        /// The declared filename of the rejected part
        filename: String,
        /// The configured per-file limit
        limit: u64,
    },

    /// Non-file body bytes too large
    #[error("body is too large, limit to `{0}`")]
    MaxBodySize(u64),

    /// A file part arrived while uploads are disabled
    #[error("file uploads are disabled")]
    FilesUpload,

    /// Storage failure while creating, writing or removing a spool file
    #[error("failed to spool file `{filename}` at `{}`: {source}", .path.display())]
    FileSpool {
        /// The declared filename of the part
        filename: String,
        /// The temporary file path
        path: PathBuf,
        /// The underlying storage error
        #[source]
        source: io::Error,
    },

    /// Invalid url-encoded pair
    #[error("malformed url-encoded pair `{0}`")]
    MalformedBody(String),

    /// Multipart content type without a boundary parameter
    #[error("multipart content type has no boundary")]
    MissingBoundary,
}
