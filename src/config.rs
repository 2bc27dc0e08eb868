use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Text encoding used for non-file field values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum Charset {
    /// UTF-8, invalid sequences are replaced with `U+FFFD`.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8", alias = "UTF-8")]
    Utf8,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    #[serde(rename = "iso-8859-1", alias = "latin1", alias = "ISO-8859-1")]
    Latin1,
}

impl Charset {
    /// Decodes bytes into text.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Settings and quotas for one decode operation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Encoding of non-file field values
    pub encoding: Charset,
    /// Whether file parts are accepted
    pub files_upload_on: bool,
    /// Directory where uploaded files are spooled
    pub uploaded_files_dir: PathBuf,
    /// Max number of file parts
    pub max_uploaded_files: usize,
    /// Max size of a single file
    pub max_file_size: u64,
    /// Max number of non-file body bytes
    pub max_content_length: u64,
    /// Prefix of spooled file names
    pub uploaded_file_prefix: String,
    /// Bytes requested per read from the input source
    pub read_block_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: Charset::default(),
            files_upload_on: true,
            uploaded_files_dir: env::temp_dir(),
            max_uploaded_files: Self::DEFAULT_MAX_UPLOADED_FILES,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            max_content_length: Self::DEFAULT_MAX_CONTENT_LENGTH,
            uploaded_file_prefix: Self::DEFAULT_UPLOADED_FILE_PREFIX.to_string(),
            read_block_size: Self::DEFAULT_READ_BLOCK_SIZE,
        }
    }
}

impl Config {
    /// Max number of uploaded files, defaults to 20.
    pub const DEFAULT_MAX_UPLOADED_FILES: usize = 20;

    /// Max size of a single file, defaults to 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Max number of non-file body bytes, defaults to 8MB.
    pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 8 * 1024 * 1024;

    /// Prefix of spooled file names, defaults to `upload_`.
    pub const DEFAULT_UPLOADED_FILE_PREFIX: &'static str = "upload_";

    /// Bytes per read, defaults to 8KB.
    pub const DEFAULT_READ_BLOCK_SIZE: usize = 8 * 1024;

    /// Encoding of non-file field values
    #[must_use]
    pub fn encoding(mut self, encoding: Charset) -> Self {
        self.encoding = encoding;
        self
    }

    /// Accepts or rejects file parts
    #[must_use]
    pub fn files_upload_on(mut self, on: bool) -> Self {
        self.files_upload_on = on;
        self
    }

    /// Directory where uploaded files are spooled
    #[must_use]
    pub fn uploaded_files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploaded_files_dir = dir.into();
        self
    }

    /// Max number of file parts
    #[must_use]
    pub fn max_uploaded_files(mut self, max: usize) -> Self {
        self.max_uploaded_files = max;
        self
    }

    /// Max size of a single file
    #[must_use]
    pub fn max_file_size(mut self, max: u64) -> Self {
        self.max_file_size = max;
        self
    }

    /// Max number of non-file body bytes
    #[must_use]
    pub fn max_content_length(mut self, max: u64) -> Self {
        self.max_content_length = max;
        self
    }

    /// Prefix of spooled file names
    #[must_use]
    pub fn uploaded_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.uploaded_file_prefix = prefix.into();
        self
    }

    /// Bytes requested per read
    ///
    /// # Panics
    ///
    /// If `size` is zero.
    #[must_use]
    pub fn read_block_size(mut self, size: usize) -> Self {
        assert!(size > 0, "The read_block_size cannot be zero.");

        self.read_block_size = size;
        self
    }

    /// Check number of files
    #[must_use]
    pub fn checked_files(&self, rhs: usize) -> Option<usize> {
        Some(self.max_uploaded_files).filter(|max| rhs > *max)
    }

    /// Check file size
    #[must_use]
    pub fn checked_file_size(&self, rhs: u64) -> Option<u64> {
        Some(self.max_file_size).filter(|max| rhs > *max)
    }

    /// Check non-file body size
    #[must_use]
    pub fn checked_content_length(&self, rhs: u64) -> Option<u64> {
        Some(self.max_content_length).filter(|max| rhs > *max)
    }
}
