use std::collections::HashMap;

use tracing::debug;

use crate::{Config, Error, Result};

/// Running counters of one decode call, checked against a [`Config`].
///
/// Every check happens before the bytes are accepted, so a request is
/// rejected as soon as it crosses a ceiling instead of after buffering.
#[derive(Debug)]
pub struct QuotaTracker<'a> {
    config: &'a Config,
    files: usize,
    file_bytes: HashMap<usize, u64>,
    body_bytes: u64,
}

impl<'a> QuotaTracker<'a> {
    /// Creates new counters for the limits of `config`.
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            files: 0,
            file_bytes: HashMap::new(),
            body_bytes: 0,
        }
    }

    /// Counts a new file part.
    pub fn register_file_start(&mut self) -> Result<()> {
        let files = self.files + 1;
        if let Some(max) = self.config.checked_files(files) {
            debug!(files, limit = max, "too many files");
            return Err(Error::MaxFiles(max));
        }
        self.files = files;
        Ok(())
    }

    /// Counts `n` bytes of the file part `part`.
    pub fn add_file_bytes(&mut self, part: usize, filename: &str, n: u64) -> Result<()> {
        let written = self.file_bytes.entry(part).or_default();
        let total = *written + n;
        if let Some(max) = self.config.checked_file_size(total) {
            debug!(part, total, limit = max, "file is too large");
            return Err(Error::MaxFileSize {
                filename: filename.to_string(),
                limit: max,
            });
        }
        *written = total;
        Ok(())
    }

    /// Counts `n` non-file body bytes.
    pub fn add_body_bytes(&mut self, n: u64) -> Result<()> {
        let total = self.body_bytes + n;
        if let Some(max) = self.config.checked_content_length(total) {
            debug!(total, limit = max, "body is too large");
            return Err(Error::MaxBodySize(max));
        }
        self.body_bytes = total;
        Ok(())
    }

    /// Number of file parts seen.
    #[must_use]
    pub fn files(&self) -> usize {
        self.files
    }

    /// Bytes accepted for the file part `part`.
    #[must_use]
    pub fn file_bytes(&self, part: usize) -> u64 {
        self.file_bytes.get(&part).copied().unwrap_or_default()
    }

    /// Non-file body bytes accepted.
    #[must_use]
    pub fn body_bytes(&self) -> u64 {
        self.body_bytes
    }
}
