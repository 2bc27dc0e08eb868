use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process,
    time::{SystemTime, UNIX_EPOCH},
};

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::{Config, Error, Result};

/// Temporary file of one uploaded part.
///
/// The file is created on the first write, so a part without payload never
/// touches the disk unless [`FileSpool::persist`] asks for it. Discarding an
/// unopened spool is dropping it.
pub(crate) struct FileSpool {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    length: u64,
}

impl FileSpool {
    /// Picks a fresh path under `uploaded_files_dir` for the part `index`.
    pub(crate) fn new(config: &Config, index: usize) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());

        let mut hasher = Sha256::new();
        hasher.update(nanos.to_le_bytes());
        hasher.update(rand::random::<u64>().to_le_bytes());
        hasher.update(process::id().to_le_bytes());
        hasher.update(index.to_le_bytes());

        let name = format!(
            "{}{}",
            config.uploaded_file_prefix,
            hex::encode(hasher.finalize())
        );

        Self {
            path: config.uploaded_files_dir.join(name),
            writer: None,
            length: 0,
        }
    }

    /// Gets the path of the temporary file.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the temporary file exists on disk.
    pub(crate) fn is_opened(&self) -> bool {
        self.writer.is_some()
    }

    /// Appends bytes, creating the file first if needed.
    pub(crate) fn write(&mut self, filename: &str, buf: &[u8]) -> Result<()> {
        if self.writer.is_none() {
            let writer = open(&self.path).map_err(|e| spool_error(filename, &self.path, e))?;
            debug!(path = %self.path.display(), "spool file created");
            self.writer = Some(writer);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer
                .write_all(buf)
                .map_err(|e| spool_error(filename, &self.path, e))?;
            self.length += buf.len() as u64;
        }

        trace!("spooled bytes {}/{}", buf.len(), self.length);
        Ok(())
    }

    /// Flushes and closes the file, creating an empty one if nothing was
    /// written. Returns the path, now owned by the caller.
    pub(crate) fn persist(mut self, filename: &str) -> Result<PathBuf> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => open(&self.path).map_err(|e| spool_error(filename, &self.path, e))?,
        };

        writer
            .into_inner()
            .map(drop)
            .map_err(io::IntoInnerError::into_error)
            .map_err(|e| spool_error(filename, &self.path, e))?;

        debug!(path = %self.path.display(), length = self.length, "file spooled");
        Ok(self.path)
    }
}

fn open(path: &Path) -> io::Result<BufWriter<File>> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(BufWriter::new)
}

fn spool_error(filename: &str, path: &Path, source: io::Error) -> Error {
    Error::FileSpool {
        filename: filename.to_string(),
        path: path.to_path_buf(),
        source,
    }
}
