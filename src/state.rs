use std::{fmt, mem, path::PathBuf};

use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    field::{PartRecord, Sink},
    spool::FileSpool,
    utils::{
        parse_content_disposition, parse_content_type, parse_header_line, split_terminator,
        DASHES,
    },
    Config, Error, FieldTree, QuotaTracker, Result, UploadedFile,
};

/// Decoded `BODY` and `FILES` trees of one request.
#[derive(Debug, Default, Serialize)]
pub struct DecodeResult {
    /// Non-file fields
    #[serde(rename = "BODY")]
    pub body: FieldTree<String>,
    /// Uploaded files
    #[serde(rename = "FILES")]
    pub files: FieldTree<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    AwaitingBoundary,
    Headers,
    Body,
    Closed,
}

/// Streaming `multipart/form-data` decoder.
///
/// Feed it chunks of any size with [`MultipartDecoder::feed`], then call
/// [`MultipartDecoder::finish`]. Lines may straddle chunks: the unterminated
/// tail of a chunk is kept and joined with the next one, so the result does
/// not depend on how the body was split.
///
/// ```
/// use form_body::{Config, MultipartDecoder};
///
/// let config = Config::default();
/// let mut decoder = MultipartDecoder::new("AaB03x", &config);
///
/// for chunk in [
///     &b"--AaB03x\r\nContent-Disposition: form-data; na"[..],
///     b"me=\"title\"\r\n\r\nhello\r\n--AaB03x--\r\n",
/// ] {
///     decoder.feed(chunk)?;
/// }
///
/// let result = decoder.finish()?;
/// assert_eq!(
///     result.body.get("title").and_then(|v| v.as_value()).map(String::as_str),
///     Some("hello")
/// );
/// # Ok::<(), form_body::Error>(())
/// ```
pub struct MultipartDecoder<'a> {
    config: &'a Config,
    quota: QuotaTracker<'a>,
    /// `--boundary`
    delimiter: Bytes,
    /// Unterminated tail of the input seen so far
    pending: BytesMut,
    flag: Flag,
    part: Option<PartRecord>,
    /// Terminator of the last body line, written once the next line proves
    /// to be payload, dropped when it is a boundary.
    deferred: &'static [u8],
    /// Inside a body line already known not to be a boundary
    mid_line: bool,
    total: usize,
    length: u64,
    spooled: Vec<PathBuf>,
    body: FieldTree<String>,
    files: FieldTree<UploadedFile>,
}

impl<'a> MultipartDecoder<'a> {
    /// Creates new decoder.
    #[must_use]
    pub fn new(boundary: &str, config: &'a Config) -> Self {
        // `--boundary`
        let mut delimiter = BytesMut::with_capacity(2 + boundary.len());
        delimiter.extend_from_slice(&DASHES);
        delimiter.extend_from_slice(boundary.as_bytes());

        Self {
            config,
            quota: QuotaTracker::new(config),
            delimiter: delimiter.freeze(),
            pending: BytesMut::with_capacity(config.read_block_size),
            flag: Flag::AwaitingBoundary,
            part: None,
            deferred: &[],
            mid_line: false,
            total: 0,
            length: 0,
            spooled: Vec::new(),
            body: FieldTree::new(),
            files: FieldTree::new(),
        }
    }

    /// Gets the boundary.
    #[must_use]
    pub fn boundary(&self) -> &[u8] {
        &self.delimiter[2..]
    }

    /// Checks if the closing boundary was seen.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.flag == Flag::Closed
    }

    /// Counts the parts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Gets the number of bytes fed.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Checks if nothing was fed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Gets the paths of every temporary file created so far, including the
    /// one of the part being decoded.
    ///
    /// The decoder never removes a spooled file after an error, this is the
    /// list to clean up.
    #[must_use]
    pub fn spooled(&self) -> Vec<PathBuf> {
        let mut paths = self.spooled.clone();
        if let Some(Sink::Spool(spool)) = self.part.as_ref().and_then(|p| p.sink.as_ref()) {
            if spool.is_opened() {
                paths.push(spool.path().to_path_buf());
            }
        }
        paths
    }

    /// Decodes a chunk of the body.
    ///
    /// Input after the closing boundary is ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        if self.flag == Flag::Closed {
            trace!("decoder closed, {} bytes ignored", chunk.len());
            return Ok(());
        }

        self.length += chunk.len() as u64;
        self.pending.extend_from_slice(chunk);

        while self.flag != Flag::Closed {
            let Some(n) = memchr::memchr(b'\n', &self.pending) else {
                self.flush_partial()?;
                break;
            };

            let line = self.pending.split_to(n + 1).freeze();
            let (content, terminator) = split_terminator(&line);

            if self.mid_line {
                self.mid_line = false;
                self.write_body(content)?;
                self.deferred = terminator;
            } else {
                self.process_line(content, terminator)?;
            }
        }

        Ok(())
    }

    /// Decodes the rest of the input as a final line, closes the open part and
    /// yields the trees.
    pub fn finish(mut self) -> Result<DecodeResult> {
        if self.flag != Flag::Closed && !self.pending.is_empty() {
            let line = self.pending.split().freeze();
            if self.mid_line {
                self.mid_line = false;
                self.write_body(&line)?;
            } else {
                self.process_line(&line, &[])?;
            }
        }

        self.close_part()?;
        self.flag = Flag::Closed;

        debug!(total = self.total, length = self.length, "multipart decoded");

        Ok(DecodeResult {
            body: mem::take(&mut self.body),
            files: mem::take(&mut self.files),
        })
    }

    fn process_line(&mut self, content: &[u8], terminator: &'static [u8]) -> Result<()> {
        if let Some(rest) = content.strip_prefix(&self.delimiter[..]) {
            self.close_part()?;
            if rest.starts_with(&DASHES) {
                trace!("closing boundary");
                self.flag = Flag::Closed;
                self.pending.clear();
            } else {
                trace!("part {} starts", self.total);
                self.part.replace(PartRecord::new(self.total));
                self.total += 1;
                self.flag = Flag::Headers;
            }
            return Ok(());
        }

        match self.flag {
            Flag::AwaitingBoundary => {
                trace!("{} bytes outside of a part ignored", content.len());
            }
            Flag::Headers if content.is_empty() => self.begin_body(),
            Flag::Headers => self.parse_header(content)?,
            Flag::Body => {
                self.write_body(content)?;
                self.deferred = terminator;
            }
            Flag::Closed => {}
        }

        Ok(())
    }

    /// Handles an unterminated tail.
    ///
    /// Inside a body, once the tail is long enough to tell it is not a
    /// boundary line it is written out, keeping a trailing `\r` back. Outside
    /// of a part it is dropped the same way. A tail that must be held whole,
    /// a header line or one starting like a boundary, counts against
    /// `max_content_length`.
    fn flush_partial(&mut self) -> Result<()> {
        let flushable = match self.flag {
            Flag::Body | Flag::AwaitingBoundary => {
                self.mid_line
                    || (self.pending.len() >= self.delimiter.len()
                        && !self.pending.starts_with(&self.delimiter))
            }
            Flag::Headers | Flag::Closed => false,
        };

        if !flushable {
            // header lines and boundary-like tails are held whole
            let held = self.pending.len() as u64;
            if let Some(max) = self.config.checked_content_length(held) {
                debug!(held, limit = max, "unterminated line is too long");
                return Err(Error::MaxBodySize(max));
            }
            return Ok(());
        }

        let keep = usize::from(self.pending.last() == Some(&b'\r'));
        let n = self.pending.len() - keep;
        if n == 0 {
            return Ok(());
        }

        let partial = self.pending.split_to(n).freeze();
        self.mid_line = true;

        if self.flag == Flag::Body {
            self.write_body(&partial)
        } else {
            trace!("{} bytes outside of a part ignored", partial.len());
            Ok(())
        }
    }

    fn parse_header(&mut self, line: &[u8]) -> Result<()> {
        let Some(part) = self.part.as_mut() else {
            return Ok(());
        };

        let Some((name, value)) = parse_header_line(line) else {
            debug!("invalid part header skipped: {:?}", String::from_utf8_lossy(line));
            return Ok(());
        };

        trace!("part {} header {}: {:?}", part.index, name, value);

        if name == CONTENT_DISPOSITION {
            let cd = parse_content_disposition(value.as_bytes());
            if cd.name.is_some() {
                part.name = cd.name;
            }
            if let Some(filename) = cd.filename {
                if part.filename.replace(filename).is_none() {
                    if !self.config.files_upload_on {
                        debug!(part = part.index, "file part while uploads are disabled");
                        return Err(Error::FilesUpload);
                    }
                    self.quota.register_file_start()?;
                }
            }
        } else if name == CONTENT_TYPE {
            part.content_type = value.to_str().ok().and_then(parse_content_type);
        }

        part.headers.append(name, value);
        Ok(())
    }

    fn begin_body(&mut self) {
        let config = self.config;
        if let Some(part) = self.part.as_mut() {
            let sink = if part.is_file() {
                Sink::Spool(FileSpool::new(config, part.index))
            } else {
                Sink::Buffer(BytesMut::new())
            };
            part.sink.replace(sink);
            debug!("{:?}", part);
        }
        self.deferred = &[];
        self.flag = Flag::Body;
    }

    /// Writes the deferred terminator, then `buf`.
    fn write_body(&mut self, buf: &[u8]) -> Result<()> {
        let deferred = mem::take(&mut self.deferred);
        self.append(deferred)?;
        self.append(buf)
    }

    fn append(&mut self, buf: &[u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }

        let Some(part) = self.part.as_mut() else {
            trace!("{} bytes without an open part ignored", buf.len());
            return Ok(());
        };

        let n = buf.len() as u64;
        match part.sink.as_mut() {
            Some(Sink::Spool(spool)) => {
                let filename = part.filename.as_deref().unwrap_or_default();
                self.quota.add_file_bytes(part.index, filename, n)?;
                spool.write(filename, buf)?;
            }
            Some(Sink::Buffer(buffer)) => {
                self.quota.add_body_bytes(n)?;
                buffer.extend_from_slice(buf);
            }
            None => return Ok(()),
        }

        part.length += n;
        Ok(())
    }

    /// Finalizes the open part into `BODY` or `FILES`.
    fn close_part(&mut self) -> Result<()> {
        self.deferred = &[];
        self.mid_line = false;

        let Some(part) = self.part.take() else {
            return Ok(());
        };

        let PartRecord {
            index,
            name,
            filename,
            content_type,
            headers,
            length,
            sink,
        } = part;

        let Some(filename) = filename else {
            let value = match sink {
                Some(Sink::Buffer(buffer)) => self.config.encoding.decode(&buffer),
                _ => String::new(),
            };
            match name {
                Some(name) => self.body.insert(&name, value),
                None => debug!(part = index, "field without a name dropped"),
            }
            return Ok(());
        };

        let spool = match sink {
            Some(Sink::Spool(spool)) => spool,
            _ => FileSpool::new(self.config, index),
        };

        if filename.is_empty() && length == 0 {
            // never written, so nothing is on disk
            debug!(part = index, "empty file part discarded");
            return Ok(());
        }

        let tmp_path = spool.persist(&filename)?;
        self.spooled.push(tmp_path.clone());

        let filename = if filename.is_empty() {
            tmp_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            filename
        };

        let Some(name) = name else {
            debug!(part = index, "file without a name left at {}", tmp_path.display());
            return Ok(());
        };

        self.files.insert(
            &name,
            UploadedFile {
                filename,
                headers,
                tmp_path,
                length,
                mime: content_type,
            },
        );

        Ok(())
    }
}

impl fmt::Debug for MultipartDecoder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartDecoder")
            .field("flag", &self.flag)
            .field("total", &self.total)
            .field("length", &self.length)
            .field("pending", &self.pending.len())
            .field("mid_line", &self.mid_line)
            .field("boundary", &String::from_utf8_lossy(self.boundary()))
            .finish()
    }
}
