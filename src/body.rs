use std::{
    io::{ErrorKind, Read},
    path::PathBuf,
};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::{
    urlencoded::decode_urlencoded,
    utils::{is_multipart, parse_content_type},
    Config, DecodeResult, Error, FieldTree, MultipartDecoder, QuotaTracker, Result,
};

/// Decodes a request body into `BODY` and `FILES` trees.
///
/// `multipart/form-data` and `multipart/mixed` bodies are streamed through a
/// [`MultipartDecoder`], anything else is read whole and decoded as
/// `application/x-www-form-urlencoded`.
///
/// ```
/// use form_body::{BodyDecoder, Config};
///
/// let config = Config::default();
/// let body = b"name=ferris&langs[]=rust&langs[]=c";
///
/// let mut decoder = BodyDecoder::new(&config, None, Some(body.len() as u64));
/// let result = decoder.decode(&body[..])?;
///
/// assert_eq!(result.body.get("langs").map(|v| v.len()), Some(2));
/// assert!(result.files.is_empty());
/// # Ok::<(), form_body::Error>(())
/// ```
#[derive(Debug)]
pub struct BodyDecoder<'a> {
    config: &'a Config,
    content_type: Option<mime::Mime>,
    content_length: Option<u64>,
    spooled: Vec<PathBuf>,
}

impl<'a> BodyDecoder<'a> {
    /// Creates new body decoder from the declared `Content-Type` and
    /// `Content-Length` headers.
    #[must_use]
    pub fn new(config: &'a Config, content_type: Option<&str>, content_length: Option<u64>) -> Self {
        Self {
            config,
            content_type: content_type.and_then(parse_content_type),
            content_length,
            spooled: Vec::new(),
        }
    }

    /// Gets the parsed content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// Gets the temporary files created by the last [`BodyDecoder::decode`].
    ///
    /// After an error these files are left on disk and the caller owns their
    /// cleanup.
    #[must_use]
    pub fn spooled(&self) -> &[PathBuf] {
        &self.spooled
    }

    /// Reads the body from `reader` and decodes it.
    pub fn decode<R: Read>(&mut self, reader: R) -> Result<DecodeResult> {
        self.spooled.clear();

        match self.content_type.as_ref().filter(|m| is_multipart(m)) {
            Some(m) => {
                let boundary = m
                    .get_param(mime::BOUNDARY)
                    .map(|b| b.as_str().to_string())
                    .ok_or(Error::MissingBoundary)?;
                self.decode_multipart(&boundary, reader)
            }
            None => Ok(DecodeResult {
                body: self.decode_urlencoded(reader)?,
                files: FieldTree::new(),
            }),
        }
    }

    fn decode_multipart<R: Read>(&mut self, boundary: &str, mut reader: R) -> Result<DecodeResult> {
        let mut decoder = MultipartDecoder::new(boundary, self.config);
        let mut remaining = self.content_length;
        let mut buf = BytesMut::zeroed(self.config.read_block_size);

        let res = loop {
            if decoder.is_closed() {
                trace!("closing boundary reached");
                break Ok(());
            }

            let n = match read_block(&mut reader, &mut buf, remaining) {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(e),
            };

            if let Some(r) = remaining.as_mut() {
                *r -= n as u64;
            }

            trace!("polled {} bytes", n);

            if let Err(e) = decoder.feed(&buf[..n]) {
                break Err(e);
            }
        };

        self.spooled = decoder.spooled();

        res.and_then(|()| decoder.finish()).map_err(|e| {
            debug!(spooled = self.spooled.len(), "multipart body rejected: {}", e);
            e
        })
    }

    fn decode_urlencoded<R: Read>(&mut self, mut reader: R) -> Result<FieldTree<String>> {
        if let Some(len) = self.content_length {
            if let Some(max) = self.config.checked_content_length(len) {
                debug!(len, limit = max, "declared body is too large");
                return Err(Error::MaxBodySize(max));
            }
        }

        let mut quota = QuotaTracker::new(self.config);
        let mut remaining = self.content_length;
        let mut buf = BytesMut::zeroed(self.config.read_block_size);
        let mut body = BytesMut::new();

        loop {
            let n = read_block(&mut reader, &mut buf, remaining)?;
            if n == 0 {
                break;
            }

            if let Some(r) = remaining.as_mut() {
                *r -= n as u64;
            }

            quota.add_body_bytes(n as u64)?;
            body.extend_from_slice(&buf[..n]);
        }

        trace!("read {} url-encoded bytes", body.len());

        decode_urlencoded(&body, self.config.encoding)
    }
}

/// Reads one block, never past `remaining`, retrying interrupted reads.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8], remaining: Option<u64>) -> Result<usize> {
    let want = remaining.map_or(buf.len(), |r| {
        usize::try_from(r).map_or(buf.len(), |r| r.min(buf.len()))
    });

    if want == 0 {
        return Ok(0);
    }

    loop {
        match reader.read(&mut buf[..want]) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Stream(e)),
        }
    }
}
