use std::{fmt, path::PathBuf};

use bytes::BytesMut;
use http::HeaderMap;
use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::{spool::FileSpool, utils::title_case};

/// File uploaded by a multipart part, spooled to a temporary file.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// The filename sent by the client, or the temporary file name when the
    /// client sent an empty one.
    pub filename: String,
    /// The headers of the part.
    pub headers: HeaderMap,
    /// The temporary file holding the payload.
    pub tmp_path: PathBuf,
    /// The payload size.
    pub length: u64,
    /// The content type of the part, optional.
    pub mime: Option<mime::Mime>,
}

impl Serialize for UploadedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let headers = self
            .headers
            .iter()
            .map(|(k, v)| (title_case(k.as_str()), String::from_utf8_lossy(v.as_bytes())))
            .collect::<std::collections::BTreeMap<_, _>>();

        let mut s = serializer.serialize_struct("UploadedFile", 5)?;
        s.serialize_field("filename", &self.filename)?;
        s.serialize_field("headers", &headers)?;
        s.serialize_field("tmp_name", &self.tmp_path)?;
        s.serialize_field("size", &self.length)?;
        s.serialize_field("mime", &self.mime.as_ref().map(AsRef::<str>::as_ref))?;
        s.end()
    }
}

/// Where the payload of a part goes.
pub(crate) enum Sink {
    /// Non-file value, kept in memory
    Buffer(BytesMut),
    /// File payload
    Spool(FileSpool),
}

/// Part being assembled by the multipart decoder.
pub(crate) struct PartRecord {
    /// The index of the part in the body.
    pub(crate) index: usize,
    /// The form field name, optional.
    pub(crate) name: Option<String>,
    /// Present iff the part is a file.
    pub(crate) filename: Option<String>,
    /// The content type of the part, optional.
    pub(crate) content_type: Option<mime::Mime>,
    /// All headers of the part.
    pub(crate) headers: HeaderMap,
    /// The payload size.
    pub(crate) length: u64,
    /// Set once the header block has ended.
    pub(crate) sink: Option<Sink>,
}

impl PartRecord {
    /// Creates an empty part.
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            name: None,
            filename: None,
            content_type: None,
            headers: HeaderMap::new(),
            length: 0,
            sink: None,
        }
    }

    /// Checks if the part carries a file.
    pub(crate) fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

impl fmt::Debug for PartRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartRecord")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .field("headers", &self.headers)
            .finish()
    }
}
