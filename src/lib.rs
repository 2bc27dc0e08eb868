//! Streaming decoder for HTTP form bodies.
//!
//! Turns `multipart/form-data` and `application/x-www-form-urlencoded` bodies
//! into nested [`FieldTree`]s built from bracket-notation names
//! (`user[name]`, `tags[]`), spools uploaded files to temporary storage as
//! they arrive and rejects a request as soon as it crosses a quota.
//!
//! # Example
//!
//! ```rust
//! use form_body::{BodyDecoder, Config, Error};
//!
//! # fn main() -> Result<(), Error> {
//! let dir = std::env::temp_dir();
//! let config = Config::default()
//!     .uploaded_files_dir(&dir)
//!     .max_uploaded_files(2)
//!     .max_file_size(1024)
//!     .max_content_length(512);
//!
//! let body = "--AaB03x\r\n\
//!     Content-Disposition: form-data; name=\"user[name]\"\r\n\
//!     \r\n\
//!     Larry\r\n\
//!     --AaB03x\r\n\
//!     Content-Disposition: form-data; name=\"files[]\"; filename=\"file1.txt\"\r\n\
//!     Content-Type: text/plain\r\n\
//!     \r\n\
//!     ... contents of file1.txt ...\r\n\
//!     --AaB03x--\r\n";
//!
//! let mut decoder = BodyDecoder::new(
//!     &config,
//!     Some("multipart/form-data; boundary=AaB03x"),
//!     Some(body.len() as u64),
//! );
//!
//! let result = match decoder.decode(body.as_bytes()) {
//!     Ok(result) => result,
//!     Err(e) => {
//!         for path in decoder.spooled() {
//!             std::fs::remove_file(path)?;
//!         }
//!         return Err(e);
//!     }
//! };
//!
//! let name = result.body.get_path("user[name]").and_then(|v| v.as_value());
//! assert_eq!(name.map(String::as_str), Some("Larry"));
//!
//! let file = result.files.get_path("files[0]").and_then(|v| v.as_value()).unwrap();
//! assert_eq!(file.filename, "file1.txt");
//! assert_eq!(file.length, 29);
//! assert_eq!(file.mime, Some(mime::TEXT_PLAIN));
//!
//! std::fs::remove_file(&file.tmp_path)?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod body;
mod config;
mod error;
mod field;
mod path;
mod quota;
mod spool;
mod state;
mod tree;
mod urlencoded;
mod utils;

pub use body::BodyDecoder;

pub use config::{Charset, Config};

pub use error::Error;

pub use field::UploadedFile;

pub use path::{FieldPath, Segment};

pub use quota::QuotaTracker;

pub use state::{DecodeResult, MultipartDecoder};

pub use tree::{FieldTree, Key};

pub use urlencoded::{decode_urlencoded, parse_query};

pub use utils::title_case;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;
