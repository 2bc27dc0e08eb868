use std::borrow::Cow;

use percent_encoding::percent_decode;
use tracing::trace;

use crate::{Charset, Error, FieldTree, Result};

/// Decodes an `application/x-www-form-urlencoded` body.
///
/// Every pair must contain `=`, one that does not fails the whole body with
/// [`Error::MalformedBody`]. Empty pairs are skipped.
///
/// ```
/// use form_body::{decode_urlencoded, Charset};
///
/// let tree = decode_urlencoded(b"foo[]=1&foo[]=2&bar=a+b%21", Charset::Utf8)?;
///
/// assert_eq!(tree.get_path("foo[1]").and_then(|v| v.as_value()).map(String::as_str), Some("2"));
/// assert_eq!(tree.get_path("bar").and_then(|v| v.as_value()).map(String::as_str), Some("a b!"));
/// # Ok::<(), form_body::Error>(())
/// ```
pub fn decode_urlencoded(input: &[u8], encoding: Charset) -> Result<FieldTree<String>> {
    let mut tree = FieldTree::new();

    for pair in input.split(|b| *b == b'&') {
        if pair.is_empty() {
            continue;
        }

        let Some(eq) = memchr::memchr(b'=', pair) else {
            return Err(Error::MalformedBody(
                String::from_utf8_lossy(pair).into_owned(),
            ));
        };

        let name = decode_component(&pair[..eq], encoding);
        let value = decode_component(&pair[eq + 1..], encoding);

        trace!("field {}: {}", name, value);

        tree.insert(&name, value);
    }

    Ok(tree)
}

/// Decodes a query string, the same way as a url-encoded body.
pub fn parse_query(query: &str, encoding: Charset) -> Result<FieldTree<String>> {
    decode_urlencoded(query.as_bytes(), encoding)
}

fn decode_component(raw: &[u8], encoding: Charset) -> String {
    let raw = if raw.contains(&b'+') {
        Cow::Owned(
            raw.iter()
                .map(|&b| if b == b'+' { b' ' } else { b })
                .collect::<Vec<_>>(),
        )
    } else {
        Cow::Borrowed(raw)
    };

    let bytes: Cow<'_, [u8]> = percent_decode(&raw).into();
    encoding.decode(&bytes)
}
