use http::header::{HeaderName, HeaderValue};

pub(crate) const DASHES: [u8; 2] = [b'-', b'-']; // `--`
pub(crate) const CRLF: [u8; 2] = [b'\r', b'\n']; // `\r\n`
pub(crate) const LF: [u8; 1] = [b'\n']; // `\n`

const NAME: &str = "name";
const FILE_NAME: &str = "filename";

/// Parses a content type, `None` if it is not a valid mime.
pub(crate) fn parse_content_type(value: &str) -> Option<mime::Mime> {
    value.trim().parse().ok()
}

/// Checks for `multipart/form-data` and `multipart/mixed`.
pub(crate) fn is_multipart(m: &mime::Mime) -> bool {
    m.type_() == mime::MULTIPART && (m.subtype() == mime::FORM_DATA || m.subtype() == "mixed")
}

/// Splits a complete line into its content and terminator.
pub(crate) fn split_terminator(line: &[u8]) -> (&[u8], &'static [u8]) {
    match line {
        [rest @ .., b'\r', b'\n'] => (rest, &CRLF),
        [rest @ .., b'\n'] => (rest, &LF),
        _ => (line, &[]),
    }
}

/// Parses a part header line, `name: value`.
pub(crate) fn parse_header_line(line: &[u8]) -> Option<(HeaderName, HeaderValue)> {
    let colon = memchr::memchr(b':', line)?;
    let name = HeaderName::from_bytes(line[..colon].trim_ascii()).ok()?;
    let value = HeaderValue::from_bytes(line[colon + 1..].trim_ascii()).ok()?;
    Some((name, value))
}

/// Normalizes a header name to `Title-Case`, e.g. `content-disposition` to
/// `Content-Disposition`.
#[must_use]
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// `name` and `filename` of a `Content-Disposition` header.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ContentDisposition {
    pub(crate) name: Option<String>,
    pub(crate) filename: Option<String>,
}

/// Parses `form-data; name="field"; filename="a.txt"`.
///
/// Parameters are separated by `;` outside of quotes, surrounding quotes are
/// stripped. The disposition type is not checked.
pub(crate) fn parse_content_disposition(hv: &[u8]) -> ContentDisposition {
    let mut cd = ContentDisposition::default();

    for param in split_params(hv).into_iter().skip(1) {
        let Some(eq) = memchr::memchr(b'=', param) else {
            continue;
        };
        let key = String::from_utf8_lossy(param[..eq].trim_ascii());
        let value = unquote(param[eq + 1..].trim_ascii());

        if key.eq_ignore_ascii_case(NAME) {
            cd.name.replace(String::from_utf8_lossy(value).into_owned());
        } else if key.eq_ignore_ascii_case(FILE_NAME) {
            cd.filename
                .replace(String::from_utf8_lossy(value).into_owned());
        }
    }

    cd
}

fn split_params(hv: &[u8]) -> Vec<&[u8]> {
    let mut params = Vec::with_capacity(3);
    let mut quoted = false;
    let mut j = 0;

    for (i, b) in hv.iter().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b';' if !quoted => {
                params.push(hv[j..i].trim_ascii());
                j = i + 1;
            }
            _ => {}
        }
    }
    params.push(hv[j..].trim_ascii());

    params
}

fn unquote(v: &[u8]) -> &[u8] {
    match v {
        [b'"', inner @ .., b'"'] => inner,
        _ => v,
    }
}
