#![no_main]
use libfuzzer_sys::fuzz_target;

use form_body::{decode_urlencoded, Charset, FieldPath};

fuzz_target!(|data: &[u8]| {
    let _ = decode_urlencoded(data, Charset::Utf8);
    let _ = decode_urlencoded(data, Charset::Latin1);

    if let Ok(name) = std::str::from_utf8(data) {
        let _ = FieldPath::parse(name);
    }
});
