#![no_main]
use libfuzzer_sys::fuzz_target;

use std::fs;

use form_body::{Config, MultipartDecoder};

fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };

    let config = Config::default()
        .uploaded_files_dir(dir.path())
        .max_file_size(64 * 1024)
        .max_content_length(64 * 1024);

    // the first byte picks the chunk size
    let (size, body) = match data.split_first() {
        Some((n, rest)) => (usize::from(*n).max(1), rest),
        None => (1, data),
    };

    let mut decoder = MultipartDecoder::new("BOUNDARY", &config);
    let mut res = Ok(());
    for chunk in body.chunks(size) {
        res = decoder.feed(chunk);
        if res.is_err() {
            break;
        }
    }

    let spooled = decoder.spooled();
    if res.is_ok() {
        let _ = decoder.finish();
    }

    for path in spooled {
        let _ = fs::remove_file(path);
    }
});
