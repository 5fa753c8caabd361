//! Fuzz target for ZipArchive::open and the entry stream.
//!
//! Run with: cargo +nightly fuzz run zip_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use sourcefile_fixer::ZipArchive;
use sourcefile_fixer::stream::EntryStream;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut archive) = ZipArchive::open(Cursor::new(data)) {
        for index in 0..archive.len() {
            let _ = archive.read(index);
        }
    }

    // Walk the bytes as a zip input, unpacking nested aars and jars
    if let Ok(stream) = EntryStream::from_reader("fuzz.zip", Cursor::new(data.to_vec())) {
        for event in stream.take(10_000) {
            if event.is_err() {
                break;
            }
        }
    }
});
