//! Fuzz target for class file parsing.
//!
//! Any class that parses must serialize back to the same bytes and accept a
//! new SourceFile value.
//!
//! Run with: cargo +nightly fuzz run class_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use sourcefile_fixer::classfile::ClassFile;

fuzz_target!(|data: &[u8]| {
    let Ok(mut class) = ClassFile::parse(data) else {
        return;
    };
    assert_eq!(class.to_bytes(), data);

    if class.source_file().is_some() {
        class.set_source_file("Fuzz.java").unwrap();
        let reparsed = ClassFile::parse(&class.to_bytes()).unwrap();
        assert_eq!(reparsed.source_file().as_deref(), Some("Fuzz.java"));
    }
});
