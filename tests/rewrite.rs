//! End-to-end rewrite runs over jar, aar and zip inputs.

mod common;

use std::fs;
use std::io::Cursor;

use common::{ClassBuilder, class, entry, names, read_zip, read_zip_file, source_file_of, write_zip};
use sourcefile_fixer::codec::CompressionMethod;
use sourcefile_fixer::{
    EntryName, FixOptions, Fixer, RunState, SourceFilePolicy, ZipArchive, ZipEntry, ZipWriter, fix,
};

#[test]
fn test_matching_java_names_are_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let output = dir.path().join("app-fixed.jar");
    let foo = class("com/Foo", "Foo.java");
    let bar = class("com/Foo$Bar", "Foo.java");
    write_zip(
        &input,
        &[
            ("com/Foo.class", &foo),
            ("com/Foo$Bar.class", &bar),
            ("META/data.txt", b"payload"),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 2);
    assert_eq!(report.units_rewritten, 0);
    assert_eq!(report.resources_copied, 1);

    let entries = read_zip_file(&output);
    assert_eq!(
        names(&entries),
        ["com/Foo.class", "com/Foo$Bar.class", "META/data.txt"]
    );
    assert_eq!(entry(&entries, "com/Foo.class"), foo.as_slice());
    assert_eq!(entry(&entries, "com/Foo$Bar.class"), bar.as_slice());
    assert_eq!(entry(&entries, "META/data.txt"), b"payload");
}

#[test]
fn test_java_names_follow_outer_class() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    write_zip(
        &input,
        &[
            ("a/b.class", &class("a/b", "SourceFile.java")),
            ("a/b$c.class", &class("a/b$c", "SourceFile.java")),
            ("a/b$c$1.class", &class("a/b$c$1", "SourceFile.java")),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_rewritten, 3);

    let entries = read_zip_file(&output);
    for name in ["a/b.class", "a/b$c.class", "a/b$c$1.class"] {
        assert_eq!(
            source_file_of(entry(&entries, name)).as_deref(),
            Some("b.java"),
            "{name}"
        );
    }
}

#[test]
fn test_kotlin_names_depend_on_short_name_length() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    write_zip(
        &input,
        &[
            (
                "com/a/b/LongClassName.class",
                &class("com/a/b/LongClassName", "Somewhere.kt"),
            ),
            ("com/a/b/X.class", &class("com/a/b/X", "Unrelated.kt")),
        ],
    );

    fix(&input, &output).unwrap();
    let entries = read_zip_file(&output);
    assert_eq!(
        source_file_of(entry(&entries, "com/a/b/LongClassName.class")).as_deref(),
        Some("Somewhere.kt")
    );
    assert_eq!(
        source_file_of(entry(&entries, "com/a/b/X.class")).as_deref(),
        Some("X")
    );
}

#[test]
fn test_other_values_become_short_name() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    write_zip(
        &input,
        &[
            ("p/Widget.class", &class("p/Widget", "SourceFile")),
            ("p/Plain.class", &ClassBuilder::new("p/Plain").build()),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_rewritten, 1);
    assert_eq!(report.units_without_source_file, 1);

    let entries = read_zip_file(&output);
    assert_eq!(
        source_file_of(entry(&entries, "p/Widget.class")).as_deref(),
        Some("Widget")
    );
    assert_eq!(source_file_of(entry(&entries, "p/Plain.class")), None);
}

#[test]
fn test_second_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let once = dir.path().join("once.jar");
    let twice = dir.path().join("twice.jar");
    write_zip(
        &input,
        &[
            ("x/a.class", &class("x/a", "Obf.kt")),
            ("x/Outer$1.class", &class("x/Outer$1", "Obf.java")),
            ("x/Other.class", &class("x/Other", "proguard")),
        ],
    );

    fix(&input, &once).unwrap();
    let report = fix(&once, &twice).unwrap();
    assert_eq!(report.units_rewritten, 0);
    assert_eq!(read_zip_file(&once), read_zip_file(&twice));
}

#[test]
fn test_nesting_and_order_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bundle.zip");
    let output = dir.path().join("bundle-fixed.zip");

    let jar = common::zip_bytes(&[
        ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n"),
        ("com/x/a.class", &class("com/x/a", "Renamed.kt")),
        ("com/x/Main.class", &class("com/x/Main", "Obf.java")),
    ]);
    let aar = common::zip_bytes(&[
        ("AndroidManifest.xml", b"<manifest package=\"com.x\"/>"),
        ("classes.jar", &jar),
        ("R.txt", b"int id foo 0x7f010001\n"),
    ]);
    write_zip(
        &input,
        &[
            ("README.md", b"# bundle\n"),
            ("libs/x.aar", &aar),
            ("libs/plain.jar", &jar),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 4);
    assert_eq!(report.units_rewritten, 4);
    assert_eq!(report.containers_rewritten, 3);
    assert_eq!(report.resources_copied, 5);

    let outer = read_zip_file(&output);
    assert_eq!(names(&outer), ["README.md", "libs/x.aar", "libs/plain.jar"]);
    assert_eq!(entry(&outer, "README.md"), b"# bundle\n");

    let aar_out = read_zip(entry(&outer, "libs/x.aar"));
    assert_eq!(names(&aar_out), ["AndroidManifest.xml", "classes.jar", "R.txt"]);
    assert_eq!(
        entry(&aar_out, "AndroidManifest.xml"),
        b"<manifest package=\"com.x\"/>"
    );
    assert_eq!(entry(&aar_out, "R.txt"), b"int id foo 0x7f010001\n");

    for jar_bytes in [entry(&aar_out, "classes.jar"), entry(&outer, "libs/plain.jar")] {
        let jar_out = read_zip(jar_bytes);
        assert_eq!(
            names(&jar_out),
            ["META-INF/MANIFEST.MF", "com/x/a.class", "com/x/Main.class"]
        );
        assert_eq!(
            entry(&jar_out, "META-INF/MANIFEST.MF"),
            b"Manifest-Version: 1.0\n"
        );
        assert_eq!(
            source_file_of(entry(&jar_out, "com/x/a.class")).as_deref(),
            Some("a")
        );
        assert_eq!(
            source_file_of(entry(&jar_out, "com/x/Main.class")).as_deref(),
            Some("Main.java")
        );
    }
}

#[test]
fn test_jar_inside_jar_is_a_resource() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("app.jar");
    let output = dir.path().join("out.jar");
    let inner = common::zip_bytes(&[("q/a.class", &class("q/a", "Wrong.java"))]);
    write_zip(&input, &[("BOOT-INF/lib/dep.jar", &inner)]);

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 0);
    assert_eq!(report.containers_rewritten, 0);
    assert_eq!(entry(&read_zip_file(&output), "BOOT-INF/lib/dep.jar"), inner.as_slice());
}

#[test]
fn test_resources_keep_stored_bytes_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");

    let mut writer = ZipWriter::new(Vec::new());
    writer.set_comment("built by hand");
    let mut stored = ZipEntry::new(EntryName::new("res/raw.bin").unwrap(), CompressionMethod::Stored);
    stored.last_modified_time = 0x6000;
    stored.last_modified_date = 0x5A21;
    stored.external_attributes = 0o100644 << 16;
    writer.add(&stored, &[1, 2, 3, 4, 5]).unwrap();
    let dir_entry = ZipEntry::new(EntryName::new("res/").unwrap(), CompressionMethod::Stored);
    writer.add(&dir_entry, &[]).unwrap();
    let class_entry = ZipEntry::new(EntryName::new("Z.class").unwrap(), CompressionMethod::Deflated);
    writer.add(&class_entry, &class("Z", "Q.kt")).unwrap();
    fs::write(&input, writer.finish_into_inner().unwrap().1).unwrap();

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_rewritten, 1);

    let mut before = ZipArchive::open_path(&input).unwrap();
    let mut after = ZipArchive::open_path(&output).unwrap();
    assert_eq!(after.comment(), b"built by hand");
    assert_eq!(after.len(), 3);
    for index in 0..2 {
        assert_eq!(before.read_raw(index).unwrap(), after.read_raw(index).unwrap());
        let (b, a) = (&before.entries()[index], &after.entries()[index]);
        assert_eq!(b.name, a.name);
        assert_eq!(b.method, a.method);
        assert_eq!(b.crc32, a.crc32);
        assert_eq!(b.last_modified_time, a.last_modified_time);
        assert_eq!(b.last_modified_date, a.last_modified_date);
        assert_eq!(b.external_attributes, a.external_attributes);
    }
    assert!(after.entries()[1].is_directory());
    assert_eq!(after.entries()[2].method, CompressionMethod::Deflated);
    assert_eq!(source_file_of(&after.read(2).unwrap()).as_deref(), Some("Z"));
}

#[test]
fn test_same_class_in_two_locations() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mr.jar");
    let output = dir.path().join("out.jar");
    write_zip(
        &input,
        &[
            ("com/Foo.class", &class("com/Foo", "Base.java")),
            (
                "META-INF/versions/11/com/Foo.class",
                &ClassBuilder::new("com/Foo")
                    .major_version(55)
                    .source_file("Foo.java")
                    .build(),
            ),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 2);
    assert_eq!(report.units_rewritten, 1);

    let entries = read_zip_file(&output);
    let base = entry(&entries, "com/Foo.class");
    let versioned = entry(&entries, "META-INF/versions/11/com/Foo.class");
    assert_eq!(source_file_of(base).as_deref(), Some("Foo.java"));
    assert_eq!(source_file_of(versioned).as_deref(), Some("Foo.java"));
    assert_eq!(&base[6..8], &[0, 52]);
    assert_eq!(&versioned[6..8], &[0, 55]);
}

#[test]
fn test_duplicate_entry_names_are_rewritten_independently() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dup.jar");
    let output = dir.path().join("out.jar");
    let first = class("a/X", "X.java");
    write_zip(
        &input,
        &[
            ("a/X.class", &first),
            ("a/X.class", &class("a/X", "Other.txt")),
        ],
    );

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 2);
    assert_eq!(report.units_rewritten, 1);

    let entries = read_zip_file(&output);
    assert_eq!(names(&entries), ["a/X.class", "a/X.class"]);
    assert_eq!(entries[0].1, first);
    assert_eq!(source_file_of(&entries[1].1).as_deref(), Some("X"));
}

#[test]
fn test_duplicate_nested_jar_names() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bundle.zip");
    let output = dir.path().join("out.zip");
    let kept = class("p/Kept", "Kept.java");
    let first = common::zip_bytes(&[("p/Kept.class", &kept)]);
    let second = common::zip_bytes(&[("p/Kept.class", &class("p/Kept", "Other.txt"))]);
    write_zip(&input, &[("lib.jar", &first), ("lib.jar", &second)]);

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_rewritten, 1);
    assert_eq!(report.containers_rewritten, 2);

    let entries = read_zip_file(&output);
    assert_eq!(names(&entries), ["lib.jar", "lib.jar"]);
    assert_eq!(entry(&read_zip(&entries[0].1), "p/Kept.class"), kept.as_slice());
    let rewritten = read_zip(&entries[1].1);
    assert_eq!(
        source_file_of(entry(&rewritten, "p/Kept.class")).as_deref(),
        Some("Kept")
    );
}

#[test]
fn test_lone_surrogate_constant_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    let surrogate = [0xED, 0xA0, 0x80];
    let foo = ClassBuilder::new("com/Foo")
        .source_file("Orig.java")
        .utf8_constant(&surrogate)
        .build();
    write_zip(&input, &[("com/Foo.class", &foo)]);

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_rewritten, 1);

    let entries = read_zip_file(&output);
    let fixed = entry(&entries, "com/Foo.class");
    assert_eq!(source_file_of(fixed).as_deref(), Some("Foo.java"));
    let constant = [1, 0, 3, 0xED, 0xA0, 0x80];
    assert!(fixed.windows(constant.len()).any(|w| w == constant));
}

#[test]
fn test_lone_surrogate_source_file_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    let mut foo = class("com/Foo", "QQQ");
    let at = foo.windows(3).position(|w| w == b"QQQ").unwrap();
    foo[at..at + 3].copy_from_slice(&[0xED, 0xA0, 0x80]);
    write_zip(&input, &[("com/Foo.class", &foo)]);

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.units_parsed, 1);
    assert_eq!(report.units_rewritten, 0);
    assert_eq!(report.units_without_source_file, 1);
    assert_eq!(entry(&read_zip_file(&output), "com/Foo.class"), foo.as_slice());
}

#[test]
fn test_custom_policy() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.jar");
    let output = dir.path().join("out.jar");
    write_zip(
        &input,
        &[
            ("a/Longer.class", &class("a/Longer", "X.kt")),
            ("a/Thing.class", &class("a/Thing", "Other.groovy")),
        ],
    );

    let policy = SourceFilePolicy::new()
        .short_name_threshold(6)
        .primary_suffixes([".java", ".groovy"]);
    let mut fixer = Fixer::new(FixOptions::new().policy(policy));
    fixer.run(&input, &output).unwrap();
    assert_eq!(fixer.state(), RunState::Closed);

    let entries = read_zip_file(&output);
    assert_eq!(
        source_file_of(entry(&entries, "a/Longer.class")).as_deref(),
        Some("Longer")
    );
    assert_eq!(
        source_file_of(entry(&entries, "a/Thing.class")).as_deref(),
        Some("Thing.groovy")
    );
}

#[test]
fn test_aar_input_to_jar_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lib.aar");
    let output = dir.path().join("lib-fixed.jar");
    let jar = common::zip_bytes(&[("k/b.class", &class("k/b", "Hidden.kt"))]);
    write_zip(&input, &[("classes.jar", &jar), ("proguard.txt", b"-keep class k.**")]);

    let report = fix(&input, &output).unwrap();
    assert_eq!(report.containers_rewritten, 1);

    let outer = read_zip_file(&output);
    assert_eq!(names(&outer), ["classes.jar", "proguard.txt"]);
    let inner = read_zip(entry(&outer, "classes.jar"));
    assert_eq!(source_file_of(entry(&inner, "k/b.class")).as_deref(), Some("b"));
}

#[test]
fn test_fix_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.aar");
    let jar = common::zip_bytes(&[("z/Y.class", &class("z/Y", "y.java"))]);
    write_zip(&path, &[("classes.jar", &jar)]);

    let report = Fixer::new(FixOptions::new()).fix_in_place(&path).unwrap();
    assert_eq!(report.units_rewritten, 1);

    let outer = read_zip_file(&path);
    let inner = read_zip(entry(&outer, "classes.jar"));
    assert_eq!(source_file_of(entry(&inner, "z/Y.class")).as_deref(), Some("Y.java"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_output_is_a_readable_archive() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.zip");
    let output = dir.path().join("out.zip");
    write_zip(&input, &[("empty/", b""), ("a.txt", b"a")]);

    let report = fix(&input, &output).unwrap();
    let bytes = fs::read(&output).unwrap();
    assert_eq!(report.bytes_written, bytes.len() as u64);
    let archive = ZipArchive::open(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);
}
