//! # sourcefile-fixer
//!
//! Rewrites the `SourceFile` attribute of JVM class files inside `.jar`,
//! `.aar` and `.zip` archives, including archives nested in each other.
//!
//! Obfuscators and shrinkers often replace the `SourceFile` value of every
//! class with a constant such as `"SourceFile"` or a random token. Stack
//! traces then point at files that do not exist. This crate derives a
//! plausible value from each class's own name and writes the archive back
//! with the same layout: same entry order, same nesting, resources copied
//! byte for byte.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sourcefile_fixer::Result;
//!
//! fn main() -> Result<()> {
//!     let report = sourcefile_fixer::fix("app-release.aar", "app-release-fixed.aar")?;
//!     println!(
//!         "{} classes, {} rewritten",
//!         report.units_parsed, report.units_rewritten
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Policy and Progress
//!
//! ```rust,no_run
//! use sourcefile_fixer::{AtomicProgress, FixOptions, Fixer, SourceFilePolicy, WriteOptions};
//!
//! fn main() -> sourcefile_fixer::Result<()> {
//!     let progress = AtomicProgress::shared();
//!     let options = FixOptions::new()
//!         .policy(SourceFilePolicy::new().loose_suffixes(Vec::<String>::new()))
//!         .write_options(WriteOptions::new().level(9)?)
//!         .progress(progress.clone());
//!
//!     let mut fixer = Fixer::new(options);
//!     fixer.fix_in_place("bundle.zip")?;
//!     println!("{} entries seen", progress.entries_processed());
//!     Ok(())
//! }
//! ```
//!
//! ## How Values Are Rewritten
//!
//! | Current value | Class name | New value |
//! |---------------|------------|-----------|
//! | `Obf.java` | `com/acme/Widget$Inner` | `Widget.java` |
//! | `a.kt` | `com/acme/b` | `b` |
//! | `WidgetKt.kt` | `com/acme/WidgetKt` | unchanged |
//! | `SourceFile` | `com/acme/Widget` | `Widget` |
//!
//! See [`SourceFilePolicy`] for the exact rules.
//!
//! ## Nesting
//!
//! Which entries are opened depends on the input name: a `.jar` is read as
//! one flat archive, an `.aar` also opens the jars inside it and a `.zip`
//! additionally opens aars. Any other file that is not a container is
//! treated as a single class file or resource. See [`container`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Every error is fatal for the run and
//! leaves the output path untouched; [`Error::category`] maps errors onto
//! the failure classes reported to users:
//!
//! ```rust,no_run
//! use sourcefile_fixer::{ErrorCategory, fix};
//!
//! match fix("in.jar", "out.jar") {
//!     Ok(_) => {}
//!     Err(e) if e.category() == ErrorCategory::MalformedUnit => {
//!         eprintln!("bad class file at {}", e.entry_path().unwrap_or("?"));
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | Command-line interface tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive_path;
pub mod checksum;
pub mod classfile;
pub mod codec;
pub mod container;
pub mod error;
pub mod fixer;
pub mod format;
pub mod heuristic;
pub mod pool;
pub mod progress;
pub mod read;
pub mod stream;
pub mod write;

pub use archive_path::{EntryName, NestedPath};
pub use error::{Error, ErrorCategory, Result};

// Re-export the rewrite API at crate root for convenience
pub use container::ContainerKind;
pub use fixer::{FixOptions, FixReport, Fixer, RunState, fix};
pub use heuristic::SourceFilePolicy;
pub use progress::AtomicProgress;

// Re-export the zip layer
pub use read::{ZipArchive, ZipEntry};
pub use write::{WriteOptions, WriteResult, ZipWriter};
