//! The two-pass rewrite of an input file.
//!
//! Pass 1 walks the input, parses every class file, rewrites its SourceFile
//! value and keeps the patched class in a [`UnitPool`]. Pass 2 reopens the
//! input, walks it again in the same order and writes every entry to the
//! output: pooled classes are serialized, everything else is copied as
//! stored. Nested containers are rebuilt level by level.
//!
//! The output is written to a temporary file next to the destination and
//! only moved into place once every container level has been closed, so a
//! failed or cancelled run leaves no output behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use sourcefile_fixer::{FixOptions, Fixer, SourceFilePolicy};
//!
//! let options = FixOptions::new().policy(SourceFilePolicy::new().short_name_threshold(2));
//! let report = Fixer::new(options).run("app-obfuscated.jar", "app-fixed.jar")?;
//! println!(
//!     "rewrote {} of {} classes",
//!     report.units_rewritten, report.units_parsed
//! );
//! # Ok::<(), sourcefile_fixer::Error>(())
//! ```

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::classfile::{ClassFile, ClassFormatError};
use crate::container::WriterPlan;
use crate::heuristic::SourceFilePolicy;
use crate::pool::UnitPool;
use crate::progress::AtomicProgress;
use crate::read::ZipEntry;
use crate::stream::{Container, Entry, EntryStream, Payload, StreamEvent, file_name};
use crate::write::{WriteOptions, ZipWriter};
use crate::{Error, Result};

/// Prefix of temporary files created next to the output.
const TEMP_PREFIX: &str = ".sourcefile-fixer-";

/// Options for a rewrite run.
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// How SourceFile values are rewritten.
    pub policy: SourceFilePolicy,
    /// Options for rebuilt archives.
    pub write: WriteOptions,
    /// Progress tracker and cancellation handle.
    pub progress: Option<Arc<AtomicProgress>>,
}

impl FixOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the SourceFile policy.
    pub fn policy(mut self, policy: SourceFilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the archive write options.
    pub fn write_options(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Attaches a progress tracker.
    pub fn progress(mut self, progress: Arc<AtomicProgress>) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has been read yet.
    Init,
    /// Parsing and patching classes.
    Pass1Building,
    /// Writing the output.
    Pass2Writing,
    /// The output has been published.
    Closed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Pass1Building => write!(f, "pass 1 (building class pool)"),
            Self::Pass2Writing => write!(f, "pass 2 (writing output)"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    /// Class files parsed.
    pub units_parsed: usize,
    /// Class files whose SourceFile value changed.
    pub units_rewritten: usize,
    /// Class files without a usable SourceFile attribute.
    pub units_without_source_file: usize,
    /// Non-class entries copied unchanged.
    pub resources_copied: usize,
    /// Nested containers rebuilt, the top-level file excluded.
    pub containers_rewritten: usize,
    /// Size of the output file.
    pub bytes_written: u64,
}

/// Runs the two-pass rewrite.
#[derive(Debug)]
pub struct Fixer {
    options: FixOptions,
    state: RunState,
}

impl Fixer {
    /// Creates a fixer.
    pub fn new(options: FixOptions) -> Self {
        Self {
            options,
            state: RunState::Init,
        }
    }

    /// Phase reached by the last run.
    ///
    /// After a failure this is the phase that failed.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Rewrites `input` into `output`.
    ///
    /// To overwrite the input itself use [`fix_in_place`](Self::fix_in_place).
    ///
    /// # Errors
    ///
    /// Any error aborts the run; `output` is then left untouched.
    pub fn run(&mut self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<FixReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        self.state = RunState::Init;
        let mut report = FixReport::default();

        self.state = RunState::Pass1Building;
        log::info!("pass 1: collecting classes from {}", input.display());
        let pool = self.build_pool(input, &mut report)?;
        log::info!(
            "pass 1: {} classes, {} rewritten, {} without SourceFile",
            report.units_parsed,
            report.units_rewritten,
            report.units_without_source_file
        );

        self.state = RunState::Pass2Writing;
        log::info!("pass 2: writing {}", output.display());
        self.write_output(input, output, &pool, &mut report)?;

        self.state = RunState::Closed;
        log::info!(
            "wrote {} ({} bytes, {} resources, {} nested containers)",
            output.display(),
            report.bytes_written,
            report.resources_copied,
            report.containers_rewritten
        );
        Ok(report)
    }

    /// Rewrites a file onto itself.
    ///
    /// The file is first copied to a temporary sibling with the same
    /// extension, which then serves as input. The copy is removed afterwards
    /// whether or not the run succeeds.
    pub fn fix_in_place(&mut self, path: impl AsRef<Path>) -> Result<FixReport> {
        let path = path.as_ref();
        let suffix = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let copy = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(parent_dir(path))?;
        fs::copy(path, copy.path())?;
        log::debug!("copied {} to {}", path.display(), copy.path().display());
        let result = self.run(copy.path(), path);
        let closed = copy.close();
        let report = result?;
        closed?;
        Ok(report)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.options.progress {
            Some(progress) if progress.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn record(&self, entry: &Entry) {
        if let Some(progress) = &self.options.progress {
            progress.record_entry(entry.size());
        }
    }

    fn start_pass(&self, pass: u8) {
        if let Some(progress) = &self.options.progress {
            progress.start_pass(pass);
        }
    }

    fn build_pool(&self, input: &Path, report: &mut FixReport) -> Result<UnitPool> {
        self.start_pass(1);
        let mut pool = UnitPool::new();
        for event in EntryStream::open(input)? {
            self.check_cancelled()?;
            let StreamEvent::Entry(entry) = event? else {
                continue;
            };
            self.record(&entry);
            if !entry.is_class() {
                continue;
            }
            let (class, rewritten) = self.patch(&entry, report)?;
            pool.insert(entry.key.clone(), entry.path.clone(), class, rewritten);
        }
        Ok(pool)
    }

    /// Parses a class entry and rewrites its SourceFile value.
    fn patch(&self, entry: &Entry, report: &mut FixReport) -> Result<(ClassFile, bool)> {
        let data = entry.data()?;
        let malformed = |source: ClassFormatError| Error::MalformedUnit {
            path: entry.path.to_string(),
            source,
        };
        let mut class = ClassFile::parse(&data).map_err(malformed)?;
        report.units_parsed += 1;

        let Some(current) = class.source_file() else {
            if let Some(index) = class.source_file_index() {
                log::warn!(
                    "{}: SourceFile constant #{} is not a decodable Utf8 string",
                    entry.path,
                    index
                );
            }
            report.units_without_source_file += 1;
            return Ok((class, false));
        };

        let replacement = self.options.policy.rewrite(class.name(), &current);
        if replacement == current {
            log::trace!("{}: SourceFile '{}' kept", entry.path, current);
            return Ok((class, false));
        }
        class.set_source_file(&replacement).map_err(malformed)?;
        log::debug!(
            "{}: SourceFile '{}' -> '{}'",
            entry.path,
            current,
            replacement
        );
        report.units_rewritten += 1;
        Ok((class, true))
    }

    fn write_output(
        &self,
        input: &Path,
        output: &Path,
        pool: &UnitPool,
        report: &mut FixReport,
    ) -> Result<()> {
        self.start_pass(2);
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent_dir(output))?;
        let mut tree = OutputTree {
            plan: WriterPlan::for_output(&file_name(output)),
            options: self.options.write.clone(),
            file: Some(BufWriter::new(temp)),
            root: None,
            nested: Vec::new(),
        };

        for event in EntryStream::open(input)? {
            self.check_cancelled()?;
            match event? {
                StreamEvent::Enter(container) => tree.enter(&container)?,
                StreamEvent::Entry(entry) => {
                    self.record(&entry);
                    if entry.is_class() {
                        let unit = pool.get(&entry.key).ok_or_else(|| Error::UnitNotPooled {
                            path: entry.path.to_string(),
                        })?;
                        if unit.rewritten {
                            tree.write_data(&entry, &unit.class.to_bytes())?;
                        } else {
                            tree.copy(&entry)?;
                        }
                    } else {
                        tree.copy(&entry)?;
                        report.resources_copied += 1;
                    }
                }
                StreamEvent::Leave(container) => {
                    if tree.leave(&container)? {
                        report.containers_rewritten += 1;
                    }
                }
            }
        }
        self.check_cancelled()?;

        let temp = tree.into_file()?;
        report.bytes_written = temp.as_file().metadata()?.len();
        temp.persist(output).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

type FileSink = BufWriter<NamedTempFile>;

/// Writers for the container levels currently open.
struct OutputTree {
    plan: WriterPlan,
    options: WriteOptions,
    /// The output file while no root archive writer owns it.
    file: Option<FileSink>,
    root: Option<ZipWriter<FileSink>>,
    nested: Vec<ZipWriter<Vec<u8>>>,
}

impl OutputTree {
    fn enter(&mut self, container: &Container) -> Result<()> {
        self.plan.wraps(&container.path)?;
        if container.path.is_root() {
            let file = self.take_file()?;
            let mut writer = ZipWriter::new(file).options(self.options.clone());
            writer.set_comment(container.comment.clone());
            self.root = Some(writer);
        } else {
            let mut writer = ZipWriter::new(Vec::new()).options(self.options.clone());
            writer.set_comment(container.comment.clone());
            self.nested.push(writer);
        }
        Ok(())
    }

    /// Closes the innermost level. Returns `true` for nested containers.
    fn leave(&mut self, container: &Container) -> Result<bool> {
        let location = container.path.to_string();
        if let Some(writer) = self.nested.pop() {
            let (result, bytes) = writer.finish_into_inner()?;
            let header = container.header.as_ref().ok_or_else(|| {
                Error::InvalidFormat(format!("nested container {} has no header", location))
            })?;
            log::debug!(
                "repacked {} ({} entries, {} bytes)",
                location,
                result.entries_written + result.directories_written,
                bytes.len()
            );
            self.write_packed(header, &bytes)
                .map_err(|e| e.in_container(&location))?;
            return Ok(true);
        }
        let writer = self.root.take().ok_or_else(|| {
            Error::InvalidFormat(format!("container {} closed twice", location))
        })?;
        let (_, file) = writer.finish_into_inner()?;
        self.file = Some(file);
        Ok(false)
    }

    /// Copies an entry as stored.
    fn copy(&mut self, entry: &Entry) -> Result<()> {
        match &entry.payload {
            Payload::Plain(data) => self.write_bare(data),
            Payload::Packed { header, raw } => {
                let result = match self.nested.last_mut() {
                    Some(writer) => writer.add_raw(header, raw),
                    None => self.root_writer()?.add_raw(header, raw),
                };
                result.map_err(|e| e.in_container(&entry.path.to_string()))
            }
        }
    }

    /// Writes an entry with new uncompressed contents.
    fn write_data(&mut self, entry: &Entry, data: &[u8]) -> Result<()> {
        match entry.header() {
            None => self.write_bare(data),
            Some(header) => self
                .write_packed(header, data)
                .map_err(|e| e.in_container(&entry.path.to_string())),
        }
    }

    fn write_packed(&mut self, header: &ZipEntry, data: &[u8]) -> Result<()> {
        match self.nested.last_mut() {
            Some(writer) => writer.add(header, data),
            None => self.root_writer()?.add(header, data),
        }
    }

    fn write_bare(&mut self, data: &[u8]) -> Result<()> {
        let mut file = self.take_file()?;
        file.write_all(data)?;
        self.file = Some(file);
        Ok(())
    }

    fn root_writer(&mut self) -> Result<&mut ZipWriter<FileSink>> {
        self.root
            .as_mut()
            .ok_or_else(|| Error::InvalidFormat("no open output archive".into()))
    }

    fn take_file(&mut self) -> Result<FileSink> {
        self.file
            .take()
            .ok_or_else(|| Error::InvalidFormat("output file is owned by an open archive".into()))
    }

    /// Returns the finished output file.
    fn into_file(mut self) -> Result<NamedTempFile> {
        if self.root.is_some() || !self.nested.is_empty() {
            return Err(Error::InvalidFormat("output archive was not closed".into()));
        }
        let file = self.take_file()?;
        let temp = file.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        temp.as_file().sync_all()?;
        Ok(temp)
    }
}

/// Directory holding `path`, `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Rewrites `input` into `output` with default options.
///
/// ```rust,no_run
/// let report = sourcefile_fixer::fix("in.aar", "out.aar")?;
/// assert!(report.units_rewritten <= report.units_parsed);
/// # Ok::<(), sourcefile_fixer::Error>(())
/// ```
pub fn fix(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<FixReport> {
    Fixer::new(FixOptions::default()).run(input, output)
}
