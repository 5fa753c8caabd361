//! Lazy walk over the entries of an input file.
//!
//! [`EntryStream`] opens the input file, unpacks nested containers as the
//! [`ReaderPlan`] dictates and yields a flat sequence of [`StreamEvent`]s:
//! every unpacked container is bracketed by `Enter`/`Leave`, and every other
//! entry is yielded once, in central directory order. Opening the same file
//! again yields the same sequence.
//!
//! ```rust,no_run
//! use sourcefile_fixer::stream::{EntryStream, StreamEvent};
//!
//! for event in EntryStream::open("app.zip")? {
//!     match event? {
//!         StreamEvent::Enter(container) => println!("enter {}", container.path),
//!         StreamEvent::Entry(entry) => println!("  {}", entry.path),
//!         StreamEvent::Leave(container) => println!("leave {}", container.path),
//!     }
//! }
//! # Ok::<(), sourcefile_fixer::Error>(())
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::archive_path::NestedPath;
use crate::container::{ContainerKind, ReaderPlan};
use crate::read::{ZipArchive, ZipEntry};
use crate::Result;

/// Suffix of class file entries.
pub const CLASS_SUFFIX: &str = ".class";

/// Object-safe `Read + Seek`.
pub(crate) trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

type DynArchive = ZipArchive<Box<dyn ReadSeek>>;

/// Position of an entry in the input: its central directory index at every
/// nesting level, outermost first.
///
/// Unlike a [`NestedPath`], a key stays unique when a container lists the
/// same entry name twice. A top-level file that is not a container has the
/// empty key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(Vec<usize>);

impl EntryKey {
    /// Key of the entry at `index` inside the container keyed `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    /// The central directory indices, outermost first.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// An unpacked container.
#[derive(Debug, Clone)]
pub struct Container {
    /// Location of the container; the input file itself for the root.
    pub path: NestedPath,
    /// Position of the container; empty for the root.
    pub key: EntryKey,
    /// The stage kind that unpacked it.
    pub kind: ContainerKind,
    /// Header of the entry holding the container, `None` for the root.
    pub header: Option<ZipEntry>,
    /// The archive comment.
    pub comment: Vec<u8>,
}

/// Payload of an [`Entry`].
#[derive(Debug, Clone)]
pub enum Payload {
    /// Uncompressed bytes of a top-level file that is not a container.
    Plain(Vec<u8>),
    /// A zip entry as stored.
    Packed {
        /// The entry header, with its local extra field.
        header: ZipEntry,
        /// The compressed payload.
        raw: Vec<u8>,
    },
}

/// A non-container entry.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Location of the entry.
    pub path: NestedPath,
    /// Position of the entry.
    pub key: EntryKey,
    /// The entry bytes.
    pub payload: Payload,
}

impl Entry {
    /// Name of the entry inside its container.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// The zip header, `None` for a top-level file.
    pub fn header(&self) -> Option<&ZipEntry> {
        match &self.payload {
            Payload::Plain(_) => None,
            Payload::Packed { header, .. } => Some(header),
        }
    }

    /// Returns `true` for directory entries.
    pub fn is_directory(&self) -> bool {
        self.header().is_some_and(ZipEntry::is_directory)
    }

    /// Returns `true` for class file entries.
    pub fn is_class(&self) -> bool {
        !self.is_directory() && self.name().ends_with(CLASS_SUFFIX)
    }

    /// Uncompressed size as recorded in the header.
    pub fn size(&self) -> u64 {
        match &self.payload {
            Payload::Plain(data) => data.len() as u64,
            Payload::Packed { header, .. } => u64::from(header.uncompressed_size),
        }
    }

    /// Uncompressed entry bytes, CRC-checked.
    pub fn data(&self) -> Result<Cow<'_, [u8]>> {
        match &self.payload {
            Payload::Plain(data) => Ok(Cow::Borrowed(data)),
            Payload::Packed { header, raw } => header
                .decompress(raw)
                .map(Cow::Owned)
                .map_err(|e| e.in_container(&self.path.to_string())),
        }
    }
}

/// One step of an [`EntryStream`].
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A container was unpacked; its entries follow.
    Enter(Container),
    /// A non-container entry.
    Entry(Entry),
    /// All entries of the container have been yielded.
    Leave(Container),
}

struct Frame {
    archive: DynArchive,
    container: Container,
    next: usize,
    stage: usize,
}

/// Iterator over the events of one input file.
///
/// After the first error the stream yields `None`.
pub struct EntryStream {
    plan: ReaderPlan,
    stack: Vec<Frame>,
    pending: Option<StreamEvent>,
    done: bool,
}

impl std::fmt::Debug for EntryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStream")
            .field("plan", &self.plan)
            .field("depth", &self.stack.len())
            .field("done", &self.done)
            .finish()
    }
}

impl EntryStream {
    /// Opens an input file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be read,
    /// or [`Error::MalformedContainer`](crate::Error::MalformedContainer)
    /// if it should be a container but is not a readable zip archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(file_name(path), BufReader::new(file))
    }

    /// Walks `reader` as if it were a file named `file_name`.
    pub fn from_reader<R>(file_name: impl Into<String>, mut reader: R) -> Result<Self>
    where
        R: Read + Seek + 'static,
    {
        let root = NestedPath::root(file_name);
        let plan = ReaderPlan::for_input(root.name());

        let Some(stage) = plan.unpacking_stage(root.name(), true, 0) else {
            let mut data = Vec::new();
            reader.seek(SeekFrom::Start(0))?;
            reader.read_to_end(&mut data)?;
            log::debug!("{} is not a container, treating it as a single entry", root);
            return Ok(Self {
                plan,
                stack: Vec::new(),
                pending: Some(StreamEvent::Entry(Entry {
                    path: root,
                    key: EntryKey::default(),
                    payload: Payload::Plain(data),
                })),
                done: false,
            });
        };

        let reader: Box<dyn ReadSeek> = Box::new(reader);
        let archive = ZipArchive::open(reader).map_err(|e| e.in_container(&root.to_string()))?;
        let container = Container {
            path: root,
            key: EntryKey::default(),
            kind: plan.stages()[stage].kind,
            header: None,
            comment: archive.comment().to_vec(),
        };
        Ok(Self {
            pending: Some(StreamEvent::Enter(container.clone())),
            stack: vec![Frame {
                archive,
                container,
                next: 0,
                stage,
            }],
            plan,
            done: false,
        })
    }

    /// The plan deciding which entries are unpacked.
    pub fn plan(&self) -> &ReaderPlan {
        &self.plan
    }

    fn step(&mut self) -> Option<Result<StreamEvent>> {
        let frame = self.stack.last_mut()?;
        if frame.next >= frame.archive.len() {
            let frame = self.stack.pop()?;
            return Some(Ok(StreamEvent::Leave(frame.container)));
        }
        let index = frame.next;
        frame.next += 1;
        Some(self.read_entry(index))
    }

    fn read_entry(&mut self, index: usize) -> Result<StreamEvent> {
        let Some(frame) = self.stack.last_mut() else {
            return Err(crate::Error::InvalidFormat("no open container".into()));
        };
        let parent = &frame.container.path;
        let mut header = frame.archive.entries()[index].clone();
        let path = parent.child(header.name.as_str());
        let key = frame.container.key.child(index);
        let raw = frame
            .archive
            .read_raw(index)
            .map_err(|e| e.in_container(&parent.to_string()))?;
        header.local_extra_field = raw.local_extra_field;

        let start = frame.stage + 1;
        let Some(stage) = self.plan.unpacking_stage(header.name.as_str(), false, start) else {
            return Ok(StreamEvent::Entry(Entry {
                path,
                key,
                payload: Payload::Packed {
                    header,
                    raw: raw.data,
                },
            }));
        };

        let location = path.to_string();
        let data = header
            .decompress(&raw.data)
            .map_err(|e| e.in_container(&location))?;
        let reader: Box<dyn ReadSeek> = Box::new(Cursor::new(data));
        let archive = ZipArchive::open(reader).map_err(|e| e.in_container(&location))?;
        let kind = self.plan.stages()[stage].kind;
        log::debug!(
            "unpacking {} container {} ({} entries)",
            kind,
            location,
            archive.len()
        );
        let container = Container {
            path,
            key,
            kind,
            header: Some(header),
            comment: archive.comment().to_vec(),
        };
        self.stack.push(Frame {
            archive,
            container: container.clone(),
            next: 0,
            stage,
        });
        Ok(StreamEvent::Enter(container))
    }
}

impl Iterator for EntryStream {
    type Item = Result<StreamEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(event) = self.pending.take() {
            return Some(Ok(event));
        }
        match self.step() {
            None => {
                self.done = true;
                None
            }
            Some(Err(e)) => {
                self.done = true;
                self.stack.clear();
                Some(Err(e))
            }
            Some(ok) => Some(ok),
        }
    }
}

impl std::iter::FusedIterator for EntryStream {}

/// Last path component, used as the name of the root level.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
