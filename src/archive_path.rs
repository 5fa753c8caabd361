//! Entry names and nesting paths.
//!
//! An [`EntryName`] is the name of one entry inside one container, exactly as
//! it is stored in the zip central directory. A [`NestedPath`] locates an
//! entry across nesting levels, starting with the input file itself.

use crate::{Error, Result};
use std::fmt;

/// Separator used when displaying nested paths, as in `jar:` URLs.
pub const NESTING_SEPARATOR: &str = "!/";

/// The name of an entry inside a container.
///
/// Zip entry names use forward slashes; directory entries end with `/`.
/// Unlike extraction paths, names are never normalized here: the rewriter
/// must write them back exactly as read. Only empty names and names with
/// NUL bytes are rejected.
///
/// # Examples
///
/// ```
/// use sourcefile_fixer::EntryName;
///
/// let name = EntryName::new("libs/classes.jar").unwrap();
/// assert_eq!(name.file_name(), "classes.jar");
/// assert_eq!(name.extension(), Some("jar"));
/// assert!(EntryName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryName(String);

impl EntryName {
    /// Creates a new `EntryName`, validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a NUL byte.
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidEntryName("empty name".into()));
        }
        if s.contains('\0') {
            return Err(Error::InvalidEntryName(format!(
                "'{}' contains NUL byte",
                s.escape_debug()
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this names a directory entry.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the last segment of the name.
    ///
    /// For directory entries the trailing slash is ignored.
    pub fn file_name(&self) -> &str {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Returns the parent directory inside the container, if any.
    pub fn parent(&self) -> Option<&str> {
        let trimmed = self.0.trim_end_matches('/');
        trimmed.rfind('/').map(|idx| &trimmed[..idx])
    }

    /// Returns the file extension, if any.
    ///
    /// The extension is the portion of the file name after the last `.`.
    /// Returns `None` if there is no extension, or if the file name starts
    /// with a dot (e.g., `.gitignore` has no extension).
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.file_name();
        let dot_pos = file_name.rfind('.')?;
        if dot_pos == 0 {
            None
        } else {
            Some(&file_name[dot_pos + 1..])
        }
    }

    /// Case-sensitive suffix test on the full name.
    #[inline]
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for EntryName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Location of an entry across container nesting levels.
///
/// The first segment is the input file name, every following segment is an
/// entry name inside the container named by the previous segment. Displayed
/// with `!/` separators: `app.zip!/libs/a.aar!/classes.jar!/com/Foo.class`.
///
/// ```
/// use sourcefile_fixer::NestedPath;
///
/// let root = NestedPath::root("app.zip");
/// let inner = root.child("libs/a.aar").child("classes.jar");
/// assert_eq!(inner.depth(), 2);
/// assert_eq!(inner.to_string(), "app.zip!/libs/a.aar!/classes.jar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NestedPath(Vec<String>);

impl NestedPath {
    /// Creates the path of the input file itself.
    pub fn root(file_name: impl Into<String>) -> Self {
        Self(vec![file_name.into()])
    }

    /// Returns the path of an entry inside the container at `self`.
    pub fn child(&self, entry_name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(entry_name.into());
        Self(segments)
    }

    /// Number of containers between the input file and this entry.
    ///
    /// The input file itself has depth 0.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// Returns `true` for the input file itself.
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// The last segment.
    pub fn name(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Path of the enclosing container, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Iterates over the segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for NestedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(NESTING_SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}
