//! Container kinds and the unpack/rewrap plans.
//!
//! Jar, aar and zip files are all zip archives; they differ only by
//! extension and by which of them get unpacked when nested in each other.
//! Which entries are opened is decided purely by name:
//!
//! * [`ReaderPlan`] is an ordered table of unpack stages, outer to inner.
//!   A nested container is only tested against the stages after the one
//!   that unpacked its parent, so a jar inside an aar is opened while a zip
//!   inside a zip is copied as an opaque resource.
//! * [`WriterPlan`] is the mirrored table used when writing. It checks that
//!   every container the reader opened can be packed back up to the output
//!   file.

use std::fmt;

use crate::archive_path::NestedPath;
use crate::{Error, Result};

/// A kind of zip-based container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Java archive (`.jar`).
    Jar,
    /// Android library archive (`.aar`).
    Aar,
    /// Plain zip archive (`.zip`).
    Zip,
}

impl ContainerKind {
    /// All kinds, in classification order.
    pub const ALL: [Self; 3] = [Self::Jar, Self::Aar, Self::Zip];

    /// The file extension, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jar => ".jar",
            Self::Aar => ".aar",
            Self::Zip => ".zip",
        }
    }

    /// Classifies a file or entry name by its extension.
    ///
    /// Matching is case-sensitive; jar is checked first, then aar, then zip.
    ///
    /// ```
    /// use sourcefile_fixer::ContainerKind;
    ///
    /// assert_eq!(ContainerKind::classify("libs/a.aar"), Some(ContainerKind::Aar));
    /// assert_eq!(ContainerKind::classify("App.JAR"), None);
    /// assert_eq!(ContainerKind::classify("com/Foo.class"), None);
    /// ```
    pub fn classify(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| name.ends_with(kind.extension()))
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jar => write!(f, "jar"),
            Self::Aar => write!(f, "aar"),
            Self::Zip => write!(f, "zip"),
        }
    }
}

/// Whether a stage applies to the top-level file or to nested entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageScope {
    /// The input or output file itself is of this kind.
    Own,
    /// Entries named with this kind's extension.
    Nested,
}

/// One unpack or rewrap stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    /// Container kind handled by the stage.
    pub kind: ContainerKind,
    /// What the stage applies to.
    pub scope: StageScope,
}

impl Stage {
    const fn own(kind: ContainerKind) -> Self {
        Self {
            kind,
            scope: StageScope::Own,
        }
    }

    const fn nested(kind: ContainerKind) -> Self {
        Self {
            kind,
            scope: StageScope::Nested,
        }
    }
}

/// Decides which entries of the input get unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderPlan {
    stages: Vec<Stage>,
}

impl ReaderPlan {
    /// Builds the plan for an input file name.
    ///
    /// | Input | Stages, outer to inner |
    /// |-------|------------------------|
    /// | `*.jar` | own jar |
    /// | `*.aar` | own aar, nested jar |
    /// | `*.zip` | own zip, nested aar, nested jar |
    /// | other | nested zip, nested aar, nested jar |
    pub fn for_input(file_name: &str) -> Self {
        use ContainerKind::*;
        let stages = match ContainerKind::classify(file_name) {
            Some(Jar) => vec![Stage::own(Jar)],
            Some(Aar) => vec![Stage::own(Aar), Stage::nested(Jar)],
            Some(Zip) => vec![Stage::own(Zip), Stage::nested(Aar), Stage::nested(Jar)],
            None => vec![Stage::nested(Zip), Stage::nested(Aar), Stage::nested(Jar)],
        };
        Self { stages }
    }

    /// The stages, outer to inner.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Finds the stage that unpacks an entry.
    ///
    /// `start` is the index after the stage that unpacked the entry's
    /// container (0 for the input file). Own stages only match the input
    /// file itself, nested stages only match non-directory entries whose
    /// name ends with the stage's extension.
    pub fn unpacking_stage(&self, name: &str, is_root: bool, start: usize) -> Option<usize> {
        let is_directory = name.ends_with('/');
        self.stages
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, stage)| match stage.scope {
                StageScope::Own => is_root,
                StageScope::Nested => {
                    !is_root && !is_directory && name.ends_with(stage.kind.extension())
                }
            })
            .map(|(index, _)| index)
    }
}

/// Decides how containers are packed back into the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterPlan {
    stages: Vec<Stage>,
}

impl WriterPlan {
    /// Builds the plan for an output file name.
    ///
    /// Stages run entry-first: jar, then aar, then zip. Each is an own stage
    /// if the output file has that kind, otherwise it only packs containers
    /// named with its extension.
    pub fn for_output(file_name: &str) -> Self {
        let own = ContainerKind::classify(file_name);
        let stages = [ContainerKind::Jar, ContainerKind::Aar, ContainerKind::Zip]
            .into_iter()
            .map(|kind| {
                if own == Some(kind) {
                    Stage::own(kind)
                } else {
                    Stage::nested(kind)
                }
            })
            .collect();
        Self { stages }
    }

    /// The stages, entry-first.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Checks that entries of the container at `container` can be packed
    /// back up through every enclosing level.
    ///
    /// Each stage packs the innermost remaining container if it is an own
    /// stage or the container's name has the stage's extension. All levels
    /// must be packed once the stages are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedNesting`] naming the first level no stage
    /// packs.
    pub fn wraps(&self, container: &NestedPath) -> Result<()> {
        let levels: Vec<&str> = container.segments().collect();
        let mut remaining = levels.len();
        for stage in &self.stages {
            let Some(level) = remaining.checked_sub(1).map(|i| levels[i]) else {
                break;
            };
            if stage.scope == StageScope::Own || level.ends_with(stage.kind.extension()) {
                remaining -= 1;
            }
        }
        if remaining == 0 {
            return Ok(());
        }
        Err(Error::UnsupportedNesting {
            path: container.to_string(),
            reason: format!(
                "no output stage packs '{}' ({} of {} levels left)",
                levels[remaining - 1],
                remaining,
                levels.len()
            ),
        })
    }
}
