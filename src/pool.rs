//! Patched class files collected by the first pass.

use std::collections::HashMap;

use crate::archive_path::NestedPath;
use crate::classfile::ClassFile;
use crate::stream::EntryKey;

/// A class file held by the pool.
#[derive(Debug, Clone)]
pub struct PooledUnit {
    /// Location of the class in the input.
    pub location: NestedPath,
    /// The class, with its SourceFile value already rewritten.
    pub class: ClassFile,
    /// Whether the SourceFile value changed.
    pub rewritten: bool,
}

impl PooledUnit {
    /// Internal name of the class.
    pub fn class_name(&self) -> &str {
        self.class.name()
    }
}

/// Class files of one run, keyed by their position in the input.
///
/// Keying by position rather than by class name keeps classes with the same
/// name apart, such as multi-release variants under `META-INF/versions/` or
/// the same library packed twice in different nested jars. Entries that
/// share a name inside one container stay apart as well.
#[derive(Debug, Default)]
pub struct UnitPool {
    units: HashMap<EntryKey, PooledUnit>,
}

impl UnitPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class found at `key`, returning the unit previously pooled
    /// there.
    pub fn insert(
        &mut self,
        key: EntryKey,
        location: NestedPath,
        class: ClassFile,
        rewritten: bool,
    ) -> Option<PooledUnit> {
        self.units.insert(
            key,
            PooledUnit {
                location,
                class,
                rewritten,
            },
        )
    }

    /// Looks up the class found at `key`.
    pub fn get(&self, key: &EntryKey) -> Option<&PooledUnit> {
        self.units.get(key)
    }

    /// Number of pooled classes.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if no class was pooled.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Locations of all classes with the given internal name.
    pub fn locations_of<'a>(&'a self, class_name: &'a str) -> impl Iterator<Item = &'a NestedPath> {
        self.units
            .values()
            .filter(move |unit| unit.class_name() == class_name)
            .map(|unit| &unit.location)
    }

    /// Number of pooled classes whose SourceFile value changed.
    pub fn rewritten_count(&self) -> usize {
        self.units.values().filter(|unit| unit.rewritten).count()
    }
}
