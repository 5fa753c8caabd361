//! SourceFile rewriting policy.
//!
//! After identifier obfuscation the `SourceFile` attribute of a class either
//! leaks the original source name or no longer matches the renamed class.
//! [`SourceFilePolicy::rewrite`] derives a new value from the class name,
//! following the conventions of the source language the value names:
//!
//! | Current value | New value |
//! |---------------|-----------|
//! | ends with a primary suffix (`.java`) | outer class short name + that suffix |
//! | ends with a loose suffix (`.kt`) | short name if it has at most `threshold` characters, otherwise unchanged |
//! | anything else | short name, no suffix |
//!
//! The outer class name is the short name up to its first `$`, except that a
//! `$` in first position does not start an inner segment: `com/$Proxy` with
//! `X.java` becomes `$Proxy.java` rather than the bare suffix `.java` that
//! plain truncation at the first `$` would give.
//!
//! # Example
//!
//! ```rust
//! use sourcefile_fixer::SourceFilePolicy;
//!
//! let policy = SourceFilePolicy::default();
//! assert_eq!(policy.rewrite("com/a/Foo$Bar", "Original.java"), "Foo.java");
//! assert_eq!(policy.rewrite("com/a/b", "Helpers.kt"), "b");
//! assert_eq!(policy.rewrite("com/a/LongClassName", "Helpers.kt"), "Helpers.kt");
//! assert_eq!(policy.rewrite("com/a/c", "Foo.scala"), "c");
//! ```

/// Default maximum length of a short class name that counts as obfuscated.
pub const DEFAULT_SHORT_NAME_THRESHOLD: usize = 3;

/// Separator between an outer and an inner class name.
pub const INNER_CLASS_SEPARATOR: char = '$';

/// Default suffix of languages with one source file per top-level class.
pub const DEFAULT_PRIMARY_SUFFIX: &str = ".java";

/// Default suffix of languages whose source files need not match class names.
pub const DEFAULT_LOOSE_SUFFIX: &str = ".kt";

/// How SourceFile values are rewritten.
///
/// Suffix matching is case-sensitive. Primary suffixes are checked before
/// loose ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilePolicy {
    /// Suffixes whose files hold one top-level class each.
    pub primary_suffixes: Vec<String>,
    /// Suffixes whose files may hold unrelated classes.
    pub loose_suffixes: Vec<String>,
    /// Short names up to this many characters are treated as obfuscated.
    pub short_name_threshold: usize,
}

impl Default for SourceFilePolicy {
    fn default() -> Self {
        Self {
            primary_suffixes: vec![DEFAULT_PRIMARY_SUFFIX.to_string()],
            loose_suffixes: vec![DEFAULT_LOOSE_SUFFIX.to_string()],
            short_name_threshold: DEFAULT_SHORT_NAME_THRESHOLD,
        }
    }
}

impl SourceFilePolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the short name threshold.
    pub fn short_name_threshold(mut self, threshold: usize) -> Self {
        self.short_name_threshold = threshold;
        self
    }

    /// Replaces the primary suffixes.
    pub fn primary_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the loose suffixes.
    ///
    /// With no loose suffixes, values such as `Foo.kt` fall through to the
    /// generic rule and always become the bare short name.
    pub fn loose_suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.loose_suffixes = suffixes.into_iter().map(Into::into).collect();
        self
    }

    /// Computes the new SourceFile value for the class `class_name`.
    ///
    /// `class_name` may use `/` or `.` as package separator.
    pub fn rewrite(&self, class_name: &str, current: &str) -> String {
        let short = short_name(class_name);

        if let Some(suffix) = self.primary_suffixes.iter().find(|s| current.ends_with(s.as_str())) {
            let outer = outer_class_name(short);
            // The suffix starts at the last dot of the current value.
            let ext = current
                .rfind('.')
                .map_or(suffix.as_str(), |dot| &current[dot..]);
            return format!("{}{}", outer, ext);
        }

        if self.loose_suffixes.iter().any(|s| current.ends_with(s.as_str())) {
            return if short.chars().count() <= self.short_name_threshold {
                short.to_string()
            } else {
                current.to_string()
            };
        }

        short.to_string()
    }
}

/// The unqualified name: everything after the last `/` or `.`.
///
/// ```
/// use sourcefile_fixer::heuristic::short_name;
///
/// assert_eq!(short_name("com/a/Foo$Bar"), "Foo$Bar");
/// assert_eq!(short_name("com.a.Foo"), "Foo");
/// assert_eq!(short_name("Foo"), "Foo");
/// ```
pub fn short_name(class_name: &str) -> &str {
    class_name
        .rfind(['/', '.'])
        .map_or(class_name, |idx| &class_name[idx + 1..])
}

/// Strips inner class segments from a short name.
///
/// A separator in first position is part of the name, not a nesting marker.
fn outer_class_name(short: &str) -> &str {
    match short.find(INNER_CLASS_SEPARATOR) {
        Some(idx) if idx > 0 => &short[..idx],
        _ => short,
    }
}
