//! Effective classpath assembly.
//!
//! - [`plugin`] — locates the plugin among the known plugins and resolves its
//!   transitive runtime dependencies.
//! - [`realm`] — registers project sources, project classpath, plugin
//!   dependencies and the plugin itself, then reads them back in order.
//! - [`aggregate`] — merges the project's test/compile classpath with the realm.
//! - [`coverage`] — build outputs plus same-group dependencies, for coverage scope.

pub mod aggregate;
pub mod coverage;
pub mod plugin;
pub mod realm;

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::ClasspathEntry;

/// Duplicate-free classpath in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OrderedClasspath {
    entries: Vec<ClasspathEntry>,
    #[serde(skip)]
    seen: HashSet<PathBuf>,
}

impl OrderedClasspath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless an equal path is already present.
    pub fn push(&mut self, entry: ClasspathEntry) -> bool {
        if self.seen.insert(entry.normalized()) {
            self.entries.push(entry);
            true
        } else {
            false
        }
    }

    /// Parse and append each element; malformed elements are logged and skipped.
    pub fn extend_elements<I, S>(&mut self, elements: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for element in elements {
            match ClasspathEntry::parse(element.as_ref()) {
                Ok(entry) => {
                    self.push(entry);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }
    }

    pub fn extend_from(&mut self, other: &OrderedClasspath) {
        for entry in &other.entries {
            self.push(entry.clone());
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClasspathEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }

    /// Entries joined with the platform path separator (`:` or `;`).
    pub fn to_path_string(&self) -> String {
        let sep = if cfg!(windows) { ";" } else { ":" };
        self.to_strings().join(sep)
    }
}

impl<'a> IntoIterator for &'a OrderedClasspath {
    type Item = &'a ClasspathEntry;
    type IntoIter = std::slice::Iter<'a, ClasspathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for OrderedClasspath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.to_strings().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_first_occurrence() {
        let mut cp = OrderedClasspath::new();
        cp.extend_elements(["/a", "/b", "/a/../a", "/c", "/b"]);
        assert_eq!(cp.to_strings(), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_extend_skips_malformed_elements() {
        let mut cp = OrderedClasspath::new();
        cp.extend_elements(["/a", "", "/b"]);
        assert_eq!(cp.to_strings(), vec!["/a", "/b"]);
    }

    #[test]
    fn test_relative_and_absolute_spellings_collide() {
        let cwd = std::env::current_dir().unwrap();
        let absolute = cwd.join("lib").join("x.jar");

        let mut cp = OrderedClasspath::new();
        cp.extend_elements(["lib/x.jar"]);
        cp.extend_elements([absolute.to_str().unwrap()]);
        assert_eq!(cp.len(), 1);
        assert_eq!(cp.to_strings(), vec!["lib/x.jar"]);
    }

    #[test]
    fn test_path_string() {
        let mut cp = OrderedClasspath::new();
        cp.extend_elements(["/a", "/b"]);
        let sep = if cfg!(windows) { ";" } else { ":" };
        assert_eq!(cp.to_path_string(), format!("/a{}/b", sep));
    }
}
