//! Type definitions for source code positions.
//!
//! This module defines the core types used for representing source code
//! locations in the Ladon compiler. A [`Position`] is a `(file, line, column)`
//! triple; nodes created by the desugaring front end carry the *synthetic*
//! position, which belongs to no file.
//!
//! Key types include:
//!
//! - `FileID`: A unique identifier for a source file
//! - `Position`: A specific location in source code
//! - `SourceFile`: A source file together with its content
//! - `SourceManager`: Registry of all source files of a compilation

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;

/// A unique identifier for a source file.
///
/// `FileID` is a newtype wrapper around `usize` that uniquely identifies a
/// source file within a [`SourceManager`]. The value 0 is reserved for the
/// synthetic file that desugared nodes belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileID(usize);

impl FileID {
    /// The reserved identifier for synthetic positions.
    pub const SYNTHETIC: Self = Self(0);

    /// Creates a new `FileID` with the given value.
    #[must_use]
    pub const fn new(id: usize) -> Self { Self(id) }

    /// Returns the inner value of the `FileID`.
    #[must_use]
    pub const fn value(&self) -> usize { self.0 }
}

impl fmt::Display for FileID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "file:{}", self.0) }
}

/// A position in a source file.
///
/// Positions are 1-indexed for line and column, following common editor
/// conventions. Nodes synthesized during desugaring carry
/// [`Position::synthetic`], which compares equal to itself and renders as `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// The file this position belongs to
    pub file: FileID,
    /// Line number (1-indexed, 0 for synthetic positions)
    pub line: usize,
    /// Column number (1-indexed, 0 for synthetic positions)
    pub column: usize,
}

impl Position {
    /// Creates a new position with the given file, line, and column.
    #[must_use]
    pub const fn new(file: FileID, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    /// Creates the empty position carried by synthesized nodes.
    #[must_use]
    pub const fn synthetic() -> Self { Self { file: FileID::SYNTHETIC, line: 0, column: 0 } }

    /// Returns true if this position belongs to no source file.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool { self.file.value() == 0 }
}

impl Default for Position {
    fn default() -> Self { Self::synthetic() }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "-")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// A source file registered with the compilation.
///
/// The compiler core never reads file contents itself; files are read by the
/// driver before AST building. The content is kept here so diagnostics can
/// quote the offending line.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Identifier of the file
    pub id: FileID,
    /// Name of the file (usually a path)
    pub name: String,
    /// Path to the file, if available
    pub path: Option<PathBuf>,
    /// Content of the file
    pub content: String,
}

impl SourceFile {
    /// Creates a new source file with the given ID, name, and content.
    #[must_use]
    pub const fn new(id: FileID, name: String, content: String) -> Self {
        Self { id, name, path: None, content }
    }

    /// Creates a new source file with the given ID, name, path, and content.
    #[must_use]
    pub const fn with_path(id: FileID, name: String, path: PathBuf, content: String) -> Self {
        Self { id, name, path: Some(path), content }
    }

    /// Returns the 1-indexed line of text at the given position, if present.
    #[must_use]
    pub fn line_at(&self, position: Position) -> Option<&str> {
        if position.line == 0 {
            return None;
        }
        self.content.lines().nth(position.line - 1)
    }
}

/// A registry of source files.
///
/// The `SourceManager` keeps track of all source files of a compilation and
/// assigns unique [`FileID`]s to them. ID 0 is never handed out; it is the
/// synthetic file.
#[derive(Debug, Default, Clone)]
pub struct SourceManager {
    /// Map from `FileID` to `SourceFile`
    files: FxHashMap<FileID, SourceFile>,
    /// Next available file ID
    next_id: usize,
}

impl SourceManager {
    /// Creates a new empty `SourceManager`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: FxHashMap::default(),
            next_id: 1, // Start from 1, reserve 0 for synthetic positions
        }
    }

    /// Adds a new source file and returns its `FileID`.
    pub fn add_file(&mut self, name: String, content: String) -> FileID {
        let id = FileID::new(self.next_id);
        self.next_id += 1;

        let file = SourceFile::new(id, name, content);
        drop(self.files.insert(id, file));

        id
    }

    /// Adds a new source file with a path and returns its `FileID`.
    pub fn add_file_with_path(&mut self, name: String, path: PathBuf, content: String) -> FileID {
        let id = FileID::new(self.next_id);
        self.next_id += 1;

        let file = SourceFile::with_path(id, name, path, content);
        drop(self.files.insert(id, file));

        id
    }

    /// Returns the source file with the given ID, if it exists.
    #[must_use]
    pub fn get_file(&self, id: FileID) -> Option<&SourceFile> { self.files.get(&id) }

    /// Renders a position as `name:line:column` for diagnostics.
    ///
    /// Synthetic positions render as `<synthesized>`.
    #[must_use]
    pub fn describe(&self, position: Position) -> String {
        if position.is_synthetic() {
            return "<synthesized>".to_string();
        }

        match self.get_file(position.file) {
            Some(file) => format!("{}:{}:{}", file.name, position.line, position.column),
            None => format!("{}:{}:{}", position.file, position.line, position.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_position_is_recognized() {
        assert!(Position::synthetic().is_synthetic());
        assert!(!Position::new(FileID::new(1), 3, 7).is_synthetic());
    }

    #[test]
    fn manager_assigns_ids_from_one() {
        let mut manager = SourceManager::new();
        let id = manager.add_file("main.ld".to_string(), "class A:\n    pass\n".to_string());
        assert_eq!(id.value(), 1);
        assert_eq!(manager.get_file(id).unwrap().name, "main.ld");
    }

    #[test]
    fn describe_renders_file_and_position() {
        let mut manager = SourceManager::new();
        let id = manager.add_file("main.ld".to_string(), String::new());
        let position = Position::new(id, 4, 2);
        assert_eq!(manager.describe(position), "main.ld:4:2");
        assert_eq!(manager.describe(Position::synthetic()), "<synthesized>");
    }
}
