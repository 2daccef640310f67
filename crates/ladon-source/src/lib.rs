//! Source file handling and position tracking for the Ladon compiler.
//!
//! This crate provides the fundamental types for locating language constructs
//! in source code. Every declaration, statement, and expression in the Ladon
//! AST carries a [`types::Position`]; nodes synthesized by the desugaring
//! front end carry the synthetic position instead.
//!
//! The [`types::SourceManager`] maps file identifiers back to file names so
//! diagnostics can be anchored to `file:line:column` without threading path
//! strings through the whole pipeline.

pub mod types;
