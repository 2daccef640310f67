// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/output.rs
// SPDX-FileType: SOURCE
// SPDX-License-Identifier: Apache-2.0
// -------------------------------------------------------------------------
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
// -------------------------------------------------------------------------
//! The partitioned IR output document.

use std::fmt::Write as _;

/// The three output regions of one compilation, concatenated in order:
/// constants, declarations, then function bodies.
#[derive(Debug, Default)]
pub struct IrOutput {
    /// String constants and class descriptor tables
    pub constants: String,
    /// Type definitions, globals, and external declarations
    pub declarations: String,
    /// Function bodies
    pub bodies: String,
}

impl IrOutput {
    /// Creates an empty output document.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Appends a line to the constants region.
    pub fn constant(&mut self, line: &str) {
        writeln!(self.constants, "{line}").expect("write to constants buffer");
    }

    /// Appends a line to the declarations region.
    pub fn declaration(&mut self, line: &str) {
        writeln!(self.declarations, "{line}").expect("write to declarations buffer");
    }

    /// Assembles the final document.
    #[must_use]
    pub fn assemble(&self) -> String {
        let mut document = String::with_capacity(
            self.constants.len() + self.declarations.len() + self.bodies.len() + 2,
        );
        document.push_str(&self.constants);
        if !self.constants.is_empty() {
            document.push('\n');
        }
        document.push_str(&self.declarations);
        if !self.declarations.is_empty() {
            document.push('\n');
        }
        document.push_str(&self.bodies);
        document
    }
}
