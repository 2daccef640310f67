// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/error.rs
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
//! Error types for code generation.

use std::error::Error;
use std::fmt;

use ladon_source::types::Position;

/// Error type for code generation errors.
#[derive(Debug)]
pub enum CodeGenError {
    /// A node reached emission without being resolved
    Unresolved {
        /// Description of the unresolved reference
        message: String,
        /// Source location
        position: Position,
    },

    /// Error while mapping a type to its IR representation
    TypeMapping {
        /// Description of the error
        message: String,
    },

    /// Internal invariant violation; must never fire on well-resolved input
    Internal {
        /// Description of the violated invariant
        message: String,
    },
}

impl CodeGenError {
    /// Creates a new unresolved-reference error.
    pub fn unresolved(message: impl Into<String>, position: Position) -> Self {
        CodeGenError::Unresolved { message: message.into(), position }
    }

    /// Creates a new type-mapping error.
    pub fn type_mapping(message: impl Into<String>) -> Self {
        CodeGenError::TypeMapping { message: message.into() }
    }

    /// Creates a new internal invariant violation.
    pub fn internal(message: impl Into<String>) -> Self {
        CodeGenError::Internal { message: message.into() }
    }
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Unresolved { message, position } => {
                write!(f, "unresolved reference: {message}")?;
                if !position.is_synthetic() {
                    write!(f, " at {position}")?;
                }
                Ok(())
            }
            CodeGenError::TypeMapping { message } => {
                write!(f, "type mapping error: {message}")
            }
            CodeGenError::Internal { message } => {
                write!(f, "internal code generation error: {message}")
            }
        }
    }
}

impl Error for CodeGenError {}

/// Result type for code generation operations.
pub type CodeGenResult<T> = Result<T, CodeGenError>;
