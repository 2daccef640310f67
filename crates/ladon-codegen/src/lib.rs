// -------------------------------------------------------------------------
// SPDX-FileCopyrightText: Copyright © 2025 The Ladon Project
// SPDX-FileName: crates/ladon-codegen/src/lib.rs
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
//! Textual LLVM-style IR backend for the Ladon compiler.
//!
//! The backend walks a fully resolved AST in evaluation order and emits a
//! single textual IR document with three regions (constants, declarations,
//! function bodies). Expression results travel on an explicit evaluation
//! value stack; generator bodies become indirect-branch state machines;
//! generic classes emit once per monomorphic variation.
//!
//! The main components are:
//! - `CodeGenerator`: drives the AST walk and owns all emission state
//! - `FunctionFrame`: per-function emission buffers and label bookkeeping
//! - `ValueStack`: the explicit evaluation value stack
//! - `mangle` / `types`: deterministic symbol names and IR type mapping

mod classes;
mod context;
mod error;
mod expressions;
mod functions;
mod mangle;
mod output;
mod stack;
mod statements;
mod types;
mod visitor;

pub use context::{CodeGenerator, FunctionFrame};
pub use error::{CodeGenError, CodeGenResult};
pub use output::IrOutput;
pub use stack::{StackValue, ValueStack};
