// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The graph assembler (component C12) and the resolved entity model it produces.

mod assemble;
pub mod resolve;

pub use assemble::{assemble, AssembleOptions, BinaryArtifact, ModulesGraph};
pub use resolve::{ResolvedDependency, ResolvedModule, ResolvedPackage, ResolvedProduct};
