// Copyright (c) The pkggraph Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A structured, append-only diagnostic bus with scoped contextual metadata.
//!
//! Every diagnostic-raising operation in this crate takes a `&mut DiagnosticBus` rather than
//! returning a `Result`, so that a single `assemble` pass can collect every non-fatal problem
//! instead of stopping at the first one (see spec §7 "Propagation policy"). Fatal conditions are
//! just diagnostics at [`Severity::Error`]; whether the graph is ultimately returned is decided
//! once, after the whole pass, by scanning the bus for errors.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; never affects whether a graph is produced.
    Info,
    /// A warning; never affects whether a graph is produced.
    Warning,
    /// A fatal problem. If any diagnostic at this severity was raised, `assemble` returns no
    /// graph.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Structured metadata attached to a diagnostic, per spec §6's diagnostic schema.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct DiagnosticMetadata {
    /// The package this diagnostic concerns, if any.
    pub package_identity: Option<String>,
    /// The kind of that package, rendered as a string for the schema.
    pub package_kind: Option<String>,
    /// The module (target) this diagnostic concerns, if any.
    pub module_name: Option<String>,
    /// The product this diagnostic concerns, if any.
    pub product_name: Option<String>,
    /// A free-form location string (e.g. an expected source path), if any.
    pub location: Option<String>,
}

impl DiagnosticMetadata {
    /// Merges `other` over `self`: fields set in `other` take precedence, everything else is
    /// kept from `self`. Used to layer a more specific frame over an outer one.
    fn merged_over(&self, other: &DiagnosticMetadata) -> DiagnosticMetadata {
        DiagnosticMetadata {
            package_identity: other.package_identity.clone().or_else(|| self.package_identity.clone()),
            package_kind: other.package_kind.clone().or_else(|| self.package_kind.clone()),
            module_name: other.module_name.clone().or_else(|| self.module_name.clone()),
            product_name: other.product_name.clone().or_else(|| self.product_name.clone()),
            location: other.location.clone().or_else(|| self.location.clone()),
        }
    }
}

/// A single structured diagnostic record.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    /// How serious this diagnostic is.
    pub severity: Severity,
    /// The human-readable message.
    pub message: String,
    /// Structured context for programmatic consumers.
    pub metadata: DiagnosticMetadata,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// An append-only collector of [`Diagnostic`]s with a stack of contextual metadata frames.
///
/// Diagnostic emission order is stable for identical inputs: callers are expected to visit
/// packages in dependency-declared order and modules in declaration order, and to push a
/// metadata frame via [`with_metadata`](DiagnosticBus::with_metadata) before descending into a
/// package or module so that diagnostics raised from deep in the call stack still carry the
/// right context without threading it through every function signature.
#[derive(Debug, Default)]
pub struct DiagnosticBus {
    diagnostics: Vec<Diagnostic>,
    stack: Vec<DiagnosticMetadata>,
}

impl DiagnosticBus {
    /// Creates a new, empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with `meta` merged over the current frame, then pops the frame again.
    ///
    /// This is the only way to change the ambient metadata: there is no thread-local or global
    /// state, and the bus is passed by `&mut` through the call stack like any other value.
    pub fn with_metadata<R>(&mut self, meta: DiagnosticMetadata, f: impl FnOnce(&mut Self) -> R) -> R {
        let current = self.current_metadata();
        self.stack.push(current.merged_over(&meta));
        let result = f(self);
        self.stack.pop();
        result
    }

    fn current_metadata(&self) -> DiagnosticMetadata {
        self.stack.last().cloned().unwrap_or_default()
    }

    /// Pushes a diagnostic using the current metadata frame.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        let metadata = self.current_metadata();
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.into(),
            metadata,
        });
    }

    /// Pushes an error-severity diagnostic.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message);
    }

    /// Pushes a warning-severity diagnostic.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    /// Pushes an info-severity diagnostic.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    /// Returns true iff any `Error`-severity diagnostic has been pushed so far.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// All diagnostics pushed so far, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the bus, returning its diagnostics in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
