//! Common types and utilities for the etsc type checker.
//!
//! This crate provides foundational types used by the solver and its
//! collaborators:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Checker limits and thresholds
//! - Diagnostic records handed to the driver

// String interning for member and declaration names
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Diagnostic records
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};
