//! etsc: type relations for an ArkTS-style statically typed front end.
//!
//! The semantic core lives in [`ets_solver`]; shared utilities (interning,
//! spans, limits, diagnostics) in [`ets_common`]. This crate re-exports both
//! and owns process-level tracing setup.

pub use ets_common as common;
pub use ets_solver as solver;

pub use ets_common::{Atom, Diagnostic, DiagnosticCategory, Interner, Span};
pub use ets_solver::{
    ConversionFlags, DiagnosticCollector, DiagnosticSink, Prelude, RelationFlags, RelationOutcome,
    RelationResult, SolverOptions, TypeEnv, TypeId, TypeRelation, declare_prelude,
};

pub mod tracing_config;
