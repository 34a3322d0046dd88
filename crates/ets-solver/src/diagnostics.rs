//! Failure classification and the diagnostic sink boundary.
//!
//! The relation engine decides *what* failed and hands a
//! [`PendingDiagnostic`] to an injected [`DiagnosticSink`]. Rendering to
//! user-facing text beyond the short `Display` below belongs to the driver.

use crate::signature::OverrideErrorCode;
use crate::types::{ConstValue, DeclId, PrimitiveKind, TypeId, Variance};
use ets_common::diagnostics::format_message;
use ets_common::{Atom, Diagnostic, Span};
use std::fmt;

/// Diagnostic codes, stable across releases.
pub mod codes {
    pub const NOT_ASSIGNABLE: u32 = 2001;
    pub const VALUE_DOES_NOT_FIT: u32 = 2002;
    pub const NOT_CASTABLE: u32 = 2003;
    pub const AMBIGUOUS_UNION_OPERATION: u32 = 2004;
    pub const INSTANTIATION_TOO_DEEP: u32 = 2005;
    pub const VARIANCE_VIOLATION: u32 = 2006;
    pub const OVERRIDDEN_FINAL: u32 = 2007;
    pub const INCOMPATIBLE_RETURN: u32 = 2008;
    pub const OVERRIDDEN_WEAKER: u32 = 2009;
    pub const THROW_MARKER_MISMATCH: u32 = 2010;
}

/// Why a relation query failed.
#[derive(Clone, Debug, PartialEq)]
pub enum RelationError {
    NotAssignable {
        source: TypeId,
        target: TypeId,
    },
    /// A constant does not survive narrowing to the target kind.
    ValueDoesNotFit {
        value: ConstValue,
        target: PrimitiveKind,
    },
    NotCastable {
        source: TypeId,
        target: TypeId,
    },
    /// More than one union constituent accepts the (boxed) source.
    AmbiguousUnionOperation {
        source: TypeId,
        union: TypeId,
    },
    InstantiationTooDeep {
        decl: DeclId,
    },
    VarianceViolation {
        param: Atom,
        declared: Variance,
        position: Variance,
    },
    Override(OverrideErrorCode),
    ThrowMarkerMismatch,
}

impl RelationError {
    pub const fn code(&self) -> u32 {
        match self {
            Self::NotAssignable { .. } => codes::NOT_ASSIGNABLE,
            Self::ValueDoesNotFit { .. } => codes::VALUE_DOES_NOT_FIT,
            Self::NotCastable { .. } => codes::NOT_CASTABLE,
            Self::AmbiguousUnionOperation { .. } => codes::AMBIGUOUS_UNION_OPERATION,
            Self::InstantiationTooDeep { .. } => codes::INSTANTIATION_TOO_DEEP,
            Self::VarianceViolation { .. } => codes::VARIANCE_VIOLATION,
            Self::Override(OverrideErrorCode::OverriddenFinal) => codes::OVERRIDDEN_FINAL,
            Self::Override(OverrideErrorCode::IncompatibleReturn) => codes::INCOMPATIBLE_RETURN,
            Self::Override(OverrideErrorCode::OverriddenWeaker) => codes::OVERRIDDEN_WEAKER,
            Self::Override(OverrideErrorCode::NoError) => 0,
            Self::ThrowMarkerMismatch => codes::THROW_MARKER_MISMATCH,
        }
    }
}

impl fmt::Display for RelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NotAssignable { source, target } => format_message(
                "Type '{0}' is not assignable to type '{1}'.",
                &[&source.to_string(), &target.to_string()],
            ),
            Self::ValueDoesNotFit { value, target } => format_message(
                "Value {0} does not fit into type '{1}'.",
                &[&value.to_string(), target.name()],
            ),
            Self::NotCastable { source, target } => format_message(
                "Type '{0}' cannot be cast to type '{1}'.",
                &[&source.to_string(), &target.to_string()],
            ),
            Self::AmbiguousUnionOperation { source, union } => format_message(
                "Ambiguous conversion of '{0}' to union type '{1}'.",
                &[&source.to_string(), &union.to_string()],
            ),
            Self::InstantiationTooDeep { decl } => format_message(
                "Type instantiation of declaration #{0} is excessively deep.",
                &[&decl.0.to_string()],
            ),
            Self::VarianceViolation {
                declared, position, ..
            } => format!(
                "Type parameter declared {declared:?} is used in a {position:?} position."
            ),
            Self::Override(code) => format!("Invalid override: {code}."),
            Self::ThrowMarkerMismatch => {
                "An overriding method cannot change throw or rethrow clauses.".to_string()
            }
        };
        f.write_str(&text)
    }
}

/// A failure waiting to be rendered by the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingDiagnostic {
    pub error: RelationError,
    pub span: Span,
}

impl PendingDiagnostic {
    pub fn new(error: RelationError, span: Span) -> Self {
        Self { error, span }
    }

    pub fn code(&self) -> u32 {
        self.error.code()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.span, self.error.to_string(), self.error.code())
    }
}

/// Where the relation engine reports failures.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: PendingDiagnostic);
}

/// A sink that keeps every report for later rendering.
#[derive(Default, Debug)]
pub struct DiagnosticCollector {
    diagnostics: Vec<PendingDiagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[PendingDiagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<PendingDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: PendingDiagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
