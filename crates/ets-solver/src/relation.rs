//! The relation context: flags in, tri-state result and conversion effects out.
//!
//! A [`TypeRelation`] is created per checker task and reused for many
//! queries. Each public query resets the per-query state, runs one of the
//! judgments (identity, supertype, assignability, cast) and leaves its
//! outcome readable through [`TypeRelation::outcome`]. Probing and
//! committing share the same code: a query only *computes* conversion
//! markers; [`TypeRelation::apply_assignment`] and
//! [`TypeRelation::apply_cast`] additionally write them to a node.

use crate::diagnostics::{DiagnosticSink, PendingDiagnostic, RelationError};
use crate::env::TypeEnv;
use crate::node::{NodeKind, TypedNode};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{PrimitiveKind, TypeId};
use bitflags::bitflags;
use ets_common::Span;
use tracing::{debug, trace};

bitflags! {
    /// Behavioral switches for a relation query.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RelationFlags: u32 {
        /// Boxing conversions are permitted.
        const APPLY_BOXING           = 1 << 0;
        /// Unboxing conversions are permitted.
        const APPLY_UNBOXING         = 1 << 1;
        /// Only identity and widening primitive conversions are permitted.
        const ONLY_CHECK_WIDENING    = 1 << 2;
        const ASSIGNMENT_CONTEXT     = 1 << 3;
        const CASTING_CONTEXT        = 1 << 4;
        /// Type parameters match anything in identity and supertype checks.
        const IGNORE_TYPE_PARAMETERS = 1 << 5;
        /// Signature compatibility skips the return type.
        const NO_RETURN_TYPE_CHECK   = 1 << 6;
        /// Signature compatibility requires identical parameters.
        const OVERRIDING_CONTEXT     = 1 << 7;
        /// Compute the result without reporting diagnostics.
        const NO_THROW               = 1 << 8;

        const BOXING = Self::APPLY_BOXING.bits() | Self::APPLY_UNBOXING.bits();
    }
}

impl Default for RelationFlags {
    fn default() -> Self {
        Self::BOXING
    }
}

impl RelationFlags {
    /// Bits that change the answer of a pure supertype judgment.
    pub(crate) fn memo_bits(self) -> u32 {
        (self
            & (Self::IGNORE_TYPE_PARAMETERS
                | Self::NO_RETURN_TYPE_CHECK
                | Self::OVERRIDING_CONTEXT))
            .bits()
    }
}

/// Tri-state outcome of a relation query.
///
/// `Error` is distinct from `False` so callers can emit a more specific
/// diagnostic (or none, when it was already reported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelationResult {
    True,
    #[default]
    False,
    Error,
}

impl RelationResult {
    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    #[inline]
    pub fn is_true(self) -> bool {
        self == Self::True
    }

    #[inline]
    pub fn is_false(self) -> bool {
        self == Self::False
    }

    #[inline]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

bitflags! {
    /// Conversion markers codegen reads back from a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConversionFlags: u32 {
        const BOX_TO_BOOLEAN     = 1 << 0;
        const BOX_TO_BYTE        = 1 << 1;
        const BOX_TO_CHAR        = 1 << 2;
        const BOX_TO_SHORT       = 1 << 3;
        const BOX_TO_INT         = 1 << 4;
        const BOX_TO_LONG        = 1 << 5;
        const BOX_TO_FLOAT       = 1 << 6;
        const BOX_TO_DOUBLE      = 1 << 7;
        const BOX_TO_ENUM        = 1 << 8;
        const UNBOX_TO_BOOLEAN   = 1 << 9;
        const UNBOX_TO_BYTE      = 1 << 10;
        const UNBOX_TO_CHAR      = 1 << 11;
        const UNBOX_TO_SHORT     = 1 << 12;
        const UNBOX_TO_INT       = 1 << 13;
        const UNBOX_TO_LONG      = 1 << 14;
        const UNBOX_TO_FLOAT     = 1 << 15;
        const UNBOX_TO_DOUBLE    = 1 << 16;
        const UNBOX_TO_ENUM      = 1 << 17;
        const WIDENING_PRIMITIVE = 1 << 18;
        const NARROWING_PRIMITIVE = 1 << 19;
        /// Accepted at compile time, needs a runtime check.
        const UNCHECKED_CAST     = 1 << 20;
        const STRING_CONVERSION  = 1 << 21;

        const BOXING = Self::BOX_TO_BOOLEAN.bits() | Self::BOX_TO_BYTE.bits()
            | Self::BOX_TO_CHAR.bits() | Self::BOX_TO_SHORT.bits() | Self::BOX_TO_INT.bits()
            | Self::BOX_TO_LONG.bits() | Self::BOX_TO_FLOAT.bits() | Self::BOX_TO_DOUBLE.bits()
            | Self::BOX_TO_ENUM.bits();
        const UNBOXING = Self::UNBOX_TO_BOOLEAN.bits() | Self::UNBOX_TO_BYTE.bits()
            | Self::UNBOX_TO_CHAR.bits() | Self::UNBOX_TO_SHORT.bits() | Self::UNBOX_TO_INT.bits()
            | Self::UNBOX_TO_LONG.bits() | Self::UNBOX_TO_FLOAT.bits() | Self::UNBOX_TO_DOUBLE.bits()
            | Self::UNBOX_TO_ENUM.bits();
    }
}

impl ConversionFlags {
    pub const fn box_to(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Boolean => Self::BOX_TO_BOOLEAN,
            PrimitiveKind::Byte => Self::BOX_TO_BYTE,
            PrimitiveKind::Char => Self::BOX_TO_CHAR,
            PrimitiveKind::Short => Self::BOX_TO_SHORT,
            PrimitiveKind::Int => Self::BOX_TO_INT,
            PrimitiveKind::Long => Self::BOX_TO_LONG,
            PrimitiveKind::Float => Self::BOX_TO_FLOAT,
            PrimitiveKind::Double => Self::BOX_TO_DOUBLE,
        }
    }

    pub const fn unbox_to(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Boolean => Self::UNBOX_TO_BOOLEAN,
            PrimitiveKind::Byte => Self::UNBOX_TO_BYTE,
            PrimitiveKind::Char => Self::UNBOX_TO_CHAR,
            PrimitiveKind::Short => Self::UNBOX_TO_SHORT,
            PrimitiveKind::Int => Self::UNBOX_TO_INT,
            PrimitiveKind::Long => Self::UNBOX_TO_LONG,
            PrimitiveKind::Float => Self::UNBOX_TO_FLOAT,
            PrimitiveKind::Double => Self::UNBOX_TO_DOUBLE,
        }
    }
}

/// Everything a query decided, readable after it returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationOutcome {
    pub result: RelationResult,
    pub conversions: ConversionFlags,
    /// The type the source takes after conversion, when it changes
    /// (a narrowed constant, a boxed primitive).
    pub converted_type: Option<TypeId>,
    pub error: Option<RelationError>,
}

impl RelationOutcome {
    pub fn is_unchecked(&self) -> bool {
        self.conversions.contains(ConversionFlags::UNCHECKED_CAST)
    }
}

/// Which judgment a recursion-guard entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Judgment {
    Identical,
    Supertype,
}

pub(crate) type GuardKey = (Judgment, TypeId, TypeId);

/// Side effects accumulated during one query.
#[derive(Debug, Default)]
pub(crate) struct QueryState {
    pub(crate) conversions: ConversionFlags,
    pub(crate) converted: Option<TypeId>,
    pub(crate) error: Option<RelationError>,
    /// Some nested answer was assumed (cycle) or cut off (depth), so the
    /// result must not be memoized.
    pub(crate) provisional: bool,
}

/// Rollback point for all-or-nothing composite conversions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot {
    conversions: ConversionFlags,
    converted: Option<TypeId>,
}

impl Snapshot {
    pub(crate) fn converted(self) -> Option<TypeId> {
        self.converted
    }
}

/// Relation context threaded through every judgment.
pub struct TypeRelation<'e> {
    pub(crate) env: &'e TypeEnv,
    flags: RelationFlags,
    sink: Option<&'e mut dyn DiagnosticSink>,
    span: Span,
    pub(crate) guard: RecursionGuard<GuardKey>,
    pub(crate) state: QueryState,
    last: RelationOutcome,
}

impl<'e> TypeRelation<'e> {
    pub fn new(env: &'e TypeEnv) -> Self {
        let options = env.options();
        Self {
            env,
            flags: RelationFlags::default(),
            sink: None,
            span: Span::dummy(),
            guard: RecursionGuard::with_profile(RecursionProfile::Custom {
                max_depth: options.max_relation_depth,
                max_iterations: RecursionProfile::Relation.max_iterations(),
            }),
            state: QueryState::default(),
            last: RelationOutcome::default(),
        }
    }

    pub fn with_flags(mut self, flags: RelationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Report failures of subsequent queries to `sink`.
    pub fn with_sink(mut self, sink: &'e mut dyn DiagnosticSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Source position attached to reported failures.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    #[inline]
    pub fn env(&self) -> &'e TypeEnv {
        self.env
    }

    #[inline]
    pub fn flags(&self) -> RelationFlags {
        self.flags
    }

    #[inline]
    pub fn has_flag(&self, flag: RelationFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flags(&mut self, flags: RelationFlags) {
        self.flags = flags;
    }

    // -------------------------------------------------------------------------
    // Public queries
    // -------------------------------------------------------------------------

    /// Structural identity, up to ignored type parameters.
    pub fn is_identical(&mut self, a: TypeId, b: TypeId) -> RelationResult {
        self.begin("identical", a, b);
        let result = self.identical(a, b);
        self.finish(result, None)
    }

    /// Whether `sup` is a supertype of `sub`.
    pub fn is_supertype_of(&mut self, sup: TypeId, sub: TypeId) -> RelationResult {
        self.begin("supertype", sub, sup);
        let result = self.supertype(sup, sub);
        self.finish(result, None)
    }

    /// Implicit conversion judgment.
    pub fn is_assignable_to(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        self.begin("assignable", source, target);
        let result = self.with_added_flags(RelationFlags::ASSIGNMENT_CONTEXT, |rel| {
            rel.assignable(source, target)
        });
        self.finish(
            result,
            Some(RelationError::NotAssignable { source, target }),
        )
    }

    /// Explicit conversion judgment.
    pub fn is_castable_to(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        self.begin("castable", source, target);
        let result =
            self.with_added_flags(RelationFlags::CASTING_CONTEXT, |rel| rel.castable(source, target));
        self.finish(result, Some(RelationError::NotCastable { source, target }))
    }

    /// Check an assignment of `node` to `target` and, on success, record
    /// the conversion markers on the node.
    ///
    /// # Panics
    /// Panics when the node has no resolved type; the checker must type an
    /// expression before converting it.
    pub fn apply_assignment(&mut self, node: &mut dyn TypedNode, target: TypeId) -> RelationResult {
        let Some(source) = node.ty() else {
            panic!("internal error: conversion requested on an untyped node");
        };
        self.span = node.span();
        let result = self.is_assignable_to(source, target);
        if result.is_true() {
            self.commit(node);
        }
        result
    }

    /// Check an explicit cast of `node` to `target` and, on success, record
    /// the conversion markers on the node.
    ///
    /// # Panics
    /// Panics when the node has no resolved type.
    pub fn apply_cast(&mut self, node: &mut dyn TypedNode, target: TypeId) -> RelationResult {
        let Some(source) = node.ty() else {
            panic!("internal error: cast requested on an untyped node");
        };
        self.span = node.span();
        let result = self.is_castable_to(source, target);
        if result.is_true() {
            self.commit(node);
        }
        result
    }

    pub fn result(&self) -> RelationResult {
        self.last.result
    }

    pub fn is_true(&self) -> bool {
        self.last.result.is_true()
    }

    pub fn is_error(&self) -> bool {
        self.last.result.is_error()
    }

    /// Full outcome of the last public query.
    pub fn outcome(&self) -> &RelationOutcome {
        &self.last
    }

    // -------------------------------------------------------------------------
    // Shared plumbing for the judgments
    // -------------------------------------------------------------------------

    pub(crate) fn begin(&mut self, query: &'static str, source: TypeId, target: TypeId) {
        self.state = QueryState::default();
        self.guard.reset();
        trace!(query, ?source, ?target, flags = ?self.flags, "relation query");
    }

    pub(crate) fn finish(&mut self, result: RelationResult, fallback: Option<RelationError>) -> RelationResult {
        let state = std::mem::take(&mut self.state);
        let error = match result {
            RelationResult::True => None,
            _ => state.error.or(fallback),
        };
        if let Some(error) = &error
            && !self.flags.contains(RelationFlags::NO_THROW)
            && let Some(sink) = self.sink.as_deref_mut()
        {
            sink.report(PendingDiagnostic::new(error.clone(), self.span));
        }
        let (conversions, converted_type) = if result.is_true() {
            (state.conversions, state.converted)
        } else {
            (ConversionFlags::empty(), None)
        };
        trace!(?result, ?conversions, "relation outcome");
        self.last = RelationOutcome {
            result,
            conversions,
            converted_type,
            error,
        };
        result
    }

    fn commit(&self, node: &mut dyn TypedNode) {
        let outcome = &self.last;
        node.add_conversions(outcome.conversions);
        if let Some(converted) = outcome.converted_type
            && node.kind() == NodeKind::Literal
        {
            node.set_ty(converted);
        }
    }

    /// Run `f` with `flags` added, restoring the previous flags afterwards.
    pub(crate) fn with_added_flags<R>(
        &mut self,
        flags: RelationFlags,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = self.flags;
        self.flags |= flags;
        let result = f(self);
        self.flags = saved;
        result
    }

    /// Run `f` with exactly `flags`, restoring the previous flags afterwards.
    pub(crate) fn with_flags_scoped<R>(
        &mut self,
        flags: RelationFlags,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = self.flags;
        self.flags = flags;
        let result = f(self);
        self.flags = saved;
        result
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            conversions: self.state.conversions,
            converted: self.state.converted,
        }
    }

    pub(crate) fn rollback(&mut self, snapshot: Snapshot) {
        if self.state.conversions != snapshot.conversions {
            debug!(
                dropped = ?(self.state.conversions - snapshot.conversions),
                "rolling back partial conversion"
            );
        }
        self.state.conversions = snapshot.conversions;
        self.state.converted = snapshot.converted;
    }

    pub(crate) fn add_conversion(&mut self, flags: ConversionFlags) {
        self.state.conversions |= flags;
    }

    pub(crate) fn set_converted(&mut self, ty: TypeId) {
        self.state.converted = Some(ty);
    }

    /// Record the first specific failure reason of this query.
    pub(crate) fn record_error(&mut self, error: RelationError) {
        if self.state.error.is_none() {
            self.state.error = Some(error);
        }
    }

    /// Enter the recursion guard for a structural judgment.
    ///
    /// `Err(result)` carries the answer to use when entry is denied:
    /// a cycle is assumed to hold, an exhausted budget answers `False`.
    pub(crate) fn enter(&mut self, key: GuardKey) -> Result<(), RelationResult> {
        match self.guard.enter(key) {
            RecursionResult::Entered => Ok(()),
            RecursionResult::Cycle => {
                self.state.provisional = true;
                Err(RelationResult::True)
            }
            denied @ (RecursionResult::DepthExceeded | RecursionResult::IterationExceeded) => {
                debug!(?denied, ?key, "relation recursion limit hit");
                self.state.provisional = true;
                Err(RelationResult::False)
            }
        }
    }

    pub(crate) fn leave(&mut self, key: GuardKey) {
        self.guard.leave(key);
    }
}

#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod tests;
