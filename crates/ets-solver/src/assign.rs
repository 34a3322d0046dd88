//! Assignment and cast judgments.
//!
//! Both judgments pick a conversion by the variants of source and target
//! and record its markers. A composite conversion (box then widen, unbox
//! then widen, narrow then box) is all-or-nothing: markers of a failed
//! attempt are rolled back before the next one is tried.

use crate::conversion::NarrowingContext;
use crate::diagnostics::RelationError;
use crate::options::NumericPrecedence;
use crate::relation::{ConversionFlags, RelationFlags, RelationResult, TypeRelation};
use crate::types::{PrimitiveKind, TypeData, TypeFlags, TypeId};
use smallvec::SmallVec;
use tracing::{debug, trace};

type Candidates = SmallVec<[TypeId; 4]>;

impl TypeRelation<'_> {
    // =========================================================================
    // Assignment
    // =========================================================================

    pub(crate) fn assignable(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        if source == target {
            return RelationResult::True;
        }
        let env = self.env;
        let (fs, ft) = (env.flags(source), env.flags(target));
        if (fs | ft).contains(TypeFlags::ERROR) || fs.contains(TypeFlags::NEVER) {
            return RelationResult::True;
        }
        if self.has_flag(RelationFlags::ONLY_CHECK_WIDENING) {
            return self.widening_only(source, target);
        }
        if ft.contains(TypeFlags::ANY) {
            // `any` holds references only.
            if fs.intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM) {
                self.boxing(source);
            }
            return RelationResult::True;
        }

        let (source_data, target_data) = (env.lookup(source), env.lookup(target));
        match (&*source_data, &*target_data) {
            (TypeData::Union { members }, _) => self.union_source_assignable(members, target),
            (_, TypeData::Union { members }) => {
                self.union_target_assignable(source, target, members)
            }
            (TypeData::Primitive { kind: from, .. }, TypeData::Primitive { kind: to, .. }) => {
                self.primitive_assignable(source, *from, *to)
            }
            (TypeData::Primitive { kind, .. }, _) => {
                self.primitive_to_reference(source, *kind, target)
            }
            (TypeData::Enum(_), _) => self.enum_to_reference(source, target),
            (TypeData::Object { .. }, TypeData::Primitive { kind, .. }) => {
                self.unboxing_assignable(source, *kind)
            }
            (TypeData::Object { .. }, TypeData::Enum(_)) => {
                let snapshot = self.snapshot();
                if self.unboxing(source) == Some(target) {
                    return RelationResult::True;
                }
                self.rollback(snapshot);
                RelationResult::False
            }
            (_, TypeData::Primitive { .. } | TypeData::Enum(_)) => self.forbidden(source, target),
            _ => self.widening_reference(source, target),
        }
    }

    /// Identity and primitive widening only.
    fn widening_only(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let env = self.env;
        match (env.primitive_kind(source), env.primitive_kind(target)) {
            (Some(from), Some(to)) => {
                RelationResult::from_bool(from == to || self.widening_primitive(source, to))
            }
            _ => self.identical(source, target),
        }
    }

    fn primitive_assignable(
        &mut self,
        source: TypeId,
        from: PrimitiveKind,
        to: PrimitiveKind,
    ) -> RelationResult {
        if from == to || self.widening_primitive(source, to) {
            return RelationResult::True;
        }
        self.narrowing_primitive(source, to, NarrowingContext::Assignment)
    }

    /// Box, then widen the reference. A target wrapper of another numeric
    /// kind is reached by widening (or, for a constant that fits, narrowing)
    /// the value before boxing.
    fn primitive_to_reference(
        &mut self,
        source: TypeId,
        kind: PrimitiveKind,
        target: TypeId,
    ) -> RelationResult {
        if !self.has_flag(RelationFlags::APPLY_BOXING) {
            return self.forbidden(source, target);
        }
        let env = self.env;
        let snapshot = self.snapshot();
        if let Some(boxed) = self.boxing(source)
            && self.supertype(target, boxed).is_true()
        {
            return RelationResult::True;
        }
        self.rollback(snapshot);

        let Some(target_kind) = env.object_flags(target).unboxed_kind() else {
            return RelationResult::False;
        };
        if kind.widens_to(target_kind) {
            self.widening_primitive(source, target_kind);
            if self.box_as(target_kind).is_some() {
                return RelationResult::True;
            }
            self.rollback(snapshot);
            return RelationResult::False;
        }
        if env.const_value(source).is_none() {
            return RelationResult::False;
        }
        match self.narrowing_primitive(source, target_kind, NarrowingContext::Assignment) {
            RelationResult::True if self.box_as(target_kind).is_some() => RelationResult::True,
            RelationResult::Error => {
                self.rollback(snapshot);
                RelationResult::Error
            }
            _ => {
                self.rollback(snapshot);
                RelationResult::False
            }
        }
    }

    fn enum_to_reference(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let snapshot = self.snapshot();
        if let Some(boxed) = self.boxing(source)
            && self.supertype(target, boxed).is_true()
        {
            return RelationResult::True;
        }
        self.rollback(snapshot);
        RelationResult::False
    }

    /// Unbox, then identity or widening.
    fn unboxing_assignable(&mut self, source: TypeId, target: PrimitiveKind) -> RelationResult {
        let snapshot = self.snapshot();
        if let Some(unboxed) = self.unboxing(source)
            && let Some(kind) = self.env.primitive_kind(unboxed)
            && (kind == target || self.widening_primitive(unboxed, target))
        {
            return RelationResult::True;
        }
        self.rollback(snapshot);
        RelationResult::False
    }

    /// Every constituent must be assignable.
    fn union_source_assignable(&mut self, members: &[TypeId], target: TypeId) -> RelationResult {
        let snapshot = self.snapshot();
        for member in members {
            let result = self.assignable(*member, target);
            if !result.is_true() {
                self.rollback(snapshot);
                return result;
            }
        }
        // Per-member converted types do not describe the union value.
        self.state.converted = snapshot.converted();
        RelationResult::True
    }

    /// Some constituent must accept the source.
    ///
    /// Reference sources need a constituent that is a supertype. Primitive
    /// and enum sources try, in order: a constituent of the same kind, the
    /// exact boxed form, then every constituent that accepts the source
    /// after conversion. More than one accepting constituent is ambiguous
    /// unless numeric precedence picks one.
    fn union_target_assignable(
        &mut self,
        source: TypeId,
        union: TypeId,
        members: &[TypeId],
    ) -> RelationResult {
        let env = self.env;
        if !env
            .flags(source)
            .intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM)
        {
            let found = members
                .iter()
                .any(|member| self.supertype(*member, source).is_true());
            return RelationResult::from_bool(found);
        }

        if let Some(kind) = env.primitive_kind(source)
            && members.iter().any(|m| env.primitive_kind(*m) == Some(kind))
        {
            return RelationResult::True;
        }
        if let Some(boxed) = env.box_type(source)
            && members.contains(&boxed)
            && self.boxing(source).is_some()
        {
            return RelationResult::True;
        }

        let (accepting, failure) = self.probe_constituents(members, |rel, member| {
            rel.assignable(source, member)
        });
        match accepting.as_slice() {
            [] => failure,
            [only] => self.assignable(source, *only),
            candidates => {
                if let Some(chosen) = self.numeric_precedence(source, candidates) {
                    trace!(?source, ?chosen, "numeric precedence");
                    return self.assignable(source, chosen);
                }
                self.ambiguous(source, union, candidates.len())
            }
        }
    }

    /// Run `judge` against each constituent without keeping its markers.
    ///
    /// Returns the accepting constituents and the result to use when none
    /// accepts (`Error` if any attempt was an error). Failure reasons of
    /// the probes are kept only when nothing accepts.
    fn probe_constituents(
        &mut self,
        members: &[TypeId],
        mut judge: impl FnMut(&mut Self, TypeId) -> RelationResult,
    ) -> (Candidates, RelationResult) {
        let snapshot = self.snapshot();
        let saved_error = self.state.error.clone();
        let mut accepting = Candidates::new();
        let mut failure = RelationResult::False;
        for member in members {
            match judge(self, *member) {
                RelationResult::True => accepting.push(*member),
                RelationResult::Error => failure = RelationResult::Error,
                RelationResult::False => {}
            }
            self.rollback(snapshot);
        }
        if !accepting.is_empty() {
            self.state.error = saved_error;
        }
        (accepting, failure)
    }

    /// Among numeric wrapper candidates, the narrowest one the source
    /// widens to.
    fn numeric_precedence(&self, source: TypeId, candidates: &[TypeId]) -> Option<TypeId> {
        let env = self.env;
        if env.options().numeric_precedence == NumericPrecedence::Disabled {
            return None;
        }
        let kind = env.primitive_kind(source)?;
        let mut best: Option<(PrimitiveKind, TypeId)> = None;
        for candidate in candidates {
            let wrapped = env.object_flags(*candidate).unboxed_kind()?;
            if !wrapped.is_numeric() {
                return None;
            }
            if wrapped != kind && !kind.widens_to(wrapped) {
                continue;
            }
            if best.is_none_or(|(current, _)| wrapped.rank() < current.rank()) {
                best = Some((wrapped, *candidate));
            }
        }
        best.map(|(_, ty)| ty)
    }

    fn ambiguous(&mut self, source: TypeId, union: TypeId, candidates: usize) -> RelationResult {
        debug!(?source, ?union, candidates, "ambiguous union conversion");
        self.state.error = None;
        self.record_error(RelationError::AmbiguousUnionOperation { source, union });
        RelationResult::False
    }

    // =========================================================================
    // Cast
    // =========================================================================

    pub(crate) fn castable(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        if source == target {
            return RelationResult::True;
        }
        let env = self.env;
        let (fs, ft) = (env.flags(source), env.flags(target));
        if (fs | ft).contains(TypeFlags::ERROR) || fs.contains(TypeFlags::NEVER) {
            return RelationResult::True;
        }

        // Anything assignable is castable; a literal that does not fit
        // still narrows with cast semantics below.
        let snapshot = self.snapshot();
        let saved_error = self.state.error.clone();
        if self.assignable(source, target).is_true() {
            return RelationResult::True;
        }
        self.rollback(snapshot);
        self.state.error = saved_error;

        let (source_data, target_data) = (env.lookup(source), env.lookup(target));
        match (&*source_data, &*target_data) {
            (TypeData::Primitive { .. }, TypeData::Primitive { kind, .. }) => {
                self.primitive_cast(source, *kind)
            }
            (TypeData::Union { members }, _) => self.union_source_castable(members, target),
            (_, TypeData::Union { members }) => {
                self.union_target_castable(source, target, members)
            }
            (TypeData::Primitive { .. }, TypeData::Object { .. }) => {
                self.primitive_to_wrapper_cast(source, target)
            }
            (TypeData::Object { .. } | TypeData::Intrinsic(_), TypeData::Primitive { kind, .. }) => {
                self.reference_to_primitive_cast(source, *kind)
            }
            (TypeData::TypeParameter(param), _) => {
                let constraint = env.type_param_constraint(*param);
                self.unchecked_via(constraint, target)
            }
            (_, TypeData::TypeParameter(param)) => {
                let constraint = env.type_param_constraint(*param);
                self.unchecked_via(source, constraint)
            }
            (TypeData::Intrinsic(_), _) if fs.contains(TypeFlags::ANY) => {
                self.add_conversion(ConversionFlags::UNCHECKED_CAST);
                RelationResult::True
            }
            (TypeData::Array { .. }, TypeData::Array { .. }) => self.array_cast(source, target),
            (TypeData::Array { .. }, TypeData::Tuple { elements, .. }) => {
                self.array_to_tuple_cast(source, elements)
            }
            (
                TypeData::Tuple { elements: from, .. },
                TypeData::Tuple { elements: to, .. },
            ) => self.elementwise_cast(from, to),
            (TypeData::Object { .. }, _) => self.narrowing_reference(source, target),
            _ => self.forbidden(source, target),
        }
    }

    /// Cast `source` to `target` and mark the result unchecked.
    fn unchecked_via(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let result = self.castable(source, target);
        if result.is_true() {
            self.add_conversion(ConversionFlags::UNCHECKED_CAST);
        }
        result
    }

    /// `(Long) 3` narrows or widens the value, then boxes.
    fn primitive_to_wrapper_cast(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let Some(kind) = self.env.object_flags(target).unboxed_kind() else {
            return self.forbidden(source, target);
        };
        let snapshot = self.snapshot();
        if self.primitive_cast(source, kind).is_true() && self.box_as(kind).is_some() {
            return RelationResult::True;
        }
        self.rollback(snapshot);
        RelationResult::False
    }

    /// A wrapper unboxes and then converts. `Object`, `any` and interfaces
    /// a wrapper implements unbox after a runtime check.
    fn reference_to_primitive_cast(&mut self, source: TypeId, kind: PrimitiveKind) -> RelationResult {
        if !self.has_flag(RelationFlags::APPLY_UNBOXING) {
            return RelationResult::False;
        }
        let env = self.env;
        let snapshot = self.snapshot();
        if env.is_unboxable(source) {
            if let Some(unboxed) = self.unboxing(source)
                && env.primitive_kind(unboxed).is_some()
                && self.primitive_cast(unboxed, kind).is_true()
            {
                return RelationResult::True;
            }
            self.rollback(snapshot);
            return RelationResult::False;
        }
        let Some(boxed) = env.boxed_type(kind) else {
            return RelationResult::False;
        };
        if source == TypeId::ANY || self.supertype(source, boxed).is_true() {
            self.add_conversion(ConversionFlags::UNCHECKED_CAST | ConversionFlags::unbox_to(kind));
            self.set_converted(kind.type_id());
            return RelationResult::True;
        }
        RelationResult::False
    }

    /// Some constituent must be castable; the cast is then unchecked.
    fn union_source_castable(&mut self, members: &[TypeId], target: TypeId) -> RelationResult {
        let (accepting, failure) =
            self.probe_constituents(members, |rel, member| rel.castable(member, target));
        let Some(first) = accepting.first() else {
            return failure;
        };
        let result = self.castable(*first, target);
        if result.is_true() {
            self.state.converted = None;
            self.add_conversion(ConversionFlags::UNCHECKED_CAST);
        }
        result
    }

    fn union_target_castable(
        &mut self,
        source: TypeId,
        union: TypeId,
        members: &[TypeId],
    ) -> RelationResult {
        let (accepting, failure) =
            self.probe_constituents(members, |rel, member| rel.castable(source, member));
        let is_value = self
            .env
            .flags(source)
            .intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM);
        match accepting.as_slice() {
            [] => failure,
            [only] => self.castable(source, *only),
            candidates if is_value => match self.numeric_precedence(source, candidates) {
                Some(chosen) => self.castable(source, chosen),
                None => self.ambiguous(source, union, candidates.len()),
            },
            [first, ..] => self.castable(source, *first),
        }
    }

    fn array_cast(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let arena = self.env.arena();
        let (Some(from), Some(to)) = (arena.array_element(source), arena.array_element(target))
        else {
            return RelationResult::False;
        };
        self.elementwise_cast(&[from], &[to])
    }

    fn array_to_tuple_cast(&mut self, source: TypeId, elements: &[TypeId]) -> RelationResult {
        let Some(element) = self.env.arena().array_element(source) else {
            return RelationResult::False;
        };
        let from: SmallVec<[TypeId; 4]> = elements.iter().map(|_| element).collect();
        let result = self.elementwise_cast(&from, elements);
        if result.is_true() {
            // The length is only known at run time.
            self.add_conversion(ConversionFlags::UNCHECKED_CAST);
        }
        result
    }

    /// Element casts: primitive elements must be identical, reference
    /// elements may narrow.
    fn elementwise_cast(&mut self, from: &[TypeId], to: &[TypeId]) -> RelationResult {
        if from.len() != to.len() {
            return RelationResult::False;
        }
        let env = self.env;
        for (source, target) in from.iter().zip(to) {
            let primitive = (env.flags(*source) | env.flags(*target))
                .intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM);
            let result = if primitive {
                self.identical(*source, *target)
            } else {
                self.castable(*source, *target)
            };
            if !result.is_true() {
                return result;
            }
        }
        // Element conversions happen per element at run time.
        self.state.converted = None;
        RelationResult::True
    }
}

#[cfg(test)]
#[path = "../tests/assign_tests.rs"]
mod tests;
