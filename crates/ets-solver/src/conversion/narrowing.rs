//! Narrowing primitive conversion.

use crate::diagnostics::RelationError;
use crate::relation::{ConversionFlags, RelationResult, TypeRelation};
use crate::types::{ConstValue, PrimitiveKind, TypeId};
use tracing::debug;

/// Where a narrowing happens.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NarrowingContext {
    /// Implicit: only constants that fit may narrow.
    Assignment,
    /// Explicit: any numeric pair narrows, constants with cast semantics.
    Cast,
}

impl TypeRelation<'_> {
    /// Narrow primitive `source` to `target`.
    ///
    /// In an assignment, a constant that does not survive the narrowing is
    /// an `Error` carrying [`RelationError::ValueDoesNotFit`] and a
    /// non-constant source is `False`. In a cast every numeric pair
    /// narrows; a constant is converted with saturating float-to-integer
    /// and wrapping integer semantics.
    pub(crate) fn narrowing_primitive(
        &mut self,
        source: TypeId,
        target: PrimitiveKind,
        context: NarrowingContext,
    ) -> RelationResult {
        let env = self.env;
        let Some(kind) = env.primitive_kind(source) else {
            return RelationResult::False;
        };
        if !kind.is_numeric() || !target.is_numeric() {
            return RelationResult::False;
        }
        let value = env.const_value(source);
        match (context, value) {
            (NarrowingContext::Assignment, None) => RelationResult::False,
            (NarrowingContext::Assignment, Some(value)) => {
                if !value.fits_in(target) {
                    debug!(%value, target = target.name(), "constant does not fit");
                    self.record_error(RelationError::ValueDoesNotFit { value, target });
                    return RelationResult::Error;
                }
                self.narrow_value(value, target);
                RelationResult::True
            }
            (NarrowingContext::Cast, Some(value)) => {
                self.narrow_value(value, target);
                RelationResult::True
            }
            (NarrowingContext::Cast, None) => {
                self.add_conversion(ConversionFlags::NARROWING_PRIMITIVE);
                RelationResult::True
            }
        }
    }

    fn narrow_value(&mut self, value: ConstValue, target: PrimitiveKind) {
        self.add_conversion(ConversionFlags::NARROWING_PRIMITIVE);
        if let Some(narrowed) = value.convert(target) {
            let converted = self.env.constant(narrowed);
            self.set_converted(converted);
        }
    }

    /// Widen or narrow `source` to `target` for a cast, whichever applies.
    pub(crate) fn primitive_cast(&mut self, source: TypeId, target: PrimitiveKind) -> RelationResult {
        let Some(kind) = self.env.primitive_kind(source) else {
            return RelationResult::False;
        };
        if kind == target {
            return RelationResult::True;
        }
        if self.widening_primitive(source, target) {
            return RelationResult::True;
        }
        self.narrowing_primitive(source, target, NarrowingContext::Cast)
    }
}
