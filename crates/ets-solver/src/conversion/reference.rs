//! Widening and narrowing reference conversions.

use crate::relation::{ConversionFlags, RelationResult, TypeRelation};
use crate::types::TypeId;
use tracing::trace;

impl TypeRelation<'_> {
    /// Implicit conversion to a supertype.
    pub(crate) fn widening_reference(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        self.supertype(target, source)
    }

    /// Explicit downcast between class and interface types.
    ///
    /// Accepted when:
    /// - both are classes and one derives from the other;
    /// - both are interfaces;
    /// - a non-final class is cast to an interface;
    /// - a final class is cast to an interface it implements;
    /// - an interface is cast to a class implementing it.
    ///
    /// The check is on declarations, so type arguments are not compared.
    /// Every accepted narrowing needs a runtime check and is marked
    /// unchecked.
    pub(crate) fn narrowing_reference(&mut self, source: TypeId, target: TypeId) -> RelationResult {
        let env = self.env;
        if env.is_root_object(source) && env.is_object_like(target) {
            self.add_conversion(ConversionFlags::UNCHECKED_CAST);
            return RelationResult::True;
        }
        let (Some(from), Some(to)) = (env.object_decl_of(source), env.object_decl_of(target)) else {
            return RelationResult::False;
        };
        let accepted = match (from.is_interface(), to.is_interface()) {
            (false, false) => env.derives_from(from.id, to.id) || env.derives_from(to.id, from.id),
            (true, true) => true,
            (false, true) => !from.is_final() || env.derives_from(from.id, to.id),
            (true, false) => env.derives_from(to.id, from.id),
        };
        if !accepted {
            return RelationResult::False;
        }
        trace!(?source, ?target, "unchecked reference narrowing");
        self.add_conversion(ConversionFlags::UNCHECKED_CAST);
        RelationResult::True
    }
}
