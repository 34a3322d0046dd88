//! Widening primitive conversion.

use crate::relation::{ConversionFlags, TypeRelation};
use crate::types::{PrimitiveKind, TypeId};

impl TypeRelation<'_> {
    /// Widen primitive `source` to `target` along
    /// [`PrimitiveKind::widening_targets`].
    ///
    /// A constant source is widened by value; the converted type is the
    /// constant of the target kind.
    pub(crate) fn widening_primitive(&mut self, source: TypeId, target: PrimitiveKind) -> bool {
        let env = self.env;
        let Some(kind) = env.primitive_kind(source) else {
            return false;
        };
        if !kind.widens_to(target) {
            return false;
        }
        self.add_conversion(ConversionFlags::WIDENING_PRIMITIVE);
        if let Some(value) = env.const_value(source).and_then(|v| v.convert(target)) {
            self.set_converted(env.constant(value));
        }
        true
    }
}
