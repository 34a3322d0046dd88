//! String conversion of concatenation operands.

use crate::relation::{ConversionFlags, RelationFlags, RelationResult, TypeRelation};
use crate::types::{PrimitiveKind, TypeFlags, TypeId};

impl TypeRelation<'_> {
    /// Prepare `source` to take part in string concatenation.
    ///
    /// `byte` and `short` widen to `int` before boxing; the other
    /// primitive kinds and enums box directly; reference operands are used
    /// as they are. The converted type is the boxed operand type.
    pub fn string_conversion(&mut self, source: TypeId) -> RelationResult {
        self.begin("string", source, source);
        let result =
            self.with_added_flags(RelationFlags::APPLY_BOXING, |rel| rel.string_operand(source));
        self.finish(result, None)
    }

    fn string_operand(&mut self, source: TypeId) -> RelationResult {
        let env = self.env;
        if env.flags(source).contains(TypeFlags::ERROR) {
            return RelationResult::True;
        }
        let converted = match env.primitive_kind(source) {
            Some(PrimitiveKind::Byte | PrimitiveKind::Short) => {
                self.widening_primitive(source, PrimitiveKind::Int);
                self.box_as(PrimitiveKind::Int)
            }
            Some(_) => self.boxing(source),
            None if env.flags(source).contains(TypeFlags::ENUM) => self.boxing(source),
            None if env.flags(source).contains(TypeFlags::VOID) => None,
            None => Some(source),
        };
        match converted {
            Some(_) => {
                self.add_conversion(ConversionFlags::STRING_CONVERSION);
                RelationResult::True
            }
            None => RelationResult::False,
        }
    }
}
