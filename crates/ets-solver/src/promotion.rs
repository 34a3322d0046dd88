//! Numeric promotion of arithmetic operands.
//!
//! Operands are unboxed first, so `Int + long` promotes like `int + long`.

use crate::env::TypeEnv;
use crate::types::{ConstValue, PrimitiveKind, TypeId};

/// Result of promoting the operands of a binary operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BinaryPromotion {
    /// The kind both operands convert to.
    pub ty: TypeId,
    /// Both operands are constants, so the operation can be folded.
    pub both_constant: bool,
}

impl TypeEnv {
    /// The primitive kind of `ty`, looking through wrappers.
    pub fn unboxed_primitive(&self, ty: TypeId) -> Option<PrimitiveKind> {
        self.primitive_kind(ty)
            .or_else(|| self.object_flags(ty).unboxed_kind())
    }

    /// Binary numeric promotion: `double` over `float` over `long`, else
    /// `int`. Two `char` operands stay `char`.
    ///
    /// `None` when either operand is not numeric.
    pub fn binary_numeric_promotion(&self, left: TypeId, right: TypeId) -> Option<BinaryPromotion> {
        let l = self.unboxed_primitive(left).filter(|k| k.is_numeric())?;
        let r = self.unboxed_primitive(right).filter(|k| k.is_numeric())?;
        let kind = match (l, r) {
            (PrimitiveKind::Double, _) | (_, PrimitiveKind::Double) => PrimitiveKind::Double,
            (PrimitiveKind::Float, _) | (_, PrimitiveKind::Float) => PrimitiveKind::Float,
            (PrimitiveKind::Long, _) | (_, PrimitiveKind::Long) => PrimitiveKind::Long,
            (PrimitiveKind::Char, PrimitiveKind::Char) => PrimitiveKind::Char,
            _ => PrimitiveKind::Int,
        };
        Some(BinaryPromotion {
            ty: kind.type_id(),
            both_constant: self.const_value(left).is_some() && self.const_value(right).is_some(),
        })
    }

    /// Unary numeric promotion: `byte`, `short` and `char` become `int`.
    ///
    /// With `keep_constant`, a constant operand stays a constant of the
    /// promoted kind.
    pub fn unary_numeric_promotion(&self, ty: TypeId, keep_constant: bool) -> Option<TypeId> {
        let kind = self.unboxed_primitive(ty).filter(|k| k.is_numeric())?;
        let promoted = match kind {
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
            other => other,
        };
        if keep_constant
            && let Some(value) = self.const_value(ty)
            && let Some(converted) = value.convert(promoted)
        {
            return Some(self.constant(converted));
        }
        Some(promoted.type_id())
    }

    /// Type of `cond ? a : b` with numeric branches.
    ///
    /// An `int` constant paired with a `byte`, `short` or `char` branch
    /// keeps the narrower kind when the value fits it.
    pub fn conditional_promotion(&self, consequent: TypeId, alternate: TypeId) -> Option<TypeId> {
        let c = self.unboxed_primitive(consequent)?;
        let a = self.unboxed_primitive(alternate)?;
        if c == a {
            return Some(c.type_id());
        }
        if let Some(narrow) = self.fitting_int_constant(consequent, a) {
            return Some(narrow);
        }
        if let Some(narrow) = self.fitting_int_constant(alternate, c) {
            return Some(narrow);
        }
        self.binary_numeric_promotion(consequent, alternate)
            .map(|promotion| promotion.ty)
    }

    fn fitting_int_constant(&self, constant: TypeId, other: PrimitiveKind) -> Option<TypeId> {
        let narrow = matches!(
            other,
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char
        );
        match self.const_value(constant) {
            Some(value @ ConstValue::Int(_)) if narrow && value.fits_in(other) => {
                Some(other.type_id())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../tests/promotion_tests.rs"]
mod tests;
