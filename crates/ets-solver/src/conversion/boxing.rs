//! Boxing and unboxing.
//!
//! Every primitive kind boxes to its well-known wrapper class; an enum
//! boxes to the reference type declared alongside it. Unboxing is the
//! inverse, keyed on the wrapper's declaration flags.

use crate::env::TypeEnv;
use crate::registry::GlobalSlot;
use crate::relation::{ConversionFlags, RelationFlags, TypeRelation};
use crate::types::{ObjectFlags, PrimitiveKind, TypeData, TypeId};
use tracing::trace;

impl TypeEnv {
    /// The wrapper class of `kind`, once bound.
    pub fn boxed_type(&self, kind: PrimitiveKind) -> Option<TypeId> {
        self.globals().get(GlobalSlot::Boxed(kind))
    }

    /// Reference form of a primitive or enum type.
    pub fn box_type(&self, ty: TypeId) -> Option<TypeId> {
        match &*self.lookup(ty) {
            TypeData::Primitive { kind, .. } => self.boxed_type(*kind),
            TypeData::Enum(decl) => self.decls().enum_decl(*decl).map(|e| e.boxed),
            _ => None,
        }
    }

    /// The value type a wrapper or boxed enum unboxes to.
    pub fn unboxed_type(&self, ty: TypeId) -> Option<TypeId> {
        let decl = self.object_decl_of(ty)?;
        if let Some(kind) = decl.flags.unboxed_kind() {
            return Some(kind.type_id());
        }
        if decl.flags.contains(ObjectFlags::BOXED_ENUM) {
            return decl.boxed_enum.map(|e| self.enum_type(e));
        }
        None
    }

    pub fn is_unboxable(&self, ty: TypeId) -> bool {
        self.object_flags(ty).intersects(ObjectFlags::UNBOXABLE)
    }
}

impl TypeRelation<'_> {
    /// Box `source`, recording the boxing marker.
    ///
    /// `None` when boxing is not permitted or `source` has no reference form.
    pub(crate) fn boxing(&mut self, source: TypeId) -> Option<TypeId> {
        if !self.has_flag(RelationFlags::APPLY_BOXING) {
            return None;
        }
        let env = self.env;
        let boxed = env.box_type(source)?;
        let marker = match env.primitive_kind(source) {
            Some(kind) => ConversionFlags::box_to(kind),
            None => ConversionFlags::BOX_TO_ENUM,
        };
        trace!(?source, ?boxed, "boxing");
        self.add_conversion(marker);
        self.set_converted(boxed);
        Some(boxed)
    }

    /// Unbox `source`, recording the unboxing marker.
    pub(crate) fn unboxing(&mut self, source: TypeId) -> Option<TypeId> {
        if !self.has_flag(RelationFlags::APPLY_UNBOXING) {
            return None;
        }
        let env = self.env;
        let unboxed = env.unboxed_type(source)?;
        let marker = match env.primitive_kind(unboxed) {
            Some(kind) => ConversionFlags::unbox_to(kind),
            None => ConversionFlags::UNBOX_TO_ENUM,
        };
        trace!(?source, ?unboxed, "unboxing");
        self.add_conversion(marker);
        self.set_converted(unboxed);
        Some(unboxed)
    }

    /// Box to the wrapper of `kind` after converting the value, for
    /// composite conversions such as `int` to `Long`.
    pub(crate) fn box_as(&mut self, kind: PrimitiveKind) -> Option<TypeId> {
        if !self.has_flag(RelationFlags::APPLY_BOXING) {
            return None;
        }
        let boxed = self.env.boxed_type(kind)?;
        self.add_conversion(ConversionFlags::box_to(kind));
        self.set_converted(boxed);
        Some(boxed)
    }
}
