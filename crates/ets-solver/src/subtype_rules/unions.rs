//! Unions on either side of a supertype judgment.

use crate::relation::{RelationResult, TypeRelation};
use crate::types::TypeId;

impl TypeRelation<'_> {
    /// A union is a subtype when every constituent is.
    pub(crate) fn union_sub_supertype(&mut self, sup: TypeId, members: &[TypeId]) -> RelationResult {
        for member in members {
            let result = self.supertype(sup, *member);
            if !result.is_true() {
                return result;
            }
        }
        RelationResult::True
    }

    /// A union is a supertype when some constituent is.
    pub(crate) fn union_sup_supertype(&mut self, members: &[TypeId], sub: TypeId) -> RelationResult {
        let found = members
            .iter()
            .any(|member| self.supertype(*member, sub).is_true());
        RelationResult::from_bool(found)
    }
}
