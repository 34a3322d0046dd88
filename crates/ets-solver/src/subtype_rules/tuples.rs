//! Arrays and tuples.
//!
//! Reference elements are covariant, primitive elements must match
//! exactly. A readonly tuple accepts a mutable one but not the reverse, and
//! only mutable tuples can stand in for arrays.

use crate::relation::{RelationResult, TypeRelation};
use crate::types::TypeId;

impl TypeRelation<'_> {
    pub(crate) fn array_supertype(
        &mut self,
        (sup_element, sup_rank): (TypeId, u32),
        (sub_element, sub_rank): (TypeId, u32),
    ) -> RelationResult {
        if sup_rank == sub_rank {
            return self.element_supertype(sup_element, sub_element);
        }
        // Object[] holds any array of higher rank: its elements are arrays.
        RelationResult::from_bool(sup_rank < sub_rank && self.env.is_root_object(sup_element))
    }

    pub(crate) fn tuple_supertype(
        &mut self,
        sup_elements: &[TypeId],
        sup_readonly: bool,
        sub_elements: &[TypeId],
        sub_readonly: bool,
    ) -> RelationResult {
        if sup_elements.len() != sub_elements.len() || (sub_readonly && !sup_readonly) {
            return RelationResult::False;
        }
        for (sup, sub) in sup_elements.iter().zip(sub_elements) {
            let result = self.element_supertype(*sup, *sub);
            if !result.is_true() {
                return result;
            }
        }
        RelationResult::True
    }

    pub(crate) fn array_of_tuple_supertype(
        &mut self,
        sup_array: TypeId,
        elements: &[TypeId],
        readonly: bool,
    ) -> RelationResult {
        if readonly {
            return RelationResult::False;
        }
        let Some(element) = self.env.arena().array_element(sup_array) else {
            return RelationResult::False;
        };
        for sub in elements {
            let result = self.element_supertype(element, *sub);
            if !result.is_true() {
                return result;
            }
        }
        RelationResult::True
    }
}
