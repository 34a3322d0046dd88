//! Identity and supertype judgments.
//!
//! Both are side-effect free: they never record conversion markers, so
//! their answers can be memoized in the environment. Structural recursion
//! (type arguments, array elements, tuple elements, union members,
//! signatures) goes through the relation's recursion guard; a pair that is
//! already being checked is assumed to hold.
//!
//! Variant-specific rules live in [`crate::subtype_rules`].

use crate::relation::{Judgment, RelationFlags, RelationResult, TypeRelation};
use crate::types::{SignatureId, TypeData, TypeFlags, TypeId};
use tracing::trace;

impl TypeRelation<'_> {
    /// Structural identity.
    ///
    /// Two constant primitives of one kind are identical regardless of
    /// their values, and a constant is identical to its kind's type.
    pub(crate) fn identical(&mut self, a: TypeId, b: TypeId) -> RelationResult {
        if a == b {
            return RelationResult::True;
        }
        let env = self.env;
        let (fa, fb) = (env.flags(a), env.flags(b));
        if (fa | fb).contains(TypeFlags::ERROR) {
            return RelationResult::True;
        }
        if self.has_flag(RelationFlags::IGNORE_TYPE_PARAMETERS)
            && (fa | fb).contains(TypeFlags::TYPE_PARAMETER)
        {
            return RelationResult::True;
        }

        let (da, db) = (env.lookup(a), env.lookup(b));
        if let (TypeData::Primitive { kind: ka, .. }, TypeData::Primitive { kind: kb, .. }) =
            (&*da, &*db)
        {
            return RelationResult::from_bool(ka == kb);
        }
        if std::mem::discriminant(&*da) != std::mem::discriminant(&*db) {
            return RelationResult::False;
        }

        // Keyed on the ordered pair so `identical(a, b)` and
        // `identical(b, a)` share a guard entry.
        let key = (Judgment::Identical, a.min(b), a.max(b));
        if let Err(assumed) = self.enter(key) {
            return assumed;
        }
        let result = match (&*da, &*db) {
            (
                TypeData::Object { decl: d1, args: a1 },
                TypeData::Object { decl: d2, args: a2 },
            ) => {
                if d1 != d2 || a1.len() != a2.len() {
                    RelationResult::False
                } else {
                    self.all_identical(a1, a2)
                }
            }
            (
                TypeData::Array {
                    element: e1,
                    rank: r1,
                },
                TypeData::Array {
                    element: e2,
                    rank: r2,
                },
            ) => {
                if r1 != r2 {
                    RelationResult::False
                } else {
                    self.identical(*e1, *e2)
                }
            }
            (
                TypeData::Tuple {
                    elements: e1,
                    readonly: r1,
                },
                TypeData::Tuple {
                    elements: e2,
                    readonly: r2,
                },
            ) => {
                if r1 != r2 || e1.len() != e2.len() {
                    RelationResult::False
                } else {
                    self.all_identical(e1, e2)
                }
            }
            (TypeData::Union { members: m1 }, TypeData::Union { members: m2 }) => {
                self.unions_identical(m1, m2)
            }
            (
                TypeData::Function {
                    signatures: s1,
                    extensions: x1,
                },
                TypeData::Function {
                    signatures: s2,
                    extensions: x2,
                },
            ) => {
                let same = s1.len() == s2.len()
                    && x1.len() == x2.len()
                    && s1
                        .iter()
                        .chain(x1)
                        .zip(s2.iter().chain(x2))
                        .all(|(l, r)| self.signatures_identical(*l, *r));
                RelationResult::from_bool(same)
            }
            // Remaining variants are equal only when their ids are.
            (
                TypeData::Intrinsic(_)
                | TypeData::Primitive { .. }
                | TypeData::TypeParameter(_)
                | TypeData::Enum(_)
                | TypeData::Object { .. }
                | TypeData::Array { .. }
                | TypeData::Tuple { .. }
                | TypeData::Union { .. }
                | TypeData::Function { .. },
                _,
            ) => RelationResult::False,
        };
        self.leave(key);
        result
    }

    fn all_identical(&mut self, left: &[TypeId], right: &[TypeId]) -> RelationResult {
        for (l, r) in left.iter().zip(right) {
            let result = self.identical(*l, *r);
            if !result.is_true() {
                return result;
            }
        }
        RelationResult::True
    }

    fn unions_identical(&mut self, left: &[TypeId], right: &[TypeId]) -> RelationResult {
        if left.len() != right.len() {
            return RelationResult::False;
        }
        let covered = |rel: &mut Self, from: &[TypeId], to: &[TypeId]| {
            from.iter()
                .all(|m| to.iter().any(|n| rel.identical(*m, *n).is_true()))
        };
        RelationResult::from_bool(covered(self, left, right) && covered(self, right, left))
    }

    /// Parameters, rest parameter and return type pairwise identical.
    pub(crate) fn signatures_identical(&mut self, left: SignatureId, right: SignatureId) -> bool {
        if left == right {
            return true;
        }
        let env = self.env;
        let (l, r) = (env.signature(left), env.signature(right));
        if l.params.len() != r.params.len()
            || l.rest.is_some() != r.rest.is_some()
            || l.min_arg_count != r.min_arg_count
        {
            return false;
        }
        let params = l
            .params
            .iter()
            .zip(&r.params)
            .all(|(p, q)| self.identical(p.ty, q.ty).is_true());
        let rest = match (l.rest, r.rest) {
            (Some(p), Some(q)) => self.identical(p, q).is_true(),
            _ => true,
        };
        params && rest && self.identical(l.return_type, r.return_type).is_true()
    }

    /// Whether `sup` is a supertype of `sub`.
    pub(crate) fn supertype(&mut self, sup: TypeId, sub: TypeId) -> RelationResult {
        if sup == sub {
            return RelationResult::True;
        }
        let env = self.env;
        let (fsup, fsub) = (env.flags(sup), env.flags(sub));
        if (fsup | fsub).contains(TypeFlags::ERROR)
            || fsub.contains(TypeFlags::NEVER)
            || fsup.contains(TypeFlags::ANY)
        {
            return RelationResult::True;
        }
        if self.has_flag(RelationFlags::IGNORE_TYPE_PARAMETERS)
            && (fsup | fsub).contains(TypeFlags::TYPE_PARAMETER)
        {
            return RelationResult::True;
        }
        // Root object fast path: every class, interface, array, tuple and
        // function type derives from it.
        if env.is_root_object(sup) && env.is_object_like(sub) {
            return RelationResult::True;
        }

        let memo_key = (sup, sub, self.flags().memo_bits());
        let memoize = env.options().memoize_relations;
        if memoize && let Some(cached) = env.caches.supertype_memo.get(&memo_key) {
            return RelationResult::from_bool(*cached);
        }

        let key = (Judgment::Supertype, sup, sub);
        if let Err(assumed) = self.enter(key) {
            return assumed;
        }
        let outer_provisional = std::mem::take(&mut self.state.provisional);
        let result = self.supertype_structural(sup, sub);
        let provisional = self.state.provisional;
        self.state.provisional |= outer_provisional;
        self.leave(key);

        if memoize && !provisional {
            env.caches.supertype_memo.insert(memo_key, result.is_true());
        }
        trace!(?sup, ?sub, ?result, "supertype");
        result
    }

    fn supertype_structural(&mut self, sup: TypeId, sub: TypeId) -> RelationResult {
        let env = self.env;
        let (sup_data, sub_data) = (env.lookup(sup), env.lookup(sub));
        match (&*sup_data, &*sub_data) {
            (_, TypeData::Union { members }) => self.union_sub_supertype(sup, members),
            (TypeData::Union { members }, _) => self.union_sup_supertype(members, sub),
            (_, TypeData::TypeParameter(param)) => {
                let constraint = env.type_param_constraint(*param);
                self.supertype(sup, constraint)
            }
            (TypeData::Primitive { kind: k1, .. }, TypeData::Primitive { kind: k2, .. }) => {
                RelationResult::from_bool(k1 == k2)
            }
            (TypeData::Object { decl, args }, TypeData::Object { .. }) => {
                self.object_supertype(*decl, args, sub)
            }
            (TypeData::Object { decl, .. }, TypeData::Function { signatures, .. }) => {
                self.functional_interface_supertype(*decl, sup, signatures)
            }
            (
                TypeData::Array {
                    element: sup_element,
                    rank: sup_rank,
                },
                TypeData::Array {
                    element: sub_element,
                    rank: sub_rank,
                },
            ) => self.array_supertype((*sup_element, *sup_rank), (*sub_element, *sub_rank)),
            (
                TypeData::Tuple {
                    elements: sup_elements,
                    readonly: sup_readonly,
                },
                TypeData::Tuple {
                    elements: sub_elements,
                    readonly: sub_readonly,
                },
            ) => self.tuple_supertype(sup_elements, *sup_readonly, sub_elements, *sub_readonly),
            (TypeData::Array { .. }, TypeData::Tuple { elements, readonly }) => {
                self.array_of_tuple_supertype(sup, elements, *readonly)
            }
            (
                TypeData::Function {
                    signatures: sup_signatures,
                    ..
                },
                TypeData::Function {
                    signatures: sub_signatures,
                    ..
                },
            ) => {
                let covered = sup_signatures.iter().all(|target| {
                    sub_signatures
                        .iter()
                        .any(|source| self.is_signature_compatible(*target, *source))
                });
                RelationResult::from_bool(covered)
            }
            // Nullish types, enums, type parameters as supertypes and
            // mismatched variants only relate by identity.
            (
                TypeData::Intrinsic(_)
                | TypeData::Primitive { .. }
                | TypeData::Object { .. }
                | TypeData::Array { .. }
                | TypeData::Tuple { .. }
                | TypeData::Function { .. }
                | TypeData::TypeParameter(_)
                | TypeData::Enum(_),
                _,
            ) => RelationResult::False,
        }
    }

    /// Element relation shared by arrays and tuples: primitive elements
    /// must be identical, reference elements are covariant.
    pub(crate) fn element_supertype(&mut self, sup: TypeId, sub: TypeId) -> RelationResult {
        let env = self.env;
        if (env.flags(sup) | env.flags(sub)).intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM) {
            return self.identical(sup, sub);
        }
        self.supertype(sup, sub)
    }
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
