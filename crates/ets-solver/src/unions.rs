//! Union construction and union-specific helpers.
//!
//! [`TypeEnv::union`] is the only way to build a union. Normalization is
//! idempotent:
//! 1. nested unions are flattened and `never` members dropped;
//! 2. a union made only of numeric primitives collapses to the widest one;
//! 3. primitives and enums are boxed, then any member that is a subtype of
//!    another member is dropped, until nothing changes.
//!
//! The assembler type (the single runtime type code generation uses for a
//! union value) is the least upper bound of the constituents.

use crate::env::TypeEnv;
use crate::relation::{RelationFlags, RelationResult};
use crate::types::{ObjectFlags, PrimitiveKind, TypeData, TypeFlags, TypeId, TypeList};
use tracing::trace;

impl TypeEnv {
    /// Build the normalized union of `members`.
    pub fn union(&self, members: &[TypeId]) -> TypeId {
        let mut flat = TypeList::new();
        for member in members {
            self.flatten_into(*member, &mut flat);
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        if let Some(collapsed) = self.collapse_primitives(&flat) {
            return collapsed;
        }

        let mut boxed: TypeList = flat
            .iter()
            .map(|member| self.box_type(*member).unwrap_or(*member))
            .collect();
        boxed.sort_unstable();
        boxed.dedup();
        self.reduce_subtypes(&mut boxed);
        trace!(members = ?boxed, "normalized union");
        self.arena().union_raw(boxed)
    }

    fn flatten_into(&self, ty: TypeId, out: &mut TypeList) {
        if ty == TypeId::NEVER {
            return;
        }
        match &*self.lookup(ty) {
            TypeData::Union { members } => {
                for member in members {
                    self.flatten_into(*member, out);
                }
            }
            _ => out.push(ty),
        }
    }

    /// All-primitive unions never materialize: numeric members collapse to
    /// their common widening, all-boolean ones to `boolean`.
    fn collapse_primitives(&self, members: &[TypeId]) -> Option<TypeId> {
        let (first, rest) = members.split_first()?;
        let mut kind = self.primitive_kind(*first)?;
        for member in rest {
            let next = self.primitive_kind(*member)?;
            kind = if kind == PrimitiveKind::Boolean || next == PrimitiveKind::Boolean {
                (kind == next).then_some(kind)?
            } else {
                kind.common_widening(next)?
            };
        }
        // A single repeated constant survives; anything else is the kind.
        if rest.iter().all(|member| member == first) {
            return Some(*first);
        }
        Some(kind.type_id())
    }

    /// Drop members subsumed by another member, to a fixpoint.
    fn reduce_subtypes(&self, members: &mut TypeList) {
        let mut relation = self.relation().with_flags(RelationFlags::NO_THROW);
        loop {
            let subsumed = (0..members.len()).find(|&i| {
                (0..members.len()).any(|j| {
                    i != j && relation.is_supertype_of(members[j], members[i]).is_true()
                })
            });
            match subsumed {
                Some(index) => {
                    members.remove(index);
                }
                None => break,
            }
        }
    }

    /// Runtime representation of `ty`: the least upper bound of a union's
    /// constituents, `ty` itself otherwise.
    pub fn assembler_type(&self, ty: TypeId) -> TypeId {
        let TypeData::Union { members } = &*self.lookup(ty) else {
            return ty;
        };
        if let Some(cached) = self.caches.assembler_types.get(&ty) {
            return *cached;
        }
        let lub = self.least_upper_bound(members);
        self.caches.assembler_types.insert(ty, lub);
        lub
    }

    fn least_upper_bound(&self, members: &[TypeId]) -> TypeId {
        let root = self.globals().object().unwrap_or(TypeId::ANY);
        let mut lub: Option<TypeId> = None;
        for member in members {
            let flags = self.flags(*member);
            if flags.intersects(TypeFlags::ERROR | TypeFlags::CONTAINS_ERROR) {
                return TypeId::ERROR;
            }
            if flags.intersects(TypeFlags::NULLISH) {
                continue;
            }
            let representative = match &*self.lookup(*member) {
                TypeData::Object { .. }
                    if !self.object_flags(*member).contains(ObjectFlags::INTERFACE) =>
                {
                    *member
                }
                TypeData::Primitive { .. } | TypeData::Enum(_) => {
                    self.box_type(*member).unwrap_or(root)
                }
                // Arrays, tuples, functions, interfaces and type parameters
                // share no ancestor below the root.
                _ => root,
            };
            lub = Some(match lub {
                None => representative,
                Some(current) if current == root || representative == root => root,
                Some(current) => self.closest_common_ancestor(current, representative),
            });
        }
        lub.unwrap_or(root)
    }

    /// Constituents of `ty` compatible with `tested`, as a union.
    ///
    /// Used when a value of union type is narrowed by a type test.
    pub fn narrow_to(&self, ty: TypeId, tested: TypeId) -> TypeId {
        let mut relation = self.relation().with_flags(RelationFlags::NO_THROW);
        let kept: TypeList = self
            .constituents(ty)
            .into_iter()
            .filter(|member| {
                relation.is_supertype_of(tested, *member).is_true()
                    || relation.is_supertype_of(*member, tested).is_true()
            })
            .collect();
        self.union(&kept)
    }

    /// Constituents of `ty` left once `excluded` has been ruled out.
    pub fn complement(&self, ty: TypeId, excluded: TypeId) -> TypeId {
        let mut relation = self.relation().with_flags(RelationFlags::NO_THROW);
        let kept: TypeList = self
            .constituents(ty)
            .into_iter()
            .filter(|member| !relation.is_supertype_of(excluded, *member).is_true())
            .collect();
        self.union(&kept)
    }

    /// The constituent of `ty` identical to `candidate`, if any.
    pub fn find_constituent(&self, ty: TypeId, candidate: TypeId) -> Option<TypeId> {
        let mut relation = self.relation().with_flags(RelationFlags::NO_THROW);
        self.constituents(ty)
            .into_iter()
            .find(|member| relation.is_identical(*member, candidate) == RelationResult::True)
    }

    /// `ty` without its `null` and `undefined` constituents.
    pub fn non_nullish(&self, ty: TypeId) -> TypeId {
        let kept: TypeList = self
            .constituents(ty)
            .into_iter()
            .filter(|member| !member.is_nullish())
            .collect();
        self.union(&kept)
    }

    pub fn contains_nullish(&self, ty: TypeId) -> bool {
        self.constituents(ty).iter().any(|member| member.is_nullish())
    }

    /// Members of a union, or `ty` alone.
    pub fn constituents(&self, ty: TypeId) -> TypeList {
        match &*self.lookup(ty) {
            TypeData::Union { members } => members.clone(),
            _ => std::iter::once(ty).collect(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unions_tests.rs"]
mod tests;
