//! Class and interface types: hierarchy queries and member resolution.
//!
//! Supertypes, interfaces and member tables of an instantiated type are
//! derived from its declaration on first access and cached by type
//! identity in [`EnvCaches`](crate::env::EnvCaches). The declaration itself
//! is never mutated by these queries.

use crate::decl::{AccessModifier, FieldDecl, MemberKey, NestedDecl, ObjectDecl};
use crate::env::TypeEnv;
use crate::instantiate::Substitution;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::relation::RelationFlags;
use crate::types::{DeclId, SignatureId, TypeData, TypeFlags, TypeId};
use bitflags::bitflags;
use ets_common::Atom;
use ets_common::limits::MAX_PROPERTY_RESOLUTION_DEPTH;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, trace};

pub type SignatureList = SmallVec<[SignatureId; 2]>;

/// Members declared directly on one object type, with the type's
/// substitution applied.
#[derive(Clone, Debug, Default)]
pub struct MemberTable {
    pub fields: IndexMap<MemberKey, FieldDecl>,
    pub methods: IndexMap<MemberKey, SignatureList>,
    pub nested: IndexMap<MemberKey, NestedDecl>,
    pub construct_signatures: Vec<SignatureId>,
}

bitflags! {
    /// What [`TypeEnv::resolve_property`] looks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertySearch: u32 {
        /// Look up static members instead of instance members.
        const STATIC  = 1 << 0;
        const FIELDS  = 1 << 1;
        const NESTED  = 1 << 2;
        const METHODS = 1 << 3;

        const ALL = Self::FIELDS.bits() | Self::NESTED.bits() | Self::METHODS.bits();
    }
}

impl Default for PropertySearch {
    fn default() -> Self {
        Self::ALL
    }
}

/// Where a member access happens, for access-modifier checks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessContext {
    /// The class or interface whose body contains the access; `None` for
    /// top-level code.
    pub from: Option<DeclId>,
}

impl AccessContext {
    pub const fn outside() -> Self {
        Self { from: None }
    }

    pub const fn inside(decl: DeclId) -> Self {
        Self { from: Some(decl) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedProperty {
    Field {
        owner: TypeId,
        field: FieldDecl,
    },
    Nested {
        owner: TypeId,
        nested: NestedDecl,
    },
    /// All visible overloads, merged across the hierarchy, most derived first.
    Method {
        owner: TypeId,
        ty: TypeId,
        signatures: SignatureList,
    },
}

impl ResolvedProperty {
    pub fn owner(&self) -> TypeId {
        match self {
            Self::Field { owner, .. } | Self::Nested { owner, .. } | Self::Method { owner, .. } => {
                *owner
            }
        }
    }
}

impl TypeEnv {
    // -------------------------------------------------------------------------
    // Hierarchy
    // -------------------------------------------------------------------------

    /// The direct superclass of an object type, substituted for `ty`'s
    /// type arguments.
    pub fn super_type_of(&self, ty: TypeId) -> Option<TypeId> {
        if let Some(cached) = self.caches.super_types.get(&ty) {
            return *cached;
        }
        let decl = self.object_decl_of(ty)?;
        let super_type = decl
            .super_type
            .map(|s| self.instantiate(s, &self.substitution_of(ty)));
        self.caches.super_types.insert(ty, super_type);
        super_type
    }

    /// Directly implemented (or extended) interfaces, substituted.
    pub fn interfaces_of(&self, ty: TypeId) -> Arc<[TypeId]> {
        if let Some(cached) = self.caches.interfaces.get(&ty) {
            return cached.clone();
        }
        let Some(decl) = self.object_decl_of(ty) else {
            return Arc::from([]);
        };
        let substitution = self.substitution_of(ty);
        let interfaces: Arc<[TypeId]> = decl
            .interfaces
            .iter()
            .map(|i| self.instantiate(*i, &substitution))
            .collect();
        self.caches.interfaces.insert(ty, interfaces.clone());
        interfaces
    }

    /// The uninstantiated declared type of an object type; other types are
    /// their own base.
    pub fn original_base_type(&self, ty: TypeId) -> TypeId {
        self.object_decl_of(ty).map_or(ty, |decl| decl.declared_type)
    }

    /// Whether declaration `sub` extends or implements `sup`, directly or
    /// transitively. Reflexive.
    pub fn derives_from(&self, sub: DeclId, sup: DeclId) -> bool {
        if sub == sup {
            return true;
        }
        let mut visited = FxHashSet::default();
        let mut pending = vec![sub];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(decl) = self.decls().object(current) else {
                continue;
            };
            for parent in decl.super_type.iter().chain(&decl.interfaces) {
                if let Some(parent_decl) = self.decl_of(*parent) {
                    if parent_decl == sup {
                        return true;
                    }
                    pending.push(parent_decl);
                }
            }
        }
        false
    }

    /// The instantiation of `decl` that `ty` extends or implements.
    ///
    /// `Box<String>` for `StringBox extends Box<String>` and `decl = Box`.
    /// Breadth-first, so the nearest instantiation wins.
    pub fn find_supertype_instance(&self, ty: TypeId, decl: DeclId) -> Option<TypeId> {
        if self.decl_of(ty) == Some(decl) {
            return Some(ty);
        }
        let start = self.decl_of(ty)?;
        if !self.derives_from(start, decl) {
            return None;
        }
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let interfaces = self.interfaces_of(current);
            let parents = self
                .super_type_of(current)
                .into_iter()
                .chain(interfaces.iter().copied());
            for parent in parents {
                if parent.is_error() {
                    continue;
                }
                if self.decl_of(parent) == Some(decl) {
                    return Some(parent);
                }
                queue.push_back(parent);
            }
        }
        None
    }

    /// Nearest class both types derive from.
    ///
    /// Interfaces and types without a superclass meet at the root object
    /// type (`any` until it is bound).
    pub fn closest_common_ancestor(&self, source: TypeId, target: TypeId) -> TypeId {
        let mut depth = DepthCounter::with_profile(RecursionProfile::PropertyResolution);
        let result = self.closest_common_ancestor_inner(source, target, &mut depth);
        if depth.is_exceeded() {
            debug!(?source, ?target, "common ancestor search hit the depth limit");
        }
        result
    }

    fn closest_common_ancestor_inner(
        &self,
        source: TypeId,
        target: TypeId,
        depth: &mut DepthCounter,
    ) -> TypeId {
        let root = self.globals().object().unwrap_or(TypeId::ANY);
        let (Some(source_decl), Some(target_decl)) = (self.decl_of(source), self.decl_of(target))
        else {
            return root;
        };
        if source_decl == target_decl {
            return source;
        }
        if self.derives_from(source_decl, target_decl) {
            return target;
        }
        let Some(target_super) = self.super_type_of(target) else {
            return root;
        };
        let target_type = self.original_base_type(target_super);
        let source_type = self.original_base_type(source);
        if let (Some(sup), Some(sub)) = (self.decl_of(target_type), self.decl_of(source_type))
            && self.derives_from(sub, sup)
        {
            return target_type;
        }
        if !depth.enter() {
            return root;
        }
        let result = self.closest_common_ancestor_inner(source_type, target_type, depth);
        depth.leave();
        result
    }

    /// Upper bound a type parameter stands for; other types are returned
    /// unchanged.
    pub fn apparent_type(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_PROPERTY_RESOLUTION_DEPTH {
            match *self.lookup(current) {
                TypeData::TypeParameter(param) => current = self.type_param_constraint(param),
                _ => return current,
            }
        }
        debug!(?ty, "apparent type hit the depth limit");
        TypeId::ERROR
    }

    // -------------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------------

    /// Members declared on `ty` itself, materialized on first access.
    pub fn members(&self, ty: TypeId) -> Option<Arc<MemberTable>> {
        {
            let members = self.caches.members.read().unwrap_or_else(|e| e.into_inner());
            if let Some(table) = members.get(&ty) {
                return Some(table.clone());
            }
        }
        let decl = self.object_decl_of(ty)?;
        let substitution = self.substitution_of(ty);
        let table = Arc::new(self.materialize_members(&decl, &substitution));
        trace!(?ty, fields = table.fields.len(), methods = table.methods.len(), "materialized members");
        let mut members = self.caches.members.write().unwrap_or_else(|e| e.into_inner());
        Some(members.entry(ty).or_insert(table).clone())
    }

    fn materialize_members(
        &self,
        decl: &ObjectDecl,
        substitution: &Substitution,
    ) -> MemberTable {
        let fields = decl
            .fields
            .iter()
            .map(|(key, field)| {
                let mut field = field.clone();
                field.ty = self.instantiate(field.ty, substitution);
                (*key, field)
            })
            .collect();
        let methods = decl
            .methods
            .iter()
            .map(|(key, method)| {
                let signatures = method
                    .signatures
                    .iter()
                    .map(|s| self.substitute_signature(*s, substitution))
                    .collect();
                (*key, signatures)
            })
            .collect();
        let construct_signatures = decl
            .construct_signatures
            .iter()
            .map(|s| self.substitute_signature(*s, substitution))
            .collect();
        MemberTable {
            fields,
            methods,
            nested: decl.nested.clone(),
            construct_signatures,
        }
    }

    pub fn construct_signatures(&self, ty: TypeId) -> Vec<SignatureId> {
        self.members(ty)
            .map(|table| table.construct_signatures.clone())
            .unwrap_or_default()
    }

    /// Whether a member with `access` declared on `owner` can be seen from
    /// `context`.
    pub fn is_accessible(&self, owner: DeclId, access: AccessModifier, context: AccessContext) -> bool {
        match access {
            AccessModifier::Public | AccessModifier::Internal => true,
            AccessModifier::Private => context.from == Some(owner),
            AccessModifier::Protected => context
                .from
                .is_some_and(|from| self.derives_from(from, owner)),
        }
    }

    /// Look up `name` on `ty`: own field, own nested declaration, own
    /// method (merged with inherited overloads), then interfaces in
    /// declaration order, then the superclass.
    pub fn resolve_property(
        &self,
        ty: TypeId,
        name: Atom,
        search: PropertySearch,
        context: AccessContext,
    ) -> Option<ResolvedProperty> {
        let ty = self.apparent_type(ty);
        let mut depth = DepthCounter::with_profile(RecursionProfile::PropertyResolution);
        let result = self.resolve_property_inner(ty, name, search, context, &mut depth);
        if depth.is_exceeded() {
            debug!(?ty, name = name.0, "property resolution hit the depth limit");
        }
        result
    }

    fn resolve_property_inner(
        &self,
        ty: TypeId,
        name: Atom,
        search: PropertySearch,
        context: AccessContext,
        depth: &mut DepthCounter,
    ) -> Option<ResolvedProperty> {
        let decl = self.decl_of(ty)?;
        let table = self.members(ty)?;
        let key = MemberKey {
            name,
            is_static: search.contains(PropertySearch::STATIC),
        };

        if search.contains(PropertySearch::FIELDS)
            && let Some(field) = table.fields.get(&key)
            && self.is_accessible(decl, field.access, context)
        {
            return Some(ResolvedProperty::Field {
                owner: ty,
                field: field.clone(),
            });
        }
        if search.contains(PropertySearch::NESTED)
            && let Some(nested) = table.nested.get(&key)
            && self.is_accessible(decl, nested.access, context)
        {
            return Some(ResolvedProperty::Nested {
                owner: ty,
                nested: nested.clone(),
            });
        }
        if search.contains(PropertySearch::METHODS) && table.methods.contains_key(&key) {
            let signatures = self.merged_method_signatures(ty, key, context);
            if !signatures.is_empty() {
                return Some(ResolvedProperty::Method {
                    owner: ty,
                    ty: self.function_type(&signatures),
                    signatures,
                });
            }
        }

        if !depth.enter() {
            return None;
        }
        let interfaces = self.interfaces_of(ty);
        let parents = interfaces.iter().copied().chain(self.super_type_of(ty));
        let mut found = None;
        for parent in parents {
            if parent.is_error() {
                continue;
            }
            found = self.resolve_property_inner(parent, name, search, context, depth);
            if found.is_some() {
                break;
            }
        }
        depth.leave();
        found
    }

    /// Every visible overload of `key` reachable from `ty`, dropping
    /// inherited signatures that an overload closer to `ty` overrides.
    fn merged_method_signatures(
        &self,
        ty: TypeId,
        key: MemberKey,
        context: AccessContext,
    ) -> SignatureList {
        let mut collected: Vec<(DeclId, SignatureId)> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([ty]);
        while let Some(current) = queue.pop_front() {
            if current.is_error() || !visited.insert(current) {
                continue;
            }
            let (Some(decl), Some(table)) = (self.decl_of(current), self.members(current)) else {
                continue;
            };
            if let Some(signatures) = table.methods.get(&key) {
                collected.extend(signatures.iter().map(|s| (decl, *s)));
            }
            queue.extend(self.interfaces_of(current).iter().copied());
            queue.extend(self.super_type_of(current));
        }

        let mut relation = self.relation().with_flags(RelationFlags::NO_THROW);
        let mut merged = SignatureList::new();
        for (owner, signature) in collected {
            let access = self.signature(signature).access;
            if !self.is_accessible(owner, access, context) {
                continue;
            }
            let overridden = merged
                .iter()
                .any(|kept| relation.are_override_equivalent(*kept, signature));
            if !overridden {
                merged.push(signature);
            }
        }
        merged
    }

    /// Field type of `name` on `ty`, if visible.
    pub fn field_type(&self, ty: TypeId, name: Atom, context: AccessContext) -> Option<TypeId> {
        match self.resolve_property(ty, name, PropertySearch::FIELDS, context)? {
            ResolvedProperty::Field { field, .. } => Some(field.ty),
            _ => None,
        }
    }

    /// Whether the flags of `ty` make it an object, array, tuple or
    /// function: everything the root object type is a supertype of.
    pub(crate) fn is_object_like(&self, ty: TypeId) -> bool {
        self.flags(ty).intersects(
            TypeFlags::OBJECT | TypeFlags::ARRAY | TypeFlags::TUPLE | TypeFlags::FUNCTION,
        )
    }
}

#[cfg(test)]
#[path = "../tests/objects_tests.rs"]
mod tests;
