//! Generic substitution and the instantiation cache.
//!
//! Instantiating `Box<T>` with `T = String` produces an object type that
//! shares `Box`'s declaration and carries the new arguments. Nothing else
//! is copied eagerly: supertypes, interfaces and members of an
//! instantiation are derived on first access (see [`crate::objects`]), so
//! mutually referential generics never recurse at instantiation time.
//!
//! Instantiations are cached by declaration and argument list, and types
//! are hash-consed, so repeating an instantiation yields the same
//! [`TypeId`].

use crate::diagnostics::RelationError;
use crate::env::TypeEnv;
use crate::types::{DeclId, SignatureId, TypeData, TypeFlags, TypeId, TypeList};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Canonical (sorted) form of a substitution, used as a cache key.
pub type SubstitutionKey = SmallVec<[(TypeId, TypeId); 4]>;

/// Mapping from type-parameter types to their replacements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    map: FxHashMap<TypeId, TypeId>,
}

impl Substitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair each parameter with the argument at the same position.
    /// Identity pairs are skipped.
    pub fn from_params(params: &[TypeId], args: &[TypeId]) -> Self {
        let mut substitution = Self::new();
        for (param, arg) in params.iter().zip(args) {
            substitution.insert(*param, *arg);
        }
        substitution
    }

    pub fn insert(&mut self, param: TypeId, replacement: TypeId) {
        if param != replacement {
            self.map.insert(param, replacement);
        }
    }

    pub fn get(&self, param: TypeId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn key(&self) -> SubstitutionKey {
        let mut key: SubstitutionKey = self.map.iter().map(|(k, v)| (*k, *v)).collect();
        key.sort_unstable();
        key
    }
}

/// Applies one substitution, tracking nesting depth per generic declaration.
pub struct Instantiator<'e> {
    env: &'e TypeEnv,
    substitution: &'e Substitution,
    depth: FxHashMap<DeclId, u32>,
    max_depth: u32,
    exceeded: Option<DeclId>,
}

impl<'e> Instantiator<'e> {
    pub fn new(env: &'e TypeEnv, substitution: &'e Substitution) -> Self {
        Self {
            env,
            substitution,
            depth: FxHashMap::default(),
            max_depth: env.options().max_instantiation_depth,
            exceeded: None,
        }
    }

    /// The declaration whose nesting limit was hit, if any.
    pub fn exceeded(&self) -> Option<DeclId> {
        self.exceeded
    }

    pub fn instantiate(&mut self, ty: TypeId) -> TypeId {
        if self.substitution.is_empty() || !self.env.flags(ty).contains(TypeFlags::GENERIC) {
            return ty;
        }
        let env = self.env;
        match &*env.lookup(ty) {
            TypeData::TypeParameter(_) => self.substitution.get(ty).unwrap_or(ty),
            TypeData::Object { decl, args } => {
                let depth = self.depth.entry(*decl).or_insert(0);
                if *depth >= self.max_depth {
                    debug!(decl_id = decl.0, "instantiation depth limit hit");
                    self.exceeded.get_or_insert(*decl);
                    return TypeId::ERROR;
                }
                *depth += 1;
                let new_args: TypeList = args.iter().map(|arg| self.instantiate(*arg)).collect();
                if let Some(depth) = self.depth.get_mut(decl) {
                    *depth -= 1;
                }
                if new_args == *args {
                    return ty;
                }
                env.instantiate_generic(*decl, &new_args)
            }
            TypeData::Array { element, rank } => {
                let new_element = self.instantiate(*element);
                if new_element == *element {
                    return ty;
                }
                let mut result = new_element;
                for _ in 0..*rank {
                    result = env.array(result);
                }
                result
            }
            TypeData::Tuple { elements, readonly } => {
                let new_elements: TypeList =
                    elements.iter().map(|e| self.instantiate(*e)).collect();
                if new_elements == *elements {
                    return ty;
                }
                env.arena().tuple(&new_elements, *readonly)
            }
            TypeData::Union { members } => {
                let new_members: TypeList = members.iter().map(|m| self.instantiate(*m)).collect();
                if new_members == *members {
                    return ty;
                }
                env.union(&new_members)
            }
            TypeData::Function {
                signatures,
                extensions,
            } => {
                let new_signatures: SmallVec<[SignatureId; 2]> = signatures
                    .iter()
                    .map(|s| env.substitute_signature(*s, self.substitution))
                    .collect();
                let new_extensions: SmallVec<[SignatureId; 1]> = extensions
                    .iter()
                    .map(|s| env.substitute_signature(*s, self.substitution))
                    .collect();
                if new_signatures == *signatures && new_extensions == *extensions {
                    return ty;
                }
                env.arena().intern(TypeData::Function {
                    signatures: new_signatures,
                    extensions: new_extensions,
                })
            }
            TypeData::Intrinsic(_) | TypeData::Primitive { .. } | TypeData::Enum(_) => ty,
        }
    }
}

impl TypeEnv {
    /// Apply `substitution` to `ty`. Hitting the depth limit yields the
    /// error type in place of the offending instantiation.
    pub fn instantiate(&self, ty: TypeId, substitution: &Substitution) -> TypeId {
        Instantiator::new(self, substitution).instantiate(ty)
    }

    /// Like [`instantiate`](Self::instantiate) but reports the depth limit.
    pub fn instantiate_checked(
        &self,
        ty: TypeId,
        substitution: &Substitution,
    ) -> Result<TypeId, RelationError> {
        let mut instantiator = Instantiator::new(self, substitution);
        let result = instantiator.instantiate(ty);
        match instantiator.exceeded() {
            Some(decl) => Err(RelationError::InstantiationTooDeep { decl }),
            None => Ok(result),
        }
    }

    /// `decl<args...>`, cached.
    ///
    /// An argument count that does not match the declaration's type
    /// parameters yields the error type.
    pub fn instantiate_generic(&self, decl: DeclId, args: &[TypeId]) -> TypeId {
        let object = self.decls().expect_object(decl);
        if object.type_params.len() != args.len() {
            debug!(
                decl_id = decl.0,
                expected = object.type_params.len(),
                got = args.len(),
                "type argument count mismatch"
            );
            return TypeId::ERROR;
        }
        if object.type_params.as_slice() == args {
            return object.declared_type;
        }
        let key: (DeclId, TypeList) = (decl, args.iter().copied().collect());
        if let Some(cached) = self.caches.instantiations.get(&key) {
            return *cached;
        }
        let ty = self.arena().intern(TypeData::Object {
            decl,
            args: key.1.clone(),
        });
        debug!(decl_id = decl.0, ?args, ?ty, "instantiation cache miss");
        *self.caches.instantiations.entry(key).or_insert(ty)
    }

    /// The substitution that turns `ty`'s declaration into `ty`.
    pub fn substitution_of(&self, ty: TypeId) -> Substitution {
        match &*self.lookup(ty) {
            TypeData::Object { decl, args } => {
                let object = self.decls().expect_object(*decl);
                Substitution::from_params(&object.type_params, args)
            }
            _ => Substitution::new(),
        }
    }

    /// Substitute into every type a signature mentions, cached per
    /// substitution.
    pub fn substitute_signature(&self, id: SignatureId, substitution: &Substitution) -> SignatureId {
        if substitution.is_empty() {
            return id;
        }
        let key = (id, substitution.key());
        if let Some(cached) = self.caches.substituted_signatures.get(&key) {
            return *cached;
        }

        let original = self.signature(id);
        let mut instantiator = Instantiator::new(self, substitution);
        let mut signature = (*original).clone();
        for param in &mut signature.params {
            param.ty = instantiator.instantiate(param.ty);
        }
        signature.type_params = signature
            .type_params
            .iter()
            .map(|p| instantiator.instantiate(*p))
            .collect();
        signature.rest = signature.rest.map(|rest| instantiator.instantiate(rest));
        signature.return_type = instantiator.instantiate(signature.return_type);
        signature.owner = signature.owner.map(|owner| instantiator.instantiate(owner));

        let result = if signature == *original {
            id
        } else {
            self.add_signature(signature)
        };
        trace!(original = id.0, result = result.0, "substituted signature");
        *self.caches.substituted_signatures.entry(key).or_insert(result)
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
