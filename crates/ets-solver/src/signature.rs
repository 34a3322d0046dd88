//! Call signatures and the relations between them.
//!
//! A [`Signature`] is not a type; function types and method members refer
//! to signatures by [`SignatureId`]. The store is append-only: substituting
//! a signature produces a new one (cached by the instantiator).

use crate::decl::AccessModifier;
use crate::instantiate::Substitution;
use crate::relation::{RelationFlags, TypeRelation};
use crate::types::{TypeData, TypeFlags, TypeId};
use bitflags::bitflags;
use ets_common::Atom;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

pub use crate::types::SignatureId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SignatureFlags: u32 {
        const ABSTRACT    = 1 << 0;
        const STATIC      = 1 << 1;
        const CONSTRUCTOR = 1 << 2;
        const GETTER      = 1 << 3;
        const SETTER      = 1 << 4;
        const THROWS      = 1 << 5;
        const RETHROWS    = 1 << 6;
        const EXTENSION   = 1 << 7;
        const FINAL       = 1 << 8;

        const THROW_MARKERS = Self::THROWS.bits() | Self::RETHROWS.bits();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Atom,
    pub ty: TypeId,
    pub optional: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub name: Atom,
    pub type_params: Vec<TypeId>,
    pub params: Vec<Param>,
    /// Array type of the rest parameter.
    pub rest: Option<TypeId>,
    pub min_arg_count: usize,
    pub return_type: TypeId,
    /// The object type declaring this signature.
    pub owner: Option<TypeId>,
    pub flags: SignatureFlags,
    pub access: AccessModifier,
}

impl Signature {
    pub fn new(name: Atom, return_type: TypeId) -> Self {
        Self {
            name,
            type_params: Vec::new(),
            params: Vec::new(),
            rest: None,
            min_arg_count: 0,
            return_type,
            owner: None,
            flags: SignatureFlags::empty(),
            access: AccessModifier::Public,
        }
    }

    pub fn param(mut self, name: Atom, ty: TypeId) -> Self {
        debug_assert!(
            self.params.iter().all(|p| !p.optional),
            "required parameter after an optional one"
        );
        self.params.push(Param {
            name,
            ty,
            optional: false,
        });
        self.min_arg_count += 1;
        self
    }

    pub fn optional_param(mut self, name: Atom, ty: TypeId) -> Self {
        self.params.push(Param {
            name,
            ty,
            optional: true,
        });
        self
    }

    pub fn rest(mut self, array_ty: TypeId) -> Self {
        self.rest = Some(array_ty);
        self
    }

    pub fn type_params(mut self, params: Vec<TypeId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn flags(mut self, flags: SignatureFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn access(mut self, access: AccessModifier) -> Self {
        self.access = access;
        self
    }

    pub fn owner(mut self, owner: TypeId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(SignatureFlags::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.flags.contains(SignatureFlags::FINAL)
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Append-only signature storage.
pub struct SignatureStore {
    signatures: RwLock<Vec<Arc<Signature>>>,
}

impl Default for SignatureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureStore {
    pub fn new() -> Self {
        Self {
            signatures: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, signature: Signature) -> SignatureId {
        let mut signatures = self.signatures.write().unwrap_or_else(|e| e.into_inner());
        let id = SignatureId(signatures.len() as u32);
        signatures.push(Arc::new(signature));
        id
    }

    /// # Panics
    /// Panics on an id from another store: signature info is never null.
    pub fn get(&self, id: SignatureId) -> Arc<Signature> {
        let signatures = self.signatures.read().unwrap_or_else(|e| e.into_inner());
        match signatures.get(id.0 as usize) {
            Some(signature) => signature.clone(),
            None => panic!("internal error: signature {id:?} has no info"),
        }
    }

    pub fn len(&self) -> usize {
        self.signatures
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why an overriding method is rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OverrideErrorCode {
    NoError,
    OverriddenFinal,
    IncompatibleReturn,
    OverriddenWeaker,
}

impl fmt::Display for OverrideErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoError => "no error",
            Self::OverriddenFinal => "overridden method is final",
            Self::IncompatibleReturn => {
                "overriding return type is not compatible with the other return type"
            }
            Self::OverriddenWeaker => "overridden method has weaker access privilege",
        })
    }
}

// =============================================================================
// Signature relations
// =============================================================================

impl TypeRelation<'_> {
    /// Whether a callee with signature `source` can be used where `target`
    /// is expected.
    ///
    /// Parameters are contravariant and the return type covariant, unless
    /// `OVERRIDING_CONTEXT` demands identical parameters or
    /// `NO_RETURN_TYPE_CHECK` skips the return type.
    pub fn is_signature_compatible(&mut self, target: SignatureId, source: SignatureId) -> bool {
        if target == source {
            return true;
        }
        let Some(source) = self.adjust_for_type_parameters(target, source) else {
            return false;
        };
        let env = self.env;
        let target = env.signature(target);
        let source = env.signature(source);

        if self.has_flag(RelationFlags::OVERRIDING_CONTEXT) {
            if target.params.len() != source.params.len()
                || target.rest.is_some() != source.rest.is_some()
            {
                return false;
            }
            let params_match = target
                .params
                .iter()
                .zip(&source.params)
                .all(|(t, s)| self.identical(t.ty, s.ty).is_true());
            let rest_match = match (target.rest, source.rest) {
                (Some(t), Some(s)) => self.identical(t, s).is_true(),
                _ => true,
            };
            if !params_match || !rest_match {
                return false;
            }
        } else {
            // Every call valid for `target` must be valid for `source`.
            if source.min_arg_count > target.params.len() {
                return false;
            }
            if target.rest.is_some() && source.rest.is_none() {
                return false;
            }
            if source.rest.is_none() && target.min_arg_count > source.params.len() {
                return false;
            }
            for (index, target_param) in target.params.iter().enumerate() {
                let source_ty = match source.params.get(index) {
                    Some(param) => param.ty,
                    None => match source.rest.and_then(|rest| env.arena().array_element(rest)) {
                        Some(element) => element,
                        None => {
                            if target_param.optional {
                                continue;
                            }
                            return false;
                        }
                    },
                };
                if !self.parameter_accepts(source_ty, target_param.ty) {
                    return false;
                }
            }
            if let (Some(t), Some(s)) = (target.rest, source.rest)
                && !self.parameter_accepts(s, t)
            {
                return false;
            }
        }

        if self.has_flag(RelationFlags::NO_RETURN_TYPE_CHECK)
            || target.return_type == TypeId::VOID
        {
            return true;
        }
        self.return_accepts(target.return_type, source.return_type)
    }

    fn parameter_accepts(&mut self, source_param: TypeId, target_param: TypeId) -> bool {
        if self.env.flags(source_param).intersects(TypeFlags::PRIMITIVE)
            || self.env.flags(target_param).intersects(TypeFlags::PRIMITIVE)
        {
            return self.identical(source_param, target_param).is_true();
        }
        self.supertype(source_param, target_param).is_true()
    }

    fn return_accepts(&mut self, target_ret: TypeId, source_ret: TypeId) -> bool {
        if self.env.flags(source_ret).intersects(TypeFlags::PRIMITIVE | TypeFlags::VOID) {
            return self.identical(target_ret, source_ret).is_true();
        }
        self.supertype(target_ret, source_ret).is_true()
    }

    /// Same name and same parameter types after aligning type parameters.
    pub fn are_override_equivalent(&mut self, s1: SignatureId, s2: SignatureId) -> bool {
        let env = self.env;
        if env.signature(s1).name != env.signature(s2).name {
            return false;
        }
        self.with_added_flags(
            RelationFlags::OVERRIDING_CONTEXT | RelationFlags::NO_RETURN_TYPE_CHECK,
            |rel| rel.is_signature_compatible(s1, s2),
        )
    }

    /// Whether `s1`'s return type may replace `s2`'s in an override.
    ///
    /// Primitive, enum and `void` returns must be identical; reference
    /// returns are covariant. A type-parameter return of `s2` also accepts
    /// anything below its constraint.
    pub fn is_return_type_substitutable(&mut self, s1: SignatureId, s2: SignatureId) -> bool {
        let env = self.env;
        let r1 = env.signature(s1).return_type;
        let r2 = env.signature(s2).return_type;

        if env
            .flags(r1)
            .intersects(TypeFlags::PRIMITIVE | TypeFlags::ENUM | TypeFlags::VOID)
        {
            return self.identical(r2, r1).is_true();
        }
        if self.supertype(r2, r1).is_true() {
            return true;
        }
        match &*env.lookup(r2) {
            TypeData::TypeParameter(param) => {
                let constraint = env.type_param_constraint(*param);
                self.supertype(constraint, r1).is_true()
            }
            _ => false,
        }
    }

    /// Classify whether `signature` may override `other`.
    pub fn check_override(&mut self, signature: SignatureId, other: SignatureId) -> OverrideErrorCode {
        let env = self.env;
        let sig = env.signature(signature);
        let base = env.signature(other);

        if base.is_static() {
            debug_assert!(sig.is_static(), "static method hidden by an instance method");
            return OverrideErrorCode::NoError;
        }
        if base.is_final() {
            return OverrideErrorCode::OverriddenFinal;
        }
        if env.flags(base.return_type).contains(TypeFlags::TYPE_PARAMETER) {
            // foo<T>(x: T): T may be overridden by foo(x: C): C
            if !env.is_reference_type(sig.return_type) {
                return OverrideErrorCode::IncompatibleReturn;
            }
        } else if !self.is_return_type_substitutable(signature, other) {
            return OverrideErrorCode::IncompatibleReturn;
        }
        if sig.access > base.access {
            return OverrideErrorCode::OverriddenWeaker;
        }
        OverrideErrorCode::NoError
    }

    /// Whether a subclass method may override `signature` at all.
    pub fn is_overridable_in(&self, signature: SignatureId) -> bool {
        self.env.signature(signature).access != AccessModifier::Private
    }

    /// Whether `derived` overrides `base`.
    pub fn is_method_overriding(&mut self, base: SignatureId, derived: SignatureId) -> bool {
        let env = self.env;
        let derived_sig = env.signature(derived);
        if derived_sig.flags.contains(SignatureFlags::CONSTRUCTOR) {
            return false;
        }
        if base == derived {
            return true;
        }
        if derived_sig.is_static() != env.signature(base).is_static() {
            return false;
        }
        if !self.is_overridable_in(base) {
            return false;
        }
        let compatible = self.with_added_flags(
            RelationFlags::NO_RETURN_TYPE_CHECK | RelationFlags::OVERRIDING_CONTEXT,
            |rel| rel.is_signature_compatible(base, derived),
        );
        compatible && !derived_sig.is_static()
    }

    /// Whether `target` keeps the throw markers of `source`.
    ///
    /// An override may drop `throws`, and may turn `throws` into
    /// `rethrows`, but may not add throwing.
    pub fn check_throw_markers(&self, source: SignatureId, target: SignatureId) -> bool {
        let env = self.env;
        let source = env.signature(source).flags & SignatureFlags::THROW_MARKERS;
        let target = env.signature(target).flags & SignatureFlags::THROW_MARKERS;
        if source == target {
            return true;
        }
        let source_rethrows = source.contains(SignatureFlags::RETHROWS);
        let source_throws = source.contains(SignatureFlags::THROWS);
        let target_throws = target.contains(SignatureFlags::THROWS);
        let invalid = (source_rethrows && target_throws) || (!source_throws && !target.is_empty());
        if invalid {
            debug!(?source, ?target, "throw marker mismatch");
        }
        !invalid
    }

    /// Rename `target`'s type parameters to `source`'s.
    ///
    /// `None` when the counts differ.
    pub fn adjust_for_type_parameters(
        &mut self,
        source: SignatureId,
        target: SignatureId,
    ) -> Option<SignatureId> {
        let env = self.env;
        let source_sig = env.signature(source);
        let target_sig = env.signature(target);
        let source_params = &source_sig.type_params;
        let target_params = &target_sig.type_params;
        if source_params.len() != target_params.len() {
            return None;
        }
        if source_params.is_empty() || source_params == target_params {
            return Some(target);
        }
        let mut substitution = Substitution::new();
        for (from, to) in target_params.iter().zip(source_params) {
            if env.flags(*from).contains(TypeFlags::TYPE_PARAMETER) {
                substitution.insert(*from, *to);
            }
        }
        trace!(?source, ?target, "aligning signature type parameters");
        Some(env.substitute_signature(target, &substitution))
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
