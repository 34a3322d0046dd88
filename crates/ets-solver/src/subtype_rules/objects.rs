//! Class and interface hierarchy walk with generic variance.

use crate::objects::{AccessContext, PropertySearch, ResolvedProperty};
use crate::prelude::FUNCTIONAL_METHOD;
use crate::relation::{RelationResult, TypeRelation};
use crate::types::{DeclId, ObjectFlags, SignatureId, TypeId, Variance};
use tracing::trace;

impl TypeRelation<'_> {
    /// `sup` is an instantiation of `sup_decl` with `sup_args`.
    ///
    /// Finds the instantiation of `sup_decl` that `sub` extends, then
    /// compares type arguments by each parameter's declared variance.
    pub(crate) fn object_supertype(
        &mut self,
        sup_decl: DeclId,
        sup_args: &[TypeId],
        sub: TypeId,
    ) -> RelationResult {
        let env = self.env;
        let Some(instance) = env.find_supertype_instance(sub, sup_decl) else {
            return RelationResult::False;
        };
        if sup_args.is_empty() {
            return RelationResult::True;
        }
        let sub_args = env.type_args(instance);
        if sub_args.len() != sup_args.len() {
            return RelationResult::False;
        }
        let decl = env.decls().expect_object(sup_decl);
        self.type_arguments_related(&decl.type_params, sup_args, &sub_args)
    }

    pub(crate) fn type_arguments_related(
        &mut self,
        params: &[TypeId],
        sup_args: &[TypeId],
        sub_args: &[TypeId],
    ) -> RelationResult {
        let env = self.env;
        for ((param, sup_arg), sub_arg) in params.iter().zip(sup_args).zip(sub_args) {
            let result = match env.declared_variance(*param) {
                Variance::Covariant => self.supertype(*sup_arg, *sub_arg),
                Variance::Contravariant => self.supertype(*sub_arg, *sup_arg),
                Variance::Invariant => self.identical(*sup_arg, *sub_arg),
            };
            if !result.is_true() {
                trace!(?param, ?sup_arg, ?sub_arg, "type argument mismatch");
                return result;
            }
        }
        RelationResult::True
    }

    /// A function type converts to a functional interface whose single
    /// method it can implement.
    pub(crate) fn functional_interface_supertype(
        &mut self,
        decl: DeclId,
        sup: TypeId,
        signatures: &[SignatureId],
    ) -> RelationResult {
        let env = self.env;
        let Some(object) = env.decls().object(decl) else {
            return RelationResult::False;
        };
        if !object.flags.contains(ObjectFlags::FUNCTIONAL) {
            return RelationResult::False;
        }
        let method = env.intern(FUNCTIONAL_METHOD);
        let Some(ResolvedProperty::Method {
            signatures: targets,
            ..
        }) = env.resolve_property(sup, method, PropertySearch::METHODS, AccessContext::outside())
        else {
            return RelationResult::False;
        };
        let implemented = targets.iter().all(|target| {
            signatures
                .iter()
                .any(|source| self.is_signature_compatible(*target, *source))
        });
        RelationResult::from_bool(implemented)
    }
}
