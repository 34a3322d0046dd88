//! Variance validation of type-parameter uses.
//!
//! A type parameter declared `out` (covariant) may only appear in
//! covariant positions, one declared `in` (contravariant) only in
//! contravariant positions. Positions compose while walking a type: a
//! type argument's position is the enclosing position composed with the
//! declared variance of the corresponding parameter, function parameters
//! flip it, and an invariant parameter forces invariance below it.

use crate::diagnostics::RelationError;
use crate::env::TypeEnv;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{DeclId, SignatureId, TypeData, TypeId, Variance};
use tracing::debug;

/// Collects variance violations in one declaration or type.
pub struct VarianceChecker<'e> {
    env: &'e TypeEnv,
    depth: DepthCounter,
    violations: Vec<RelationError>,
}

impl<'e> VarianceChecker<'e> {
    pub fn new(env: &'e TypeEnv) -> Self {
        Self {
            env,
            depth: DepthCounter::with_profile(RecursionProfile::Variance),
            violations: Vec::new(),
        }
    }

    /// Check every use of an annotated type parameter inside `ty`, which
    /// occurs at `position`.
    pub fn check_type(&mut self, ty: TypeId, position: Variance) {
        if !self.depth.enter() {
            debug!(?ty, "variance check hit the depth limit");
            return;
        }
        let env = self.env;
        match &*env.lookup(ty) {
            TypeData::TypeParameter(param) => {
                let info = env.type_param_info(*param);
                if !Self::allowed(info.variance, position) {
                    self.violations.push(RelationError::VarianceViolation {
                        param: info.name,
                        declared: info.variance,
                        position,
                    });
                }
            }
            TypeData::Object { decl, args } => {
                let params = env.decls().expect_object(*decl).type_params.clone();
                for (param, arg) in params.iter().zip(args) {
                    let declared = env.declared_variance(*param);
                    self.check_type(*arg, position.compose(declared));
                }
            }
            TypeData::Array { element, .. } => self.check_type(*element, position),
            TypeData::Tuple { elements, .. } => {
                for element in elements {
                    self.check_type(*element, position);
                }
            }
            TypeData::Union { members } => {
                for member in members {
                    self.check_type(*member, position);
                }
            }
            TypeData::Function { signatures, .. } => {
                for signature in signatures {
                    self.check_signature_at(*signature, position);
                }
            }
            TypeData::Intrinsic(_) | TypeData::Primitive { .. } | TypeData::Enum(_) => {}
        }
        self.depth.leave();
    }

    /// Parameters are contravariant positions, the return type covariant.
    pub fn check_signature(&mut self, signature: SignatureId) {
        self.check_signature_at(signature, Variance::Covariant);
    }

    fn check_signature_at(&mut self, signature: SignatureId, position: Variance) {
        let signature = self.env.signature(signature);
        let parameter_position = position.compose(Variance::Contravariant);
        for param in &signature.params {
            self.check_type(param.ty, parameter_position);
        }
        if let Some(rest) = signature.rest {
            self.check_type(rest, parameter_position);
        }
        self.check_type(signature.return_type, position);
    }

    /// Check a class or interface body: mutable fields are invariant,
    /// readonly fields and supertypes covariant, methods by signature.
    pub fn check_declaration(&mut self, decl: DeclId) {
        let object = self.env.decls().expect_object(decl);
        for field in object.fields.values().filter(|f| !f.is_static) {
            let position = if field.readonly {
                Variance::Covariant
            } else {
                Variance::Invariant
            };
            self.check_type(field.ty, position);
        }
        for method in object.methods.values().filter(|m| !m.is_static) {
            for signature in &method.signatures {
                self.check_signature(*signature);
            }
        }
        for parent in object.super_type.iter().chain(&object.interfaces) {
            self.check_type(*parent, Variance::Covariant);
        }
    }

    pub fn violations(&self) -> &[RelationError] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<RelationError> {
        self.violations
    }

    /// Whether a parameter declared `declared` may appear at `position`.
    fn allowed(declared: Variance, position: Variance) -> bool {
        match declared {
            Variance::Invariant => true,
            Variance::Covariant => position == Variance::Covariant,
            Variance::Contravariant => position == Variance::Contravariant,
        }
    }
}

impl TypeEnv {
    /// Variance violations in the body of `decl`.
    pub fn check_variance(&self, decl: DeclId) -> Vec<RelationError> {
        let mut checker = VarianceChecker::new(self);
        checker.check_declaration(decl);
        checker.into_violations()
    }
}

#[cfg(test)]
#[path = "../tests/variance_tests.rs"]
mod tests;
