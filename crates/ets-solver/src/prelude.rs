//! The standard declarations every compilation starts from.
//!
//! A binder normally reports these while walking the standard library;
//! [`declare_prelude`] declares the same shapes directly, for embedders and
//! tests that have no library sources.

use crate::decl::FieldDecl;
use crate::env::TypeEnv;
use crate::registry::GlobalSlot;
use crate::signature::{Signature, SignatureFlags};
use crate::types::{DeclId, ObjectFlags, PrimitiveKind, TypeId, Variance};
use ets_common::limits::MAX_FUNCTION_ARITY;
use tracing::debug;

/// Name of the single abstract method of the `FunctionN` interfaces.
pub const FUNCTIONAL_METHOD: &str = "invoke";

/// Types declared by [`declare_prelude`].
#[derive(Clone, Debug)]
pub struct Prelude {
    pub object: TypeId,
    pub string: TypeId,
    pub bigint: TypeId,
    /// Declaration of the generic `Array<T>` container.
    pub array: DeclId,
}

/// Declare and bind the root object type, the primitive wrappers,
/// `String`, `BigInt`, `Function0` through `Function16` and `Array<T>`.
pub fn declare_prelude(env: &TypeEnv) -> Prelude {
    let object_decl = env.declare_object("Object", ObjectFlags::CLASS, Vec::new());
    let object = env.object_type(object_decl);
    bind(env, "Object", object);

    for kind in PrimitiveKind::ALL {
        let name = wrapper_name(kind);
        let decl = env.declare_class(name);
        env.set_super_type(decl, object);
        let value_of = Signature::new(env.intern("valueOf"), kind.type_id());
        env.declare_method(decl, value_of);
        bind(env, name, env.object_type(decl));
    }

    let string = declare_final_class(env, "String", object);
    let bigint = declare_final_class(env, "BigInt", object);

    for arity in 0..=MAX_FUNCTION_ARITY {
        declare_function_interface(env, arity);
    }

    let element = env.declare_type_param("T", Variance::Invariant);
    let array = env.declare_object("Array", ObjectFlags::CLASS, vec![element]);
    env.set_super_type(array, object);
    env.declare_field(
        array,
        FieldDecl::new(env.intern("length"), TypeId::INT).as_readonly(),
    );
    bind(env, "Array", env.object_type(array));

    debug!(arity = MAX_FUNCTION_ARITY, "declared prelude");
    Prelude {
        object,
        string,
        bigint,
        array,
    }
}

fn bind(env: &TypeEnv, name: &str, ty: TypeId) {
    if !env.bind_global(name, ty) {
        panic!("internal error: {name} is not a well-known type name");
    }
}

const fn wrapper_name(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Boolean => "Boolean",
        PrimitiveKind::Byte => "Byte",
        PrimitiveKind::Char => "Char",
        PrimitiveKind::Short => "Short",
        PrimitiveKind::Int => "Int",
        PrimitiveKind::Long => "Long",
        PrimitiveKind::Float => "Float",
        PrimitiveKind::Double => "Double",
    }
}

fn declare_final_class(env: &TypeEnv, name: &str, object: TypeId) -> TypeId {
    let decl = env.declare_class(name);
    env.set_super_type(decl, object);
    let ty = env.object_type(decl);
    bind(env, name, ty);
    ty
}

/// `interface FunctionN<in P1, ..., in PN, out R> { invoke(p1: P1, ...): R }`
fn declare_function_interface(env: &TypeEnv, arity: u8) {
    let params: Vec<TypeId> = (1..=arity)
        .map(|i| env.declare_type_param(&format!("P{i}"), Variance::Contravariant))
        .collect();
    let result = env.declare_type_param("R", Variance::Covariant);

    let mut type_params = params.clone();
    type_params.push(result);
    let name = format!("Function{arity}");
    let decl = env.declare_object(&name, ObjectFlags::INTERFACE, type_params);

    let invoke = params
        .iter()
        .enumerate()
        .fold(
            Signature::new(env.intern(FUNCTIONAL_METHOD), result),
            |signature, (i, param)| signature.param(env.intern(&format!("p{}", i + 1)), *param),
        )
        .flags(SignatureFlags::ABSTRACT);
    env.declare_method(decl, invoke);
    bind(env, &name, env.object_type(decl));
    debug_assert_eq!(GlobalSlot::from_name(&name), Some(GlobalSlot::Function(arity)));
}
