use super::*;
use crate::options::SolverOptions;
use crate::prelude::{Prelude, declare_prelude};
use crate::signature::Signature;
use crate::types::{ObjectFlags, Variance};

fn setup() -> (TypeEnv, Prelude) {
    let env = TypeEnv::new();
    let prelude = declare_prelude(&env);
    (env, prelude)
}

/// `class Box<T>`
fn generic_box(env: &TypeEnv) -> (DeclId, TypeId) {
    let t = env.declare_type_param("T", Variance::Invariant);
    let decl = env.declare_object("Box", ObjectFlags::CLASS, vec![t]);
    (decl, t)
}

#[test]
fn test_substitution_skips_identity_pairs() {
    let t = TypeId(100);
    let u = TypeId(101);
    let substitution = Substitution::from_params(&[t, u], &[t, TypeId::INT]);

    assert_eq!(substitution.len(), 1);
    assert_eq!(substitution.get(u), Some(TypeId::INT));
    assert_eq!(substitution.get(t), None);
}

#[test]
fn test_substitution_key_is_canonical() {
    let mut first = Substitution::new();
    first.insert(TypeId(101), TypeId::INT);
    first.insert(TypeId(100), TypeId::LONG);
    let mut second = Substitution::new();
    second.insert(TypeId(100), TypeId::LONG);
    second.insert(TypeId(101), TypeId::INT);

    assert_eq!(first.key(), second.key());
    assert_eq!(first.key()[0].0, TypeId(100));
}

#[test]
fn test_instantiation_is_cached() {
    let (env, prelude) = setup();
    let (boxed, _) = generic_box(&env);

    let strings = env.instantiate_generic(boxed, &[prelude.string]);
    let objects = env.instantiate_generic(boxed, &[prelude.object]);

    assert_ne!(strings, objects);
    assert_eq!(env.instantiate_generic(boxed, &[prelude.string]), strings);
    assert_eq!(env.instantiation_count(), 2);
    assert_eq!(env.type_args(strings).as_slice(), &[prelude.string]);
}

#[test]
fn test_own_parameters_yield_declared_type() {
    let (env, _) = setup();
    let (boxed, t) = generic_box(&env);

    assert_eq!(env.instantiate_generic(boxed, &[t]), env.object_type(boxed));
    assert_eq!(env.instantiation_count(), 0);
}

#[test]
fn test_argument_count_mismatch_is_error() {
    let (env, prelude) = setup();
    let (boxed, _) = generic_box(&env);

    assert_eq!(env.instantiate_generic(boxed, &[]), TypeId::ERROR);
    assert_eq!(
        env.instantiate_generic(boxed, &[prelude.string, prelude.string]),
        TypeId::ERROR
    );
}

#[test]
fn test_substitution_reaches_nested_types() {
    let (env, prelude) = setup();
    let (boxed, t) = generic_box(&env);
    let box_t = env.object_type(boxed);

    let composite = env.tuple(&[env.array(t), box_t, env.union(&[t, TypeId::NULL])]);
    let substitution = Substitution::from_params(&[t], &[prelude.string]);
    let result = env.instantiate(composite, &substitution);

    let box_string = env.instantiate_generic(boxed, &[prelude.string]);
    let expected = env.tuple(&[
        env.array(prelude.string),
        box_string,
        env.union(&[prelude.string, TypeId::NULL]),
    ]);
    assert_eq!(result, expected);
}

#[test]
fn test_non_generic_types_are_untouched() {
    let (env, prelude) = setup();
    let (_, t) = generic_box(&env);
    let substitution = Substitution::from_params(&[t], &[prelude.string]);

    assert_eq!(env.instantiate(TypeId::INT, &substitution), TypeId::INT);
    assert_eq!(env.instantiate(prelude.object, &substitution), prelude.object);
    let ints = env.array(TypeId::INT);
    assert_eq!(env.instantiate(ints, &substitution), ints);
}

#[test]
fn test_nested_arrays_keep_rank() {
    let (env, prelude) = setup();
    let (_, t) = generic_box(&env);
    let matrix = env.array(env.array(t));

    let substitution = Substitution::from_params(&[t], &[prelude.string]);
    let result = env.instantiate(matrix, &substitution);
    assert_eq!(result, env.array(env.array(prelude.string)));
}

#[test]
fn test_depth_limit_reports_too_deep() {
    let env = TypeEnv::with_options(SolverOptions::default().with_max_instantiation_depth(2));
    let prelude = declare_prelude(&env);
    let (boxed, t) = generic_box(&env);
    let box_t = env.object_type(boxed);
    let nested = env.instantiate_generic(boxed, &[env.instantiate_generic(boxed, &[box_t])]);

    let substitution = Substitution::from_params(&[t], &[prelude.string]);
    assert_eq!(
        env.instantiate_checked(nested, &substitution),
        Err(RelationError::InstantiationTooDeep { decl: boxed })
    );
    assert!(env.flags(env.instantiate(nested, &substitution)).contains(TypeFlags::CONTAINS_ERROR));

    let shallow = env.instantiate_generic(boxed, &[box_t]);
    assert!(env.instantiate_checked(shallow, &substitution).is_ok());
}

#[test]
fn test_substitution_of_instantiated_type() {
    let (env, prelude) = setup();
    let (boxed, t) = generic_box(&env);
    let strings = env.instantiate_generic(boxed, &[prelude.string]);

    let substitution = env.substitution_of(strings);
    assert_eq!(substitution.get(t), Some(prelude.string));
    assert!(env.substitution_of(prelude.object).is_empty());
}

#[test]
fn test_signature_substitution_is_cached() {
    let (env, prelude) = setup();
    let (boxed, t) = generic_box(&env);
    let get = env.declare_method(boxed, Signature::new(env.intern("get"), t));
    let plain = env.declare_method(boxed, Signature::new(env.intern("size"), TypeId::INT));

    let substitution = Substitution::from_params(&[t], &[prelude.string]);
    let first = env.substitute_signature(get, &substitution);
    let second = env.substitute_signature(get, &substitution);

    assert_eq!(first, second);
    assert_ne!(first, get);
    assert_eq!(env.signature(first).return_type, prelude.string);
    assert_eq!(env.substitute_signature(plain, &substitution), plain);
}

#[test]
fn test_supertypes_are_derived_lazily() {
    // class Base<U>; class Derived<T> extends Base<T[]>
    let (env, prelude) = setup();
    let u = env.declare_type_param("U", Variance::Invariant);
    let base = env.declare_object("Base", ObjectFlags::CLASS, vec![u]);
    env.set_super_type(base, prelude.object);
    let t = env.declare_type_param("T", Variance::Invariant);
    let derived = env.declare_object("Derived", ObjectFlags::CLASS, vec![t]);
    env.set_super_type(derived, env.instantiate_generic(base, &[env.array(t)]));

    let derived_string = env.instantiate_generic(derived, &[prelude.string]);
    assert!(env.caches.super_types.get(&derived_string).is_none());

    let expected = env.instantiate_generic(base, &[env.array(prelude.string)]);
    assert_eq!(env.super_type_of(derived_string), Some(expected));
    assert!(env.caches.super_types.get(&derived_string).is_some());
}
