use super::*;
use crate::env::TypeEnv;
use crate::prelude::{Prelude, declare_prelude};
use crate::types::Variance;

struct Fixture {
    env: TypeEnv,
    prelude: Prelude,
    animal: TypeId,
    dog: TypeId,
}

fn fixture() -> Fixture {
    let env = TypeEnv::new();
    let prelude = declare_prelude(&env);
    let animal_decl = env.declare_class("Animal");
    env.set_super_type(animal_decl, prelude.object);
    let animal = env.object_type(animal_decl);
    let dog_decl = env.declare_class("Dog");
    env.set_super_type(dog_decl, animal);
    let dog = env.object_type(dog_decl);
    Fixture {
        env,
        prelude,
        animal,
        dog,
    }
}

impl Fixture {
    fn atom(&self, name: &str) -> Atom {
        self.env.intern(name)
    }

    fn method(&self, ret: TypeId, params: &[TypeId]) -> Signature {
        params
            .iter()
            .enumerate()
            .fold(Signature::new(self.atom("run"), ret), |signature, (i, ty)| {
                signature.param(self.atom(&format!("p{i}")), *ty)
            })
    }

    fn add(&self, signature: Signature) -> SignatureId {
        self.env.add_signature(signature)
    }
}

#[test]
fn test_signature_builder_counts_required_params() {
    let f = fixture();
    let signature = f
        .method(TypeId::VOID, &[TypeId::INT])
        .optional_param(f.atom("q"), TypeId::INT)
        .rest(f.env.array(TypeId::INT));

    assert_eq!(signature.arity(), 2);
    assert_eq!(signature.min_arg_count, 1);
    assert!(!signature.is_static());
    assert!(signature.clone().flags(SignatureFlags::STATIC).is_static());
}

#[test]
fn test_parameters_are_contravariant() {
    let f = fixture();
    let mut relation = f.env.relation();
    let takes_animal = f.add(f.method(TypeId::VOID, &[f.animal]));
    let takes_dog = f.add(f.method(TypeId::VOID, &[f.dog]));

    assert!(relation.is_signature_compatible(takes_dog, takes_animal));
    assert!(!relation.is_signature_compatible(takes_animal, takes_dog));
}

#[test]
fn test_primitive_parameters_must_match() {
    let f = fixture();
    let mut relation = f.env.relation();
    let takes_int = f.add(f.method(TypeId::VOID, &[TypeId::INT]));
    let takes_long = f.add(f.method(TypeId::VOID, &[TypeId::LONG]));

    assert!(!relation.is_signature_compatible(takes_int, takes_long));
    assert!(!relation.is_signature_compatible(takes_long, takes_int));
}

#[test]
fn test_returns_are_covariant_unless_void() {
    let f = fixture();
    let mut relation = f.env.relation();
    let gives_animal = f.add(f.method(f.animal, &[]));
    let gives_dog = f.add(f.method(f.dog, &[]));
    let gives_nothing = f.add(f.method(TypeId::VOID, &[]));

    assert!(relation.is_signature_compatible(gives_animal, gives_dog));
    assert!(!relation.is_signature_compatible(gives_dog, gives_animal));
    assert!(relation.is_signature_compatible(gives_nothing, gives_dog));

    relation.set_flags(RelationFlags::NO_RETURN_TYPE_CHECK);
    assert!(relation.is_signature_compatible(gives_dog, gives_animal));
}

#[test]
fn test_optional_and_rest_parameters() {
    let f = fixture();
    let mut relation = f.env.relation();
    let unary = f.add(f.method(TypeId::VOID, &[f.dog]));
    let binary = f.add(f.method(TypeId::VOID, &[f.dog, f.dog]));
    let optional_second = f.add(
        f.method(TypeId::VOID, &[f.dog])
            .optional_param(f.atom("extra"), f.dog),
    );
    let variadic = f.add(f.method(TypeId::VOID, &[]).rest(f.env.array(f.animal)));

    assert!(!relation.is_signature_compatible(binary, unary));
    assert!(!relation.is_signature_compatible(unary, binary));
    assert!(relation.is_signature_compatible(unary, optional_second));
    assert!(relation.is_signature_compatible(optional_second, unary));
    assert!(relation.is_signature_compatible(binary, variadic));
    assert!(!relation.is_signature_compatible(variadic, binary));
}

#[test]
fn test_override_equivalence_needs_identical_parameters() {
    let f = fixture();
    let mut relation = f.env.relation();
    let dog_to_void = f.add(f.method(TypeId::VOID, &[f.dog]));
    let dog_to_animal = f.add(f.method(f.animal, &[f.dog]));
    let animal_to_void = f.add(f.method(TypeId::VOID, &[f.animal]));
    let renamed = f.add(Signature::new(f.atom("walk"), TypeId::VOID).param(f.atom("d"), f.dog));

    assert!(relation.are_override_equivalent(dog_to_void, dog_to_animal));
    assert!(!relation.are_override_equivalent(dog_to_void, animal_to_void));
    assert!(!relation.are_override_equivalent(dog_to_void, renamed));
    assert_eq!(relation.flags(), RelationFlags::BOXING);
}

#[test]
fn test_generic_signatures_align_type_parameters() {
    let f = fixture();
    let env = &f.env;
    let t = env.declare_type_param("T", Variance::Invariant);
    let u = env.declare_type_param("U", Variance::Invariant);
    let identity_t = f.add(f.method(t, &[t]).type_params(vec![t]));
    let identity_u = f.add(f.method(u, &[u]).type_params(vec![u]));
    let plain = f.add(f.method(f.animal, &[f.animal]));
    let mut relation = env.relation();

    assert!(relation.are_override_equivalent(identity_t, identity_u));
    assert!(!relation.are_override_equivalent(identity_t, plain));

    let aligned = relation
        .adjust_for_type_parameters(identity_t, identity_u)
        .expect("same type parameter count");
    assert_eq!(env.signature(aligned).return_type, t);
    assert_eq!(relation.adjust_for_type_parameters(identity_t, plain), None);
}

#[test]
fn test_check_override() {
    let f = fixture();
    let mut relation = f.env.relation();
    let base = f.add(f.method(f.animal, &[]));
    let covariant = f.add(f.method(f.dog, &[]));
    let unrelated = f.add(f.method(f.prelude.string, &[]));
    let final_base = f.add(f.method(f.animal, &[]).flags(SignatureFlags::FINAL));
    let weaker = f.add(f.method(f.dog, &[]).access(AccessModifier::Protected));

    assert_eq!(relation.check_override(covariant, base), OverrideErrorCode::NoError);
    assert_eq!(relation.check_override(unrelated, base), OverrideErrorCode::IncompatibleReturn);
    assert_eq!(relation.check_override(covariant, final_base), OverrideErrorCode::OverriddenFinal);
    assert_eq!(relation.check_override(weaker, base), OverrideErrorCode::OverriddenWeaker);
}

#[test]
fn test_primitive_returns_must_be_identical() {
    let f = fixture();
    let mut relation = f.env.relation();
    let gives_int = f.add(f.method(TypeId::INT, &[]));
    let gives_long = f.add(f.method(TypeId::LONG, &[]));

    assert!(!relation.is_return_type_substitutable(gives_int, gives_long));
    assert!(relation.is_return_type_substitutable(gives_int, gives_int));
    assert_eq!(
        relation.check_override(gives_long, gives_int),
        OverrideErrorCode::IncompatibleReturn
    );
}

#[test]
fn test_type_parameter_return_overrides() {
    let f = fixture();
    let env = &f.env;
    let t = env.declare_type_param("T", Variance::Invariant);
    env.set_type_param_constraint(t, f.animal);
    let generic = f.add(f.method(t, &[]));
    let gives_dog = f.add(f.method(f.dog, &[]));
    let gives_int = f.add(f.method(TypeId::INT, &[]));
    let mut relation = env.relation();

    assert!(relation.is_return_type_substitutable(gives_dog, generic));
    assert_eq!(relation.check_override(gives_dog, generic), OverrideErrorCode::NoError);
    assert_eq!(
        relation.check_override(gives_int, generic),
        OverrideErrorCode::IncompatibleReturn
    );
}

#[test]
fn test_is_method_overriding() {
    let f = fixture();
    let mut relation = f.env.relation();
    let base = f.add(f.method(TypeId::VOID, &[f.dog]));
    let derived = f.add(f.method(TypeId::INT, &[f.dog]));
    let private = f.add(f.method(TypeId::VOID, &[f.dog]).access(AccessModifier::Private));
    let statik = f.add(f.method(TypeId::VOID, &[f.dog]).flags(SignatureFlags::STATIC));
    let constructor = f.add(f.method(TypeId::VOID, &[f.dog]).flags(SignatureFlags::CONSTRUCTOR));
    let wider = f.add(f.method(TypeId::VOID, &[f.animal]));

    assert!(relation.is_method_overriding(base, derived));
    assert!(!relation.is_method_overriding(private, derived));
    assert!(!relation.is_method_overriding(base, statik));
    assert!(!relation.is_method_overriding(base, constructor));
    assert!(!relation.is_method_overriding(base, wider));
    assert!(!relation.is_overridable_in(private));
}

#[test]
fn test_throw_markers() {
    let f = fixture();
    let relation = f.env.relation();
    let plain = f.add(f.method(TypeId::VOID, &[]));
    let throws = f.add(f.method(TypeId::VOID, &[]).flags(SignatureFlags::THROWS));
    let rethrows = f.add(f.method(TypeId::VOID, &[]).flags(SignatureFlags::RETHROWS));

    assert!(relation.check_throw_markers(throws, plain));
    assert!(relation.check_throw_markers(throws, rethrows));
    assert!(relation.check_throw_markers(rethrows, plain));
    assert!(!relation.check_throw_markers(plain, throws));
    assert!(!relation.check_throw_markers(rethrows, throws));
    assert!(relation.check_throw_markers(throws, throws));
}

#[test]
fn test_store_is_append_only() {
    let store = SignatureStore::new();
    let interner = ets_common::Interner::new();
    let name = interner.intern("f");

    let first = store.add(Signature::new(name, TypeId::VOID));
    let second = store.add(Signature::new(name, TypeId::VOID));
    assert_ne!(first, second);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(second).return_type, TypeId::VOID);
}
