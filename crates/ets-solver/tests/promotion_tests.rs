use super::*;
use crate::prelude::declare_prelude;

#[test]
fn test_binary_promotion_picks_widest_kind() {
    let env = TypeEnv::new();
    let promote = |l, r| env.binary_numeric_promotion(l, r).map(|p| p.ty);

    assert_eq!(promote(TypeId::INT, TypeId::DOUBLE), Some(TypeId::DOUBLE));
    assert_eq!(promote(TypeId::FLOAT, TypeId::LONG), Some(TypeId::FLOAT));
    assert_eq!(promote(TypeId::LONG, TypeId::BYTE), Some(TypeId::LONG));
    assert_eq!(promote(TypeId::BYTE, TypeId::SHORT), Some(TypeId::INT));
    assert_eq!(promote(TypeId::CHAR, TypeId::CHAR), Some(TypeId::CHAR));
    assert_eq!(promote(TypeId::CHAR, TypeId::BYTE), Some(TypeId::INT));
    assert_eq!(promote(TypeId::BOOLEAN, TypeId::INT), None);
    assert_eq!(promote(TypeId::INT, TypeId::NULL), None);
}

#[test]
fn test_binary_promotion_tracks_constants() {
    let env = TypeEnv::new();
    let two = env.constant(ConstValue::Int(2));
    let half = env.constant(ConstValue::Double(0.5));

    let folded = env.binary_numeric_promotion(two, half).expect("numeric");
    assert_eq!(folded.ty, TypeId::DOUBLE);
    assert!(folded.both_constant);

    let mixed = env.binary_numeric_promotion(two, TypeId::INT).expect("numeric");
    assert!(!mixed.both_constant);
}

#[test]
fn test_promotion_unboxes_wrappers() {
    let env = TypeEnv::new();
    declare_prelude(&env);
    let int = env.boxed_type(PrimitiveKind::Int).expect("bound");
    let boolean = env.boxed_type(PrimitiveKind::Boolean).expect("bound");

    assert_eq!(env.unboxed_primitive(int), Some(PrimitiveKind::Int));
    assert_eq!(
        env.binary_numeric_promotion(int, TypeId::LONG).map(|p| p.ty),
        Some(TypeId::LONG)
    );
    assert_eq!(env.binary_numeric_promotion(boolean, TypeId::LONG), None);
}

#[test]
fn test_unary_promotion() {
    let env = TypeEnv::new();

    assert_eq!(env.unary_numeric_promotion(TypeId::BYTE, false), Some(TypeId::INT));
    assert_eq!(env.unary_numeric_promotion(TypeId::CHAR, false), Some(TypeId::INT));
    assert_eq!(env.unary_numeric_promotion(TypeId::LONG, false), Some(TypeId::LONG));
    assert_eq!(env.unary_numeric_promotion(TypeId::BOOLEAN, false), None);

    let letter = env.constant(ConstValue::Char(65));
    assert_eq!(
        env.unary_numeric_promotion(letter, true),
        Some(env.constant(ConstValue::Int(65)))
    );
    assert_eq!(env.unary_numeric_promotion(letter, false), Some(TypeId::INT));
}

#[test]
fn test_conditional_promotion() {
    let env = TypeEnv::new();
    let small = env.constant(ConstValue::Int(10));
    let large = env.constant(ConstValue::Int(1000));

    assert_eq!(env.conditional_promotion(TypeId::SHORT, TypeId::SHORT), Some(TypeId::SHORT));
    assert_eq!(env.conditional_promotion(small, TypeId::BYTE), Some(TypeId::BYTE));
    assert_eq!(env.conditional_promotion(TypeId::CHAR, small), Some(TypeId::CHAR));
    assert_eq!(env.conditional_promotion(large, TypeId::BYTE), Some(TypeId::INT));
    assert_eq!(env.conditional_promotion(TypeId::INT, TypeId::DOUBLE), Some(TypeId::DOUBLE));
    assert_eq!(env.conditional_promotion(TypeId::BYTE, TypeId::SHORT), Some(TypeId::INT));
}
