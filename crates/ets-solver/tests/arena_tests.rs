use super::*;
use crate::types::{DeclId, TypeParamId};

#[test]
fn test_intrinsics_have_reserved_ids() {
    let arena = TypeArena::new();

    assert_eq!(*arena.get(TypeId::NEVER), TypeData::Intrinsic(IntrinsicKind::Never));
    assert_eq!(*arena.get(TypeId::ERROR), TypeData::Intrinsic(IntrinsicKind::Error));
    assert_eq!(*arena.get(TypeId::INT), TypeData::primitive(PrimitiveKind::Int));
    assert_eq!(*arena.get(TypeId::DOUBLE), TypeData::primitive(PrimitiveKind::Double));
    assert_eq!(arena.len(), TypeId::FIRST_DYNAMIC as usize);
}

#[test]
fn test_interning_is_identity() {
    let arena = TypeArena::new();

    let a = arena.constant(ConstValue::Int(42));
    let b = arena.constant(ConstValue::Int(42));
    let c = arena.constant(ConstValue::Int(43));

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(arena.intern(TypeData::primitive(PrimitiveKind::Int)), TypeId::INT);
}

#[test]
fn test_float_constants_intern_by_bit_pattern() {
    let arena = TypeArena::new();

    let zero = arena.constant(ConstValue::Double(0.0));
    let negative_zero = arena.constant(ConstValue::Double(-0.0));
    let nan = arena.constant(ConstValue::Double(f64::NAN));

    assert_ne!(zero, negative_zero);
    assert_eq!(nan, arena.constant(ConstValue::Double(f64::NAN)));
}

#[test]
fn test_constant_flags() {
    let arena = TypeArena::new();
    let byte = arena.constant(ConstValue::Byte(1));

    let flags = arena.flags(byte);
    assert!(flags.contains(TypeFlags::BYTE | TypeFlags::CONSTANT));
    assert!(flags.intersects(TypeFlags::INTEGRAL));
    assert!(!arena.flags(TypeId::BYTE).contains(TypeFlags::CONSTANT));
}

#[test]
fn test_nested_arrays_increase_rank() {
    let arena = TypeArena::new();

    let ints = arena.array(TypeId::INT);
    let matrix = arena.array(ints);

    assert_eq!(
        *arena.get(matrix),
        TypeData::Array {
            element: TypeId::INT,
            rank: 2
        }
    );
    assert_eq!(arena.array_element(matrix), Some(ints));
    assert_eq!(arena.array_element(ints), Some(TypeId::INT));
    assert_eq!(arena.array_element(TypeId::INT), None);
}

#[test]
fn test_generic_flag_propagates_from_type_parameters() {
    let arena = TypeArena::new();
    let param = arena.intern(TypeData::TypeParameter(TypeParamId(0)));
    let boxed = arena.intern(TypeData::Object {
        decl: DeclId(0),
        args: std::iter::once(param).collect(),
    });
    let array = arena.array(boxed);

    assert!(arena.flags(param).contains(TypeFlags::TYPE_PARAMETER));
    assert!(arena.flags(boxed).contains(TypeFlags::GENERIC));
    assert!(arena.flags(array).contains(TypeFlags::GENERIC));
    assert!(!arena.flags(arena.array(TypeId::INT)).contains(TypeFlags::GENERIC));
}

#[test]
fn test_error_containment_flag() {
    let arena = TypeArena::new();
    let tuple = arena.tuple(&[TypeId::INT, TypeId::ERROR], false);

    assert!(arena.flags(tuple).contains(TypeFlags::CONTAINS_ERROR));
    assert!(!arena.flags(tuple).contains(TypeFlags::ERROR));
}

#[test]
fn test_raw_union_sorts_and_dedups() {
    let arena = TypeArena::new();

    let members: TypeList = [TypeId::NULL, TypeId::INT, TypeId::NULL].into_iter().collect();
    let union = arena.union_raw(members);
    let reversed = arena.union_raw([TypeId::INT, TypeId::NULL].into_iter().collect());

    assert_eq!(union, reversed);
    assert_eq!(
        *arena.get(union),
        TypeData::Union {
            members: [TypeId::NULL, TypeId::INT].into_iter().collect()
        }
    );
    assert_eq!(arena.union_raw(TypeList::new()), TypeId::NEVER);
    assert_eq!(arena.union_raw(std::iter::once(TypeId::INT).collect()), TypeId::INT);
}

#[test]
#[should_panic(expected = "internal error")]
fn test_foreign_id_panics() {
    let arena = TypeArena::new();
    arena.get(TypeId(10_000));
}
