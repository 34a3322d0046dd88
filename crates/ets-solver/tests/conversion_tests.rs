use super::*;
use crate::diagnostics::RelationError;
use crate::env::TypeEnv;
use crate::prelude::{Prelude, declare_prelude};
use crate::relation::{ConversionFlags, RelationFlags};
use crate::types::{ConstValue, ObjectFlags, PrimitiveKind};

fn setup() -> (TypeEnv, Prelude) {
    let env = TypeEnv::new();
    let prelude = declare_prelude(&env);
    (env, prelude)
}

fn wrapper(env: &TypeEnv, kind: PrimitiveKind) -> TypeId {
    env.boxed_type(kind).expect("wrapper is bound")
}

// =============================================================================
// Boxing helpers
// =============================================================================

#[test]
fn test_wrappers_are_unbound_without_prelude() {
    let env = TypeEnv::new();
    assert_eq!(env.boxed_type(PrimitiveKind::Int), None);
    assert_eq!(env.box_type(TypeId::INT), None);
}

#[test]
fn test_box_and_unbox_types() {
    let (env, prelude) = setup();
    let int = wrapper(&env, PrimitiveKind::Int);
    let seven = env.constant(ConstValue::Int(7));

    assert_eq!(env.box_type(TypeId::INT), Some(int));
    assert_eq!(env.box_type(seven), Some(int));
    assert_eq!(env.box_type(prelude.string), None);
    assert_eq!(env.unboxed_type(int), Some(TypeId::INT));
    assert_eq!(env.unboxed_type(prelude.object), None);

    assert!(env.is_unboxable(int));
    assert!(env.is_unboxable(wrapper(&env, PrimitiveKind::Boolean)));
    assert!(!env.is_unboxable(prelude.object));
    assert!(!env.is_unboxable(TypeId::INT));
}

#[test]
fn test_enum_boxes_to_its_reference_type() {
    let (env, _) = setup();
    let color = env.declare_enum("Color", &[("Red", 0), ("Green", 1)]);
    let color_ty = env.enum_type(color);

    let boxed = env.box_type(color_ty).expect("enum has a boxed form");
    assert!(env.object_flags(boxed).contains(ObjectFlags::BOXED_ENUM));
    assert!(env.is_unboxable(boxed));
    assert_eq!(env.unboxed_type(boxed), Some(color_ty));
}

#[test]
fn test_boxing_records_markers() {
    let (env, _) = setup();
    let mut relation = env.relation();

    assert_eq!(relation.boxing(TypeId::CHAR), Some(wrapper(&env, PrimitiveKind::Char)));
    assert_eq!(relation.state.conversions, ConversionFlags::BOX_TO_CHAR);
    assert_eq!(relation.unboxing(wrapper(&env, PrimitiveKind::Long)), Some(TypeId::LONG));
    assert!(relation.state.conversions.contains(ConversionFlags::UNBOX_TO_LONG));
    assert_eq!(relation.state.converted, Some(TypeId::LONG));

    let mut strict = env.relation().with_flags(RelationFlags::empty());
    assert_eq!(strict.boxing(TypeId::CHAR), None);
    assert_eq!(strict.unboxing(wrapper(&env, PrimitiveKind::Long)), None);
    assert!(strict.state.conversions.is_empty());
}

// =============================================================================
// Primitive conversions
// =============================================================================

#[test]
fn test_widening_constant_converts_value() {
    let (env, _) = setup();
    let mut relation = env.relation();
    let letter = env.constant(ConstValue::Char(65));

    assert!(relation.widening_primitive(letter, PrimitiveKind::Double));
    assert_eq!(relation.state.converted, Some(env.constant(ConstValue::Double(65.0))));
    assert!(!relation.widening_primitive(TypeId::CHAR, PrimitiveKind::Short));
    assert!(!relation.widening_primitive(TypeId::BOOLEAN, PrimitiveKind::Int));
}

#[test]
fn test_assignment_narrowing() {
    let (env, _) = setup();
    let mut relation = env.relation();
    let small = env.constant(ConstValue::Int(100));
    let large = env.constant(ConstValue::Int(70_000));

    let narrowed = relation.narrowing_primitive(small, PrimitiveKind::Short, NarrowingContext::Assignment);
    assert_eq!(narrowed, RelationResult::True);
    assert_eq!(relation.state.converted, Some(env.constant(ConstValue::Short(100))));

    let variable = relation.narrowing_primitive(TypeId::INT, PrimitiveKind::Short, NarrowingContext::Assignment);
    assert_eq!(variable, RelationResult::False);

    let overflow = relation.narrowing_primitive(large, PrimitiveKind::Short, NarrowingContext::Assignment);
    assert_eq!(overflow, RelationResult::Error);
    assert_eq!(
        relation.state.error,
        Some(RelationError::ValueDoesNotFit {
            value: ConstValue::Int(70_000),
            target: PrimitiveKind::Short,
        })
    );
}

#[test]
fn test_cast_narrowing() {
    let (env, _) = setup();
    let mut relation = env.relation();

    let wrapped = relation.narrowing_primitive(
        env.constant(ConstValue::Int(70_000)),
        PrimitiveKind::Short,
        NarrowingContext::Cast,
    );
    assert_eq!(wrapped, RelationResult::True);
    assert_eq!(relation.state.converted, Some(env.constant(ConstValue::Short(4464))));

    let negative = relation.narrowing_primitive(
        env.constant(ConstValue::Double(-1e20)),
        PrimitiveKind::Int,
        NarrowingContext::Cast,
    );
    assert_eq!(negative, RelationResult::True);
    assert_eq!(relation.state.converted, Some(env.constant(ConstValue::Int(i32::MIN))));

    let flag = relation.narrowing_primitive(TypeId::BOOLEAN, PrimitiveKind::Byte, NarrowingContext::Cast);
    assert_eq!(flag, RelationResult::False);
}

#[test]
fn test_primitive_cast_prefers_widening() {
    let (env, _) = setup();
    let mut relation = env.relation();

    assert_eq!(relation.primitive_cast(TypeId::INT, PrimitiveKind::Int), RelationResult::True);
    assert!(relation.state.conversions.is_empty());

    assert_eq!(relation.primitive_cast(TypeId::INT, PrimitiveKind::Long), RelationResult::True);
    assert_eq!(relation.state.conversions, ConversionFlags::WIDENING_PRIMITIVE);

    assert_eq!(relation.primitive_cast(TypeId::DOUBLE, PrimitiveKind::Char), RelationResult::True);
    assert!(relation.state.conversions.contains(ConversionFlags::NARROWING_PRIMITIVE));

    assert_eq!(relation.primitive_cast(TypeId::NULL, PrimitiveKind::Int), RelationResult::False);
}

// =============================================================================
// Reference narrowing
// =============================================================================

#[test]
fn test_reference_narrowing_is_unchecked() {
    let (env, prelude) = setup();
    let animal = env.declare_class("Animal");
    env.set_super_type(animal, prelude.object);
    let dog = env.declare_class("Dog");
    env.set_super_type(dog, env.object_type(animal));
    let mut relation = env.relation();

    let downcast = relation.narrowing_reference(env.object_type(animal), env.object_type(dog));
    assert_eq!(downcast, RelationResult::True);
    assert!(relation.state.conversions.contains(ConversionFlags::UNCHECKED_CAST));

    let from_root = relation.narrowing_reference(prelude.object, env.array(TypeId::INT));
    assert_eq!(from_root, RelationResult::True);
}

#[test]
fn test_final_class_to_unimplemented_interface() {
    let (env, prelude) = setup();
    let sealed = env.declare_class("Sealed");
    env.set_super_type(sealed, prelude.object);
    env.add_object_flags(sealed, ObjectFlags::FINAL);
    let open = env.declare_class("Open");
    env.set_super_type(open, prelude.object);
    let shape = env.object_type(env.declare_interface("Shape"));
    let named = env.object_type(env.declare_interface("Named"));
    let mut relation = env.relation();

    assert_eq!(relation.narrowing_reference(env.object_type(sealed), shape), RelationResult::False);
    assert_eq!(relation.narrowing_reference(env.object_type(open), shape), RelationResult::True);
    assert_eq!(relation.narrowing_reference(named, shape), RelationResult::True);
    assert_eq!(relation.narrowing_reference(shape, env.object_type(sealed)), RelationResult::False);
}

// =============================================================================
// String conversion
// =============================================================================

#[test]
fn test_string_conversion_of_small_integers_goes_through_int() {
    let (env, _) = setup();
    let mut relation = env.relation();

    assert_eq!(relation.string_conversion(TypeId::BYTE), RelationResult::True);
    let outcome = relation.outcome();
    assert_eq!(
        outcome.conversions,
        ConversionFlags::WIDENING_PRIMITIVE | ConversionFlags::BOX_TO_INT | ConversionFlags::STRING_CONVERSION
    );
    assert_eq!(outcome.converted_type, Some(wrapper(&env, PrimitiveKind::Int)));
}

#[test]
fn test_string_conversion_boxes_other_value_types() {
    let (env, _) = setup();
    let color = env.declare_enum("Color", &[("Red", 0)]);
    let mut relation = env.relation().with_flags(RelationFlags::empty());

    assert!(relation.string_conversion(TypeId::DOUBLE).is_true());
    assert_eq!(
        relation.outcome().conversions,
        ConversionFlags::BOX_TO_DOUBLE | ConversionFlags::STRING_CONVERSION
    );
    assert_eq!(relation.flags(), RelationFlags::empty());

    assert!(relation.string_conversion(env.enum_type(color)).is_true());
    assert!(relation.outcome().conversions.contains(ConversionFlags::BOX_TO_ENUM));
}

#[test]
fn test_string_conversion_of_references_and_void() {
    let (env, prelude) = setup();
    let mut relation = env.relation();

    assert!(relation.string_conversion(prelude.string).is_true());
    assert_eq!(relation.outcome().conversions, ConversionFlags::STRING_CONVERSION);
    assert_eq!(relation.outcome().converted_type, None);

    assert!(relation.string_conversion(TypeId::VOID).is_false());
    assert!(relation.outcome().conversions.is_empty());

    assert!(relation.string_conversion(TypeId::ERROR).is_true());
}
