use super::*;
use crate::diagnostics::{DiagnosticCollector, codes};
use crate::node::ConversionSite;
use crate::options::SolverOptions;
use crate::prelude::{Prelude, declare_prelude};
use crate::types::{ConstValue, ObjectFlags, Variance};

fn setup() -> (TypeEnv, Prelude) {
    let env = TypeEnv::new();
    let prelude = declare_prelude(&env);
    (env, prelude)
}

fn class(env: &TypeEnv, name: &str, parent: TypeId) -> TypeId {
    let decl = env.declare_class(name);
    env.set_super_type(decl, parent);
    env.object_type(decl)
}

/// Route solver logs to the test output; run with `--nocapture` to see them.
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// =============================================================================
// End-to-end checks
// =============================================================================

#[test]
fn test_literal_narrows_into_byte() {
    let (env, _) = setup();
    let three = env.constant(ConstValue::Int(3));
    let mut site = ConversionSite::literal(three);

    let mut relation = env.relation();
    let result = relation.apply_assignment(&mut site, TypeId::BYTE);

    assert_eq!(result, RelationResult::True);
    assert_eq!(site.ty(), Some(env.constant(ConstValue::Byte(3))));
    assert!(site.conversions().contains(ConversionFlags::NARROWING_PRIMITIVE));
}

#[test]
fn test_literal_overflow_reports_value_does_not_fit() {
    let (env, _) = setup();
    let big = env.constant(ConstValue::Int(300));
    let mut collector = DiagnosticCollector::new();
    let mut site = ConversionSite::literal(big).with_span(Span::new(4, 7));

    {
        let mut relation = env.relation().with_sink(&mut collector);
        let result = relation.apply_assignment(&mut site, TypeId::BYTE);
        assert_eq!(result, RelationResult::Error);
        assert!(relation.is_error());
        assert_eq!(
            relation.outcome().error,
            Some(RelationError::ValueDoesNotFit {
                value: ConstValue::Int(300),
                target: PrimitiveKind::Byte,
            })
        );
    }

    assert_eq!(site.ty(), Some(big));
    assert!(site.conversions().is_empty());
    assert_eq!(collector.len(), 1);
    let reported = &collector.diagnostics()[0];
    assert_eq!(reported.code(), codes::VALUE_DOES_NOT_FIT);
    assert_eq!(reported.span, Span::new(4, 7));
}

#[test]
fn test_cast_of_huge_double_saturates() {
    let (env, _) = setup();
    let huge = env.constant(ConstValue::Double(1e300));

    let mut relation = env.relation();
    assert_eq!(relation.is_castable_to(huge, TypeId::INT), RelationResult::True);
    let outcome = relation.outcome();
    assert_eq!(
        outcome.converted_type,
        Some(env.constant(ConstValue::Int(i32::MAX)))
    );
    assert!(outcome.conversions.contains(ConversionFlags::NARROWING_PRIMITIVE));
    assert_eq!(outcome.error, None);
}

#[test]
fn test_int_into_string_or_int_union_boxes() {
    let (env, prelude) = setup();
    let union = env.union(&[prelude.string, TypeId::INT]);

    let mut relation = env.relation();
    assert!(relation.is_assignable_to(TypeId::INT, union).is_true());
    assert_eq!(relation.outcome().conversions, ConversionFlags::BOX_TO_INT);
    assert_eq!(
        relation.outcome().converted_type,
        env.boxed_type(PrimitiveKind::Int)
    );
}

#[test]
fn test_sibling_union_runtime_type_is_common_parent() {
    let (env, prelude) = setup();
    let animal = class(&env, "Animal", prelude.object);
    let dog = class(&env, "Dog", animal);
    let cat = class(&env, "Cat", animal);

    let union = env.union(&[dog, cat]);
    assert_eq!(env.assembler_type(union), animal);
}

#[test]
fn test_repeated_instantiation_is_identical() {
    let (env, prelude) = setup();
    let t = env.declare_type_param("T", Variance::Invariant);
    let boxed = env.declare_object("Box", ObjectFlags::CLASS, vec![t]);

    let first = env.instantiate_generic(boxed, &[prelude.string]);
    let second = env.instantiate_generic(boxed, &[prelude.string]);

    assert_eq!(first, second);
    assert_eq!(env.instantiation_count(), 1);
    let mut relation = env.relation();
    assert!(relation.is_identical(first, second).is_true());
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_identity_is_reflexive_and_symmetric() {
    let (env, prelude) = setup();
    let animal = class(&env, "Animal", prelude.object);
    let samples = [
        TypeId::INT,
        env.constant(ConstValue::Int(1)),
        TypeId::NULL,
        prelude.string,
        animal,
        env.array(TypeId::INT),
        env.array(animal),
        env.tuple(&[TypeId::INT, prelude.string]),
        env.readonly_tuple(&[TypeId::INT, prelude.string]),
        env.union(&[prelude.string, TypeId::NULL]),
    ];

    let mut relation = env.relation();
    for a in samples {
        assert!(relation.is_identical(a, a).is_true(), "{a:?} not identical to itself");
        for b in samples {
            assert_eq!(
                relation.is_identical(a, b),
                relation.is_identical(b, a),
                "identity of {a:?} and {b:?} is not symmetric"
            );
        }
    }
}

#[test]
fn test_widening_is_transitive() {
    let env = TypeEnv::new();
    let mut relation = env.relation();
    for a in PrimitiveKind::ALL {
        for b in a.widening_targets() {
            for c in b.widening_targets() {
                assert!(
                    relation.is_assignable_to(a.type_id(), c.type_id()).is_true(),
                    "{a:?} -> {b:?} -> {c:?}"
                );
            }
        }
    }
}

#[test]
fn test_literal_narrowing_matches_round_trip() {
    let env = TypeEnv::new();
    let values = [-129, -128, -1, 0, 100, 127, 128, 200, 255, 32767, 32768, 65535, 65536];
    let targets = [PrimitiveKind::Byte, PrimitiveKind::Short, PrimitiveKind::Char];

    let mut relation = env.relation().with_flags(RelationFlags::BOXING | RelationFlags::NO_THROW);
    for value in values {
        let literal = ConstValue::Int(value);
        for target in targets {
            let round_trips = literal
                .convert(target)
                .and_then(|narrowed| narrowed.convert(PrimitiveKind::Int))
                == Some(literal);
            let result = relation.is_assignable_to(env.constant(literal), target.type_id());
            if round_trips {
                assert!(result.is_true(), "{value} should fit {target:?}");
                let narrowed = literal.convert(target).map(|v| env.constant(v));
                assert_eq!(relation.outcome().converted_type, narrowed);
            } else {
                assert_eq!(result, RelationResult::Error, "{value} should not fit {target:?}");
            }
        }
    }
}

#[test]
fn test_boxing_round_trip() {
    let (env, _) = setup();
    let mut relation = env.relation();
    for kind in PrimitiveKind::ALL {
        let boxed = env.box_type(kind.type_id()).expect("wrapper is bound");
        assert_eq!(env.unboxed_type(boxed), Some(kind.type_id()));

        assert!(relation.is_assignable_to(kind.type_id(), boxed).is_true());
        assert_eq!(relation.outcome().conversions, ConversionFlags::box_to(kind));

        assert!(relation.is_assignable_to(boxed, kind.type_id()).is_true());
        assert_eq!(relation.outcome().conversions, ConversionFlags::unbox_to(kind));
    }
}

#[test]
fn test_union_source_distributes() {
    let (env, prelude) = setup();
    let animal = class(&env, "Animal", prelude.object);
    let dog = class(&env, "Dog", animal);
    let cat = class(&env, "Cat", animal);
    let union = env.union(&[dog, cat]);

    let mut relation = env.relation();
    assert!(relation.is_assignable_to(union, animal).is_true());
    assert!(relation.is_assignable_to(union, prelude.object).is_true());
    assert!(!relation.is_assignable_to(union, dog).is_true());
    assert!(relation.is_assignable_to(dog, animal).is_true());
    assert!(!relation.is_assignable_to(cat, dog).is_true());
}

// =============================================================================
// Relation context
// =============================================================================

#[test]
fn test_error_type_relates_to_everything() {
    let (env, prelude) = setup();
    let mut relation = env.relation();

    assert!(relation.is_assignable_to(TypeId::ERROR, TypeId::INT).is_true());
    assert!(relation.is_assignable_to(prelude.string, TypeId::ERROR).is_true());
    assert!(relation.is_castable_to(TypeId::ERROR, TypeId::BOOLEAN).is_true());
    assert!(relation.is_identical(TypeId::ERROR, prelude.string).is_true());
    assert!(relation.is_supertype_of(TypeId::INT, TypeId::ERROR).is_true());
}

#[test]
fn test_failure_reports_generic_error_once() {
    let (env, prelude) = setup();
    let mut collector = DiagnosticCollector::new();
    {
        let mut relation = env.relation().with_sink(&mut collector);
        assert!(relation.is_assignable_to(prelude.string, TypeId::INT).is_false());
        assert!(relation.outcome().conversions.is_empty());
    }
    assert_eq!(collector.len(), 1);
    assert_eq!(collector.diagnostics()[0].code(), codes::NOT_ASSIGNABLE);
}

#[test]
fn test_no_throw_suppresses_reports() {
    let (env, prelude) = setup();
    let mut collector = DiagnosticCollector::new();
    {
        let mut relation = env
            .relation()
            .with_flags(RelationFlags::BOXING | RelationFlags::NO_THROW)
            .with_sink(&mut collector);
        assert!(relation.is_castable_to(prelude.string, TypeId::INT).is_false());
        assert_eq!(
            relation.outcome().error,
            Some(RelationError::NotCastable {
                source: prelude.string,
                target: TypeId::INT,
            })
        );
    }
    assert!(collector.is_empty());
}

#[test]
fn test_boxing_requires_flag() {
    let (env, prelude) = setup();
    let mut relation = env.relation().with_flags(RelationFlags::empty());

    assert!(!relation.is_assignable_to(TypeId::INT, prelude.object).is_true());
    relation.set_flags(RelationFlags::APPLY_BOXING);
    assert!(relation.is_assignable_to(TypeId::INT, prelude.object).is_true());
    assert_eq!(relation.outcome().conversions, ConversionFlags::BOX_TO_INT);
}

#[test]
fn test_only_check_widening() {
    let (env, prelude) = setup();
    let mut relation = env
        .relation()
        .with_flags(RelationFlags::BOXING | RelationFlags::ONLY_CHECK_WIDENING);

    assert!(relation.is_assignable_to(TypeId::SHORT, TypeId::DOUBLE).is_true());
    assert!(!relation.is_assignable_to(TypeId::INT, prelude.object).is_true());
    let three = env.constant(ConstValue::Int(3));
    assert!(!relation.is_assignable_to(three, TypeId::BYTE).is_true());
}

#[test]
fn test_supertype_results_are_memoized() {
    let (env, prelude) = setup();
    let animal = class(&env, "Animal", prelude.object);
    let dog = class(&env, "Dog", animal);

    let mut relation = env.relation();
    assert!(relation.is_supertype_of(animal, dog).is_true());
    assert_eq!(env.caches.supertype_memo.get(&(animal, dog, 0)).map(|v| *v), Some(true));

    // Declaration changes drop derived answers.
    env.set_super_type(env.decl_of(dog).expect("class"), prelude.object);
    assert!(env.caches.supertype_memo.is_empty());
    assert!(!relation.is_supertype_of(animal, dog).is_true());
}

#[test]
fn test_memoization_can_be_disabled() {
    let env = TypeEnv::with_options(SolverOptions::default().with_memoize_relations(false));
    let prelude = declare_prelude(&env);
    let animal = class(&env, "Animal", prelude.object);
    let dog = class(&env, "Dog", animal);

    assert!(env.relation().is_supertype_of(animal, dog).is_true());
    assert!(env.caches.supertype_memo.is_empty());
}

#[test]
fn test_recursive_generic_hierarchy_terminates() {
    // class Node<T> extends Base<Node<Node<T>>>
    init_test_logging();
    let (env, prelude) = setup();
    let u = env.declare_type_param("U", Variance::Covariant);
    let base = env.declare_object("Base", ObjectFlags::CLASS, vec![u]);
    env.set_super_type(base, prelude.object);
    let t = env.declare_type_param("T", Variance::Covariant);
    let node = env.declare_object("Node", ObjectFlags::CLASS, vec![t]);
    let node_t = env.object_type(node);
    let node_node_t = env.instantiate_generic(node, &[node_t]);
    env.set_super_type(node, env.instantiate_generic(base, &[node_node_t]));

    let node_string = env.instantiate_generic(node, &[prelude.string]);
    let base_node = env.instantiate_generic(base, &[node_string]);

    let mut relation = env.relation().with_flags(RelationFlags::BOXING | RelationFlags::NO_THROW);
    assert!(!relation.is_assignable_to(node_string, base_node).is_true());
    let deeper = env.instantiate_generic(node, &[node_string]);
    assert!(relation.is_supertype_of(base_node, deeper).is_false());
}

#[test]
fn test_failed_composite_conversion_leaves_node_untouched() {
    let (env, _) = setup();
    let byte_wrapper = env.boxed_type(PrimitiveKind::Byte).expect("wrapper is bound");
    let big = env.constant(ConstValue::Int(1000));
    let mut site = ConversionSite::literal(big);
    let mut relation = env.relation();

    assert_eq!(relation.apply_assignment(&mut site, byte_wrapper), RelationResult::Error);
    assert_eq!(site.ty(), Some(big));
    assert!(site.conversions().is_empty());

    let small = env.constant(ConstValue::Int(7));
    let mut site = ConversionSite::literal(small);
    assert!(relation.apply_assignment(&mut site, byte_wrapper).is_true());
    assert_eq!(
        site.conversions(),
        ConversionFlags::NARROWING_PRIMITIVE | ConversionFlags::BOX_TO_BYTE
    );
}

#[test]
#[should_panic(expected = "internal error")]
fn test_untyped_node_is_an_internal_error() {
    let env = TypeEnv::new();
    let mut site = ConversionSite::untyped(crate::node::NodeKind::Literal);
    env.relation().apply_assignment(&mut site, TypeId::INT);
}
