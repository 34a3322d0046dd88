//! Centralized limits and thresholds for the type checker.
//!
//! Every recursion bound used by the solver is defined here once. The solver
//! wraps these values in named `RecursionProfile`s so call sites say *what*
//! they guard instead of repeating numbers.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth of a single relation query.
///
/// Relation queries recurse into array element types, type arguments,
/// union constituents and the supertype chain. When this depth is exceeded
/// the query answers `false` instead of overflowing the stack.
///
/// ```text
/// class Node<T> extends Base<Node<Node<T>>> {}
/// let a: Base<Node<Int>> = new Node<Int>(); // walks Node -> Base -> Node -> ...
/// ```
pub const MAX_RELATION_DEPTH: u32 = 100;

/// Maximum depth for generic type instantiation.
///
/// Instantiating a generic class substitutes into its supertype and
/// interfaces, which may themselves be generic instantiations of the class
/// being built. The counter is keyed on the original generic declaration.
///
/// ```text
/// class Foo<T> extends Bar<Foo<Foo<T>>> {}
/// let f: Foo<String>; // Foo<Foo<String>>, Foo<Foo<Foo<String>>>, ...
/// ```
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum depth when resolving a member through supertypes and interfaces.
pub const MAX_PROPERTY_RESOLUTION_DEPTH: u32 = 50;

/// Maximum depth when validating declared variance of nested type arguments.
pub const MAX_VARIANCE_DEPTH: u32 = 50;

/// Upper bound on total enter attempts of one guard before it gives up.
pub const MAX_GUARD_ITERATIONS: u32 = 100_000;

// =============================================================================
// Builtin Shapes
// =============================================================================

/// Highest arity of the builtin `FunctionN` functional interfaces.
pub const MAX_FUNCTION_ARITY: u8 = 16;

/// Members lists up to this size are kept inline before spilling.
pub const INLINE_TYPE_LIST: usize = 4;
